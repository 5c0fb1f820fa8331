// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The text layer.
//!
//! Text state lives behind an `Rc<RefCell<_>>` shared with the surface
//! painter installed on the wrapped layer, so [`LayerStore::draw`] and
//! [`TextLayer::draw`] render the same thing.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use kurbo::{Point, Rect, Size};
use tableau_core::layer::{LayerId, LayerStore};
use tableau_core::surface::{Canvas, SurfacePainter};

use crate::align::{
    HorizontalAlignment, TextShape, VerticalAlignment, horizontal_origin, vertical_origin,
};
use crate::typesetter::{AttributedString, Line, TextStyle, TypesetResult, Typesetter};

/// Result of [`TextLayer::full_size_that_fits`].
#[derive(Clone, Debug, PartialEq)]
pub struct FitResult {
    /// The size the text needs, capped at the candidate size.
    pub size: Size,
    /// Whether all of the text was placed.
    pub fits: bool,
    /// Whether some line broke inside a word.
    pub wrapped_on_character: bool,
    /// The lines laid out for the candidate size.
    pub lines: Vec<Line>,
}

/// Lines laid out for a specific text rect size.
#[derive(Debug)]
struct Layout {
    size: Size,
    result: TypesetResult,
}

struct TextState {
    layer: LayerId,
    typesetter: Box<dyn Typesetter>,
    text: AttributedString,
    shape: TextShape,
    vertical_alignment: VerticalAlignment,
    horizontal_alignment: HorizontalAlignment,
    corner_radius: f64,
    layout: Option<Layout>,
}

impl fmt::Debug for TextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextState")
            .field("layer", &self.layer)
            .field("text", &self.text.text())
            .field("shape", &self.shape)
            .field("vertical_alignment", &self.vertical_alignment)
            .field("horizontal_alignment", &self.horizontal_alignment)
            .field("corner_radius", &self.corner_radius)
            .field("laid_out_for", &self.layout.as_ref().map(|l| l.size))
            .finish_non_exhaustive()
    }
}

impl TextState {
    fn vertical_alignment(&self) -> VerticalAlignment {
        match self.shape {
            TextShape::Ellipse => VerticalAlignment::Center,
            TextShape::Rectangle => self.vertical_alignment,
        }
    }

    /// Picks the constraint mode for the current shape.
    ///
    /// Rounded corners only apply to the layer's own layout, not to
    /// speculative fitting.
    fn typeset(&self, max: Size, round_corners: bool) -> TypesetResult {
        match self.shape {
            TextShape::Ellipse => self.typesetter.lines_in_ellipse(&self.text, max),
            TextShape::Rectangle if round_corners && self.corner_radius > 0.0 => {
                let radius = max.width.min(max.height) / 2.0 * self.corner_radius;
                self.typesetter
                    .lines_in_round_rect(&self.text, max, radius)
            }
            TextShape::Rectangle => self.typesetter.lines_in_rect(&self.text, max),
        }
    }

    fn layout_for(&self, size: Size) -> Layout {
        let result = self.typeset(size, true);
        tracing::debug!(
            layer = %self.layer,
            lines = result.lines.len(),
            exhausted = result.exhausted,
            width = size.width,
            height = size.height,
            "text layout recalculated"
        );
        Layout { size, result }
    }

    fn recalculate(&mut self, size: Size) {
        self.layout = Some(self.layout_for(size));
    }

    /// Lays out again unless the cached lines were computed for `size`.
    fn ensure_layout(&mut self, size: Size) -> &TypesetResult {
        if self.layout.as_ref().is_some_and(|l| l.size != size) {
            self.layout = None;
        }
        let layout = match self.layout.take() {
            Some(layout) => layout,
            None => self.layout_for(size),
        };
        &self.layout.insert(layout).result
    }

    fn line_at(&self, rect: Rect, point: Point) -> Option<&Line> {
        let layout = &self.layout.as_ref()?.result;
        let mut y = vertical_origin(self.vertical_alignment(), rect, layout.total_height());
        for line in &layout.lines {
            let height = line.height();
            if point.y >= y && point.y < y + height {
                return Some(line);
            }
            y += height;
        }
        None
    }

    fn paint(&self, canvas: &mut Canvas<'_>, rect: Rect) {
        let Some(layout) = &self.layout else {
            return;
        };
        if layout.result.lines.is_empty() {
            return;
        }
        let saved_clip = canvas.clip();
        canvas.set_clip(Some(rect));
        let mut y = vertical_origin(
            self.vertical_alignment(),
            rect,
            layout.result.total_height(),
        );
        for line in &layout.result.lines {
            if y > rect.y1 {
                break;
            }
            let x = horizontal_origin(self.horizontal_alignment, self.shape, rect, line);
            y = self
                .typesetter
                .draw_line(line, canvas, Point::new(x, y))
                .y;
        }
        canvas.set_clip(saved_clip);
    }
}

/// Draw routine installed on the wrapped layer.
///
/// The canvas only knows the ceiled pixel size. A cached layout whose size
/// ceils to the canvas is kept; otherwise the text is laid out for the
/// canvas.
struct TextPainter(Rc<RefCell<TextState>>);

impl SurfacePainter for TextPainter {
    fn paint(&mut self, canvas: &mut Canvas<'_>) {
        let mut state = self.0.borrow_mut();
        let pixels = canvas.size();
        let size = match &state.layout {
            Some(l)
                if l.size.width.max(0.0).ceil() == pixels.width
                    && l.size.height.max(0.0).ceil() == pixels.height =>
            {
                l.size
            }
            _ => pixels,
        };
        state.ensure_layout(size);
        state.paint(canvas, Rect::from_origin_size(Point::ZERO, size));
    }
}

/// A drawn-surface layer that renders an [`AttributedString`] inside a
/// rectangle, rounded rectangle, or ellipse.
///
/// Layout is cached until the text, shape, corner radius, or layer size
/// changes, including size changes made directly on the store. Alignment
/// changes only affect drawing.
#[derive(Debug)]
pub struct TextLayer {
    layer: LayerId,
    state: Rc<RefCell<TextState>>,
}

impl TextLayer {
    /// Creates a drawn layer with `frame` in `store` and wraps it.
    ///
    /// The layer's draw routine renders the text, so [`LayerStore::draw`]
    /// works on it directly.
    pub fn new(store: &mut LayerStore, frame: Rect, typesetter: Box<dyn Typesetter>) -> Self {
        let layer = store.create_drawn_layer(frame.size(), None);
        store.set_frame(layer, frame);
        let state = Rc::new(RefCell::new(TextState {
            layer,
            typesetter,
            text: AttributedString::new(),
            shape: TextShape::default(),
            vertical_alignment: VerticalAlignment::default(),
            horizontal_alignment: HorizontalAlignment::default(),
            corner_radius: 0.0,
            layout: None,
        }));
        store.set_surface_painter(layer, Some(Box::new(TextPainter(Rc::clone(&state)))));
        Self { layer, state }
    }

    /// The wrapped layer.
    #[must_use]
    pub fn layer(&self) -> LayerId {
        self.layer
    }

    /// The text being rendered.
    #[must_use]
    pub fn attributed_string(&self) -> AttributedString {
        self.state.borrow().text.clone()
    }

    /// Replaces the text. Takes effect on the next [`draw`](Self::draw).
    pub fn set_attributed_string(&mut self, text: AttributedString) {
        let mut state = self.state.borrow_mut();
        state.text = text;
        state.layout = None;
    }

    /// The layout outline.
    #[must_use]
    pub fn shape(&self) -> TextShape {
        self.state.borrow().shape
    }

    /// Changes the layout outline.
    pub fn set_shape(&mut self, shape: TextShape) {
        let mut state = self.state.borrow_mut();
        if state.shape == shape {
            return;
        }
        state.shape = shape;
        state.layout = None;
    }

    /// The effective vertical alignment. Ellipses always center.
    #[must_use]
    pub fn vertical_alignment(&self) -> VerticalAlignment {
        self.state.borrow().vertical_alignment()
    }

    /// Sets the vertical alignment used for rectangles.
    pub fn set_vertical_alignment(&mut self, alignment: VerticalAlignment) {
        self.state.borrow_mut().vertical_alignment = alignment;
    }

    /// The horizontal alignment.
    #[must_use]
    pub fn horizontal_alignment(&self) -> HorizontalAlignment {
        self.state.borrow().horizontal_alignment
    }

    /// Sets the horizontal alignment.
    pub fn set_horizontal_alignment(&mut self, alignment: HorizontalAlignment) {
        self.state.borrow_mut().horizontal_alignment = alignment;
    }

    /// The corner radius, as a fraction of half the smaller side.
    #[must_use]
    pub fn corner_radius(&self) -> f64 {
        self.state.borrow().corner_radius
    }

    /// Rounds the corners of the layout rectangle and redraws.
    ///
    /// Unlike [`LayerStore::set_corner_radius`] this installs no filter; the
    /// text is laid out inside the rounded shape instead.
    pub fn set_corner_radius(&mut self, store: &mut LayerStore, corner_radius: f64) {
        {
            let mut state = self.state.borrow_mut();
            if state.corner_radius == corner_radius {
                return;
            }
            state.corner_radius = corner_radius;
            state.layout = None;
        }
        self.draw(store);
    }

    /// Sets the frame, resizing the backing surface.
    pub fn set_frame(&mut self, store: &mut LayerStore, frame: Rect) {
        store.set_frame(self.layer, frame);
    }

    /// Sets the size, resizing the backing surface.
    pub fn set_size(&mut self, store: &mut LayerStore, size: Size) {
        store.set_size(self.layer, size);
    }

    /// The rect text is laid out in, in layer-local coordinates.
    #[must_use]
    pub fn text_rect(&self, store: &LayerStore) -> Rect {
        Rect::from_origin_size(Point::ZERO, store.size(self.layer))
    }

    /// Lays the text out again for the current size.
    pub fn recalculate(&mut self, store: &LayerStore) {
        let size = self.text_rect(store).size();
        self.state.borrow_mut().recalculate(size);
    }

    /// The current lines, laying out first if needed.
    #[must_use]
    pub fn lines(&self, store: &LayerStore) -> Vec<Line> {
        let size = self.text_rect(store).size();
        self.state.borrow_mut().ensure_layout(size).lines.clone()
    }

    /// Redraws the backing surface.
    pub fn draw(&mut self, store: &mut LayerStore) {
        let size = self.text_rect(store).size();
        self.state.borrow_mut().ensure_layout(size);
        store.draw(self.layer);
    }

    /// The size needed to render the text within `max`.
    #[must_use]
    pub fn size_that_fits(&self, max: Size) -> Size {
        self.full_size_that_fits(max).size
    }

    /// Lays the text out within `max` and reports the needed size and
    /// whether it all fit.
    #[must_use]
    pub fn full_size_that_fits(&self, max: Size) -> FitResult {
        let result = self.state.borrow().typeset(max, false);
        let size = Size::new(
            max.width.min(result.max_line_width()),
            max.height.min(result.total_height()),
        );
        FitResult {
            size,
            fits: !result.exhausted,
            wrapped_on_character: result.wrapped_on_character,
            lines: result.lines,
        }
    }

    /// The line drawn under `point` (layer-local coordinates).
    #[must_use]
    pub fn line_at_point(&self, store: &LayerStore, point: Point) -> Option<Line> {
        self.lookup(store, point, |_, line, _| Some(line.clone()))
    }

    /// The attributes of the run drawn under `point`.
    #[must_use]
    pub fn attributes_at_point(&self, store: &LayerStore, point: Point) -> Option<TextStyle> {
        self.lookup(store, point, |state, line, rect| {
            let mut x = horizontal_origin(state.horizontal_alignment, state.shape, rect, line);
            for run in &line.runs {
                let width = run.width();
                if point.x >= x && point.x < x + width {
                    return Some(run.style.clone());
                }
                x += width;
            }
            None
        })
    }

    /// Finds the line under `point` with a fresh layout and hands it to `f`.
    fn lookup<R>(
        &self,
        store: &LayerStore,
        point: Point,
        f: impl FnOnce(&TextState, &Line, Rect) -> Option<R>,
    ) -> Option<R> {
        let rect = self.text_rect(store);
        if point.x < rect.x0 || point.x > rect.x1 || point.y < rect.y0 || point.y > rect.y1 {
            return None;
        }
        let mut state = self.state.borrow_mut();
        state.ensure_layout(rect.size());
        let line = state.line_at(rect, point)?;
        f(&state, line, rect)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::typesetter::{Glyph, Run};

    const ADVANCE: f64 = 10.0;
    const LINE_HEIGHT: f64 = 20.0;

    /// Fixed-advance typesetter that wraps on any character and records the
    /// constraint modes it was asked for.
    #[derive(Clone, Default)]
    struct Monospace {
        requests: Rc<RefCell<Vec<String>>>,
    }

    impl Monospace {
        fn layout(&self, text: &AttributedString, max: Size, band: f64) -> TypesetResult {
            let mut result = TypesetResult::default();
            let mut current: Vec<(TextStyle, Glyph)> = Vec::new();
            let mut width = 0.0;
            let finish = |glyphs: &mut Vec<(TextStyle, Glyph)>| {
                let mut runs: Vec<Run> = Vec::new();
                for (style, glyph) in glyphs.drain(..) {
                    match runs.last_mut() {
                        Some(run) if run.style == style => run.glyphs.push(glyph),
                        _ => runs.push(Run {
                            style,
                            glyphs: vec![glyph],
                            height: LINE_HEIGHT,
                        }),
                    }
                }
                Line {
                    runs,
                    max_width: band,
                }
            };
            for run in text.runs() {
                for ch in run.text.chars() {
                    let glyph = Glyph {
                        text: ch.to_string(),
                        width: ADVANCE,
                        is_whitespace: ch.is_whitespace(),
                    };
                    if width + ADVANCE > band && !current.is_empty() && !glyph.is_whitespace {
                        if current.last().is_some_and(|(_, g)| !g.is_whitespace) {
                            result.wrapped_on_character = true;
                        }
                        result.lines.push(finish(&mut current));
                        width = 0.0;
                    }
                    if current.is_empty()
                        && (result.lines.len() + 1) as f64 * LINE_HEIGHT > max.height
                    {
                        result.exhausted = true;
                        return result;
                    }
                    width += ADVANCE;
                    current.push((run.style.clone(), glyph));
                }
            }
            if !current.is_empty() {
                result.lines.push(finish(&mut current));
            }
            result
        }

        fn requests(&self) -> Vec<String> {
            self.requests.borrow().clone()
        }
    }

    impl Typesetter for Monospace {
        fn lines_in_rect(&self, text: &AttributedString, max: Size) -> TypesetResult {
            self.requests.borrow_mut().push("rect".to_owned());
            self.layout(text, max, max.width)
        }

        fn lines_in_ellipse(&self, text: &AttributedString, max: Size) -> TypesetResult {
            self.requests.borrow_mut().push("ellipse".to_owned());
            self.layout(text, max, max.width / 2.0)
        }

        fn lines_in_round_rect(
            &self,
            text: &AttributedString,
            max: Size,
            radius: f64,
        ) -> TypesetResult {
            self.requests.borrow_mut().push(format!("round_rect {radius}"));
            self.layout(text, max, max.width - radius)
        }

        fn draw_line(&self, line: &Line, canvas: &mut Canvas<'_>, origin: Point) -> Point {
            let mut x = origin.x;
            for run in &line.runs {
                for glyph in &run.glyphs {
                    if !glyph.is_whitespace {
                        let cell = Rect::new(x, origin.y, x + glyph.width, origin.y + run.height);
                        canvas.fill_rect(cell, run.style.color);
                    }
                    x += glyph.width;
                }
            }
            Point::new(origin.x, origin.y + line.height())
        }
    }

    fn colored(color: [u8; 4]) -> TextStyle {
        TextStyle {
            color,
            ..TextStyle::default()
        }
    }

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];

    fn two_colors() -> AttributedString {
        let mut text = AttributedString::styled("ab", colored(RED));
        text.push("cd", colored(BLUE));
        text
    }

    fn text_layer(store: &mut LayerStore, typesetter: &Monospace) -> TextLayer {
        TextLayer::new(
            store,
            Rect::new(0.0, 0.0, 100.0, 40.0),
            Box::new(typesetter.clone()),
        )
    }

    #[test]
    fn defaults() {
        let mut store = LayerStore::new();
        let layer = text_layer(&mut store, &Monospace::default());
        assert_eq!(layer.shape(), TextShape::Rectangle);
        assert_eq!(layer.vertical_alignment(), VerticalAlignment::Top);
        assert_eq!(layer.horizontal_alignment(), HorizontalAlignment::Center);
        assert!(store.surface(layer.layer()).is_some());
    }

    #[test]
    fn ellipse_forces_centered_vertical_alignment() {
        let mut store = LayerStore::new();
        let mut layer = text_layer(&mut store, &Monospace::default());
        layer.set_vertical_alignment(VerticalAlignment::Bottom);
        layer.set_shape(TextShape::Ellipse);
        assert_eq!(layer.vertical_alignment(), VerticalAlignment::Center);
        layer.set_shape(TextShape::Rectangle);
        assert_eq!(layer.vertical_alignment(), VerticalAlignment::Bottom);
    }

    #[test]
    fn layout_is_cached_until_inputs_change() {
        let mut store = LayerStore::new();
        let typesetter = Monospace::default();
        let mut layer = text_layer(&mut store, &typesetter);
        layer.set_attributed_string(two_colors());

        assert_eq!(layer.lines(&store).len(), 1);
        let _ = layer.lines(&store);
        layer.set_horizontal_alignment(HorizontalAlignment::Right);
        layer.set_vertical_alignment(VerticalAlignment::Center);
        assert_eq!(typesetter.requests().len(), 1);

        layer.set_shape(TextShape::Ellipse);
        let _ = layer.lines(&store);
        layer.set_size(&mut store, Size::new(60.0, 40.0));
        let _ = layer.lines(&store);
        assert_eq!(typesetter.requests(), ["rect", "ellipse", "ellipse"]);
    }

    #[test]
    fn corner_radius_lays_out_in_a_round_rect() {
        let mut store = LayerStore::new();
        let typesetter = Monospace::default();
        let mut layer = text_layer(&mut store, &typesetter);
        layer.set_attributed_string(two_colors());
        layer.set_corner_radius(&mut store, 0.5);
        // min(100, 40) / 2 * 0.5
        assert_eq!(typesetter.requests(), ["round_rect 10"]);
        assert!(store.filters(layer.layer()).is_empty());

        // Fitting ignores the rounded corners.
        let _ = layer.size_that_fits(Size::new(100.0, 40.0));
        assert_eq!(typesetter.requests().last().map(String::as_str), Some("rect"));
    }

    #[test]
    fn draw_paints_aligned_lines() {
        let mut store = LayerStore::new();
        let mut layer = text_layer(&mut store, &Monospace::default());
        layer.set_attributed_string(two_colors());
        let _ = store.evaluate();

        layer.draw(&mut store);
        let id = layer.layer();
        // Four glyphs of 10 centered in 100: x from 30 to 70.
        assert_eq!(store.surface_pixel(id, 25, 5), Some([0, 0, 0, 0]));
        assert_eq!(store.surface_pixel(id, 35, 5), Some(RED));
        assert_eq!(store.surface_pixel(id, 65, 5), Some(BLUE));
        assert_eq!(store.surface_pixel(id, 35, 25), Some([0, 0, 0, 0]));
        assert!(store.contents_need_update(id));
        assert!(store.evaluate().contents.contains(&id.index()));
    }

    #[test]
    fn draw_bottom_aligned() {
        let mut store = LayerStore::new();
        let mut layer = text_layer(&mut store, &Monospace::default());
        layer.set_attributed_string(two_colors());
        layer.set_vertical_alignment(VerticalAlignment::Bottom);
        layer.draw(&mut store);
        let id = layer.layer();
        assert_eq!(store.surface_pixel(id, 35, 5), Some([0, 0, 0, 0]));
        assert_eq!(store.surface_pixel(id, 35, 25), Some(RED));
    }

    #[test]
    fn fitting_reports_size_and_overflow() {
        let mut store = LayerStore::new();
        let mut layer = text_layer(&mut store, &Monospace::default());
        layer.set_attributed_string(AttributedString::from("hello world"));

        let fit = layer.full_size_that_fits(Size::new(60.0, 100.0));
        assert_eq!(fit.size, Size::new(60.0, 40.0));
        assert_eq!(fit.lines.len(), 2);
        assert!(fit.fits);
        assert!(!fit.wrapped_on_character);

        let narrow = layer.full_size_that_fits(Size::new(40.0, 100.0));
        assert!(narrow.wrapped_on_character);

        let short = layer.full_size_that_fits(Size::new(60.0, 20.0));
        assert!(!short.fits);
        assert_eq!(short.size, Size::new(60.0, 20.0));
    }

    #[test]
    fn point_lookup_matches_drawing() {
        let mut store = LayerStore::new();
        let mut layer = text_layer(&mut store, &Monospace::default());
        layer.set_attributed_string(two_colors());

        assert_eq!(layer.attributes_at_point(&store, Point::new(35.0, 5.0)), Some(colored(RED)));
        assert_eq!(layer.attributes_at_point(&store, Point::new(55.0, 5.0)), Some(colored(BLUE)));
        assert_eq!(layer.attributes_at_point(&store, Point::new(5.0, 5.0)), None);
        assert!(layer.line_at_point(&store, Point::new(35.0, 30.0)).is_none());
        assert!(layer.line_at_point(&store, Point::new(-1.0, 5.0)).is_none());

        layer.set_horizontal_alignment(HorizontalAlignment::Left);
        assert_eq!(layer.attributes_at_point(&store, Point::new(25.0, 5.0)), Some(colored(BLUE)));

        layer.set_vertical_alignment(VerticalAlignment::Bottom);
        assert!(layer.line_at_point(&store, Point::new(5.0, 5.0)).is_none());
        assert!(layer.line_at_point(&store, Point::new(5.0, 25.0)).is_some());
    }

    #[test]
    fn store_draw_renders_text() {
        let mut store = LayerStore::new();
        let typesetter = Monospace::default();
        let mut layer = text_layer(&mut store, &typesetter);
        layer.set_attributed_string(two_colors());
        let id = layer.layer();

        store.draw(id);
        assert_eq!(store.surface_pixel(id, 35, 5), Some(RED));
        assert_eq!(store.surface_pixel(id, 65, 5), Some(BLUE));

        // Both draw paths share one layout.
        layer.draw(&mut store);
        store.draw(id);
        assert_eq!(typesetter.requests(), ["rect"]);
        assert_eq!(store.surface_pixel(id, 35, 5), Some(RED));
    }

    #[test]
    fn resizing_through_the_store_lays_out_again() {
        let mut store = LayerStore::new();
        let typesetter = Monospace::default();
        let mut layer = text_layer(&mut store, &typesetter);
        layer.set_attributed_string(two_colors());
        layer.draw(&mut store);
        let id = layer.layer();

        store.set_size(id, Size::new(200.0, 40.0));
        assert_eq!(layer.lines(&store)[0].max_width, 200.0);
        layer.draw(&mut store);
        // Four glyphs centered in 200: x from 80 to 120.
        assert_eq!(store.surface_pixel(id, 75, 5), Some([0, 0, 0, 0]));
        assert_eq!(store.surface_pixel(id, 85, 5), Some(RED));
        assert_eq!(store.surface_pixel(id, 115, 5), Some(BLUE));
        assert_eq!(
            layer.attributes_at_point(&store, Point::new(85.0, 5.0)),
            Some(colored(RED))
        );

        // A store-driven redraw after a store resize also picks up the new width.
        store.set_frame(id, Rect::new(0.0, 0.0, 300.0, 40.0));
        store.draw(id);
        assert_eq!(store.surface_pixel(id, 135, 5), Some(RED));
        assert_eq!(store.surface_pixel(id, 85, 5), Some([0, 0, 0, 0]));
        assert_eq!(typesetter.requests(), ["rect", "rect", "rect"]);
    }
}
