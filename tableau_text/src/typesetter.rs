// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Styled text and the typesetter contract.
//!
//! Line breaking and glyph shaping are done by an external [`Typesetter`].
//! This module only defines what goes in (an [`AttributedString`] and a
//! constraint shape) and what comes out (a [`TypesetResult`] of measured
//! [`Line`]s).

use kurbo::{Point, Size};
use tableau_core::surface::{Canvas, Rgba};

/// Character attributes of a run of text.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    /// Font family name.
    pub font_family: String,
    /// Font size in pixels.
    pub font_size: f64,
    /// Font weight on the usual 100..=900 scale.
    pub weight: u16,
    /// Italic face.
    pub italic: bool,
    /// Draw an underline.
    pub underline: bool,
    /// Fill color.
    pub color: Rgba,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: String::from("sans-serif"),
            font_size: 16.0,
            weight: 400,
            italic: false,
            underline: false,
            color: [0, 0, 0, 255],
        }
    }
}

/// A span of text sharing one [`TextStyle`].
#[derive(Clone, Debug, PartialEq)]
pub struct AttributedRun {
    /// The text of the span.
    pub text: String,
    /// Its attributes.
    pub style: TextStyle,
}

/// Text with per-span styling.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributedString {
    runs: Vec<AttributedRun>,
}

impl AttributedString {
    /// Creates an empty string.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a string with a single styled span.
    #[must_use]
    pub fn styled(text: impl Into<String>, style: TextStyle) -> Self {
        let mut s = Self::new();
        s.push(text, style);
        s
    }

    /// Appends a styled span. Empty spans are skipped.
    pub fn push(&mut self, text: impl Into<String>, style: TextStyle) {
        let text = text.into();
        if !text.is_empty() {
            self.runs.push(AttributedRun { text, style });
        }
    }

    /// The styled spans, in order.
    #[must_use]
    pub fn runs(&self) -> &[AttributedRun] {
        &self.runs
    }

    /// The concatenated plain text.
    #[must_use]
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Returns `true` if there is no text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

impl From<&str> for AttributedString {
    fn from(text: &str) -> Self {
        Self::styled(text, TextStyle::default())
    }
}

/// A positioned, measured glyph cluster.
#[derive(Clone, Debug, PartialEq)]
pub struct Glyph {
    /// The characters the glyph renders.
    pub text: String,
    /// Advance width.
    pub width: f64,
    /// Whether the glyph is whitespace.
    pub is_whitespace: bool,
}

/// Consecutive glyphs of one style within a line.
#[derive(Clone, Debug, PartialEq)]
pub struct Run {
    /// Attributes shared by the glyphs.
    pub style: TextStyle,
    /// The glyphs, in visual order.
    pub glyphs: Vec<Glyph>,
    /// Line height contributed by this run.
    pub height: f64,
}

impl Run {
    /// Sum of the glyph advances.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.glyphs.iter().map(|g| g.width).sum()
    }
}

/// One laid-out line.
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    /// Runs, left to right.
    pub runs: Vec<Run>,
    /// Width available to this line within the constraint shape.
    pub max_width: f64,
}

impl Line {
    /// Sum of the run widths.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.runs.iter().map(Run::width).sum()
    }

    /// The tallest run height.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.runs.iter().map(|r| r.height).fold(0.0, f64::max)
    }

    /// The last glyph of the line, if any.
    #[must_use]
    pub fn last_glyph(&self) -> Option<&Glyph> {
        self.runs.iter().rev().find_map(|r| r.glyphs.last())
    }

    /// Width excluding a trailing whitespace glyph.
    #[must_use]
    pub fn trimmed_width(&self) -> f64 {
        match self.last_glyph() {
            Some(g) if g.is_whitespace => self.width() - g.width,
            _ => self.width(),
        }
    }
}

/// Output of a layout request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypesetResult {
    /// The lines, top to bottom.
    pub lines: Vec<Line>,
    /// Whether the shape ran out of room before all text was placed.
    pub exhausted: bool,
    /// Whether some line had to break inside a word.
    pub wrapped_on_character: bool,
}

impl TypesetResult {
    /// Sum of the line heights.
    #[must_use]
    pub fn total_height(&self) -> f64 {
        self.lines.iter().map(Line::height).sum()
    }

    /// The widest line.
    #[must_use]
    pub fn max_line_width(&self) -> f64 {
        self.lines.iter().map(Line::width).fold(0.0, f64::max)
    }
}

/// Breaks styled text into lines that fit a shape, and draws them.
pub trait Typesetter {
    /// Lays out `text` inside a `max` sized rectangle.
    fn lines_in_rect(&self, text: &AttributedString, max: Size) -> TypesetResult;

    /// Lays out `text` inside the ellipse inscribed in `max`.
    fn lines_in_ellipse(&self, text: &AttributedString, max: Size) -> TypesetResult;

    /// Lays out `text` inside a `max` sized rectangle with corners rounded by
    /// `radius` pixels.
    fn lines_in_round_rect(&self, text: &AttributedString, max: Size, radius: f64)
    -> TypesetResult;

    /// Draws `line` with its top-left at `origin`, returning the origin of the
    /// next line.
    fn draw_line(&self, line: &Line, canvas: &mut Canvas<'_>, origin: Point) -> Point;
}
