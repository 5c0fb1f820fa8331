// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Local geometry and its lazily derived state.
//!
//! [`Geometry`] is what callers set. [`LayoutCache`] holds everything derived
//! from it (model matrix, its inverse, bounding box, vertex buffers). Each
//! entry is filled on first read and stays valid until
//! [`invalidate_layout`](LayoutCache::invalidate_layout) or
//! [`invalidate_content`](LayoutCache::invalidate_content) clears it; no
//! entry can be read while stale because reading always goes through the
//! cache with the current inputs.

use std::cell::OnceCell;

use kurbo::{Point, Rect, Size};

use crate::transform::Transform3d;

/// Caller-set geometry of a layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geometry {
    /// Center of the frame in the superlayer's coordinate space.
    pub position: Point,
    /// Frame size.
    pub size: Size,
    /// Pivot of [`transform`](Self::transform), as a fraction of the frame.
    pub anchor_point: Point,
    /// Transform applied around the anchor point.
    pub transform: Transform3d,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            position: Point::ZERO,
            size: Size::ZERO,
            anchor_point: Point::new(0.5, 0.5),
            transform: Transform3d::IDENTITY,
        }
    }
}

impl Geometry {
    /// The untransformed frame: a rect of `size` centered on `position`.
    #[must_use]
    pub fn frame(&self) -> Rect {
        centered_rect(self.position, self.size)
    }

    /// Maps local frame space (origin at the frame's top-left) into the
    /// superlayer's space.
    #[must_use]
    pub fn model(&self) -> Transform3d {
        let frame = self.frame();
        let origin = Transform3d::from_translation(frame.x0, frame.y0, 0.0);
        if self.transform.is_identity() {
            return origin;
        }
        let anchor = self.anchor_point;
        if anchor == Point::ZERO {
            return origin * self.transform;
        }
        let ax = frame.width() * anchor.x;
        let ay = frame.height() * anchor.y;
        origin
            * Transform3d::from_translation(ax, ay, 0.0)
            * self.transform
            * Transform3d::from_translation(-ax, -ay, 0.0)
    }
}

/// A rect of `size` centered on `center`. Negative sizes are kept, so the
/// result may have negative width or height.
#[must_use]
pub fn centered_rect(center: Point, size: Size) -> Rect {
    let hw = size.width / 2.0;
    let hh = size.height / 2.0;
    Rect::new(center.x - hw, center.y - hh, center.x + hw, center.y + hh)
}

/// Clamps an anchor coordinate into `[0, 1]`. NaN becomes 0.
#[must_use]
pub(crate) fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Two triangles covering `rect`, as `x, y` pairs.
#[expect(
    clippy::cast_possible_truncation,
    reason = "vertex buffers are uploaded as f32"
)]
fn quad(rect: Rect) -> [f32; 12] {
    let (x0, y0, x1, y1) = (
        rect.x0 as f32,
        rect.y0 as f32,
        rect.x1 as f32,
        rect.y1 as f32,
    );
    [x0, y0, x0, y1, x1, y0, x1, y0, x0, y1, x1, y1]
}

/// Lazily computed state derived from [`Geometry`] and the content rect.
#[derive(Clone, Debug, Default)]
pub struct LayoutCache {
    model: OnceCell<Transform3d>,
    inverted_model: OnceCell<Option<Transform3d>>,
    bounding_box: OnceCell<Rect>,
    positions: OnceCell<[f32; 12]>,
    content_coordinates: OnceCell<[f32; 12]>,
}

impl LayoutCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears every geometry-derived entry.
    pub fn invalidate_layout(&mut self) {
        self.model.take();
        self.inverted_model.take();
        self.bounding_box.take();
        self.positions.take();
    }

    /// Clears the content-coordinate entry.
    pub fn invalidate_content(&mut self) {
        self.content_coordinates.take();
    }

    /// Returns `true` if the model matrix is currently cached.
    #[must_use]
    pub fn has_model(&self) -> bool {
        self.model.get().is_some()
    }

    /// Returns `true` if the content coordinates are currently cached.
    #[must_use]
    pub fn has_content_coordinates(&self) -> bool {
        self.content_coordinates.get().is_some()
    }

    /// The model matrix of `geometry`.
    pub fn model(&self, geometry: &Geometry) -> Transform3d {
        *self.model.get_or_init(|| geometry.model())
    }

    /// The inverse model matrix, or `None` when the transform is singular.
    pub fn inverted_model(&self, geometry: &Geometry) -> Option<Transform3d> {
        *self
            .inverted_model
            .get_or_init(|| self.model(geometry).inverse())
    }

    /// Axis-aligned bounds of the transformed frame in the superlayer's space.
    ///
    /// With an identity transform this is exactly the frame.
    pub fn bounding_box(&self, geometry: &Geometry) -> Rect {
        *self.bounding_box.get_or_init(|| {
            let frame = geometry.frame();
            if geometry.transform.is_identity() {
                return frame;
            }
            let model = self.model(geometry);
            let (w, h) = (frame.width(), frame.height());
            let corners = [
                Point::new(0.0, 0.0),
                Point::new(w, 0.0),
                Point::new(0.0, h),
                Point::new(w, h),
            ]
            .map(|p| model.project_point(p));
            let mut bbox = Rect::from_points(corners[0], corners[1]);
            bbox = bbox.union_pt(corners[2]);
            bbox.union_pt(corners[3])
        })
    }

    /// Vertex positions of the frame in local space.
    pub fn positions(&self, geometry: &Geometry) -> [f32; 12] {
        *self.positions.get_or_init(|| {
            quad(Rect::from_origin_size(
                Point::ZERO,
                geometry.frame().size(),
            ))
        })
    }

    /// Texture coordinates of `content_rect`, vertex-aligned with
    /// [`positions`](Self::positions).
    pub fn content_coordinates(&self, content_rect: Rect) -> [f32; 12] {
        *self.content_coordinates.get_or_init(|| quad(content_rect))
    }
}
