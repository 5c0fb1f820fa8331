// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer filters.
//!
//! Filters are capability objects attached to a layer in order. The renderer
//! reads [`Filter::paint_transform`]; hit testing consults
//! [`Filter::contains_point`]. Both are optional.
//!
//! Filters are shared as `Rc<dyn Filter>` and compared by pointer identity,
//! so the same filter instance can be added to several layers and removed
//! from one of them without affecting the others.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use kurbo::{Point, Rect, RoundedRect, Shape, Size};

use crate::transform::Transform3d;

/// A compositing filter attached to a layer.
pub trait Filter: fmt::Debug {
    /// Point containment in the layer's local frame space.
    ///
    /// `Some(false)` rejects the hit for the whole layer, `Some(true)` makes
    /// the layer a tentative hit, `None` means the filter has no opinion.
    fn contains_point(&self, local: Point, size: Size) -> Option<bool> {
        _ = (local, size);
        None
    }

    /// Extra transform the renderer applies when painting the layer.
    fn paint_transform(&self) -> Option<Transform3d> {
        None
    }
}

/// Returns `true` if `a` and `b` are the same filter instance.
#[must_use]
pub fn same_filter(a: &Rc<dyn Filter>, b: &Rc<dyn Filter>) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Clips a layer to a rounded rectangle.
///
/// Installed automatically when a layer's corner radius is nonzero. The
/// radius is a fraction of half the smaller frame dimension, so `1.0` turns
/// a square into a circle.
#[derive(Debug, Default)]
pub struct RoundRectMaskFilter {
    corner_radius: Cell<f64>,
}

impl RoundRectMaskFilter {
    /// Creates a filter with the given fractional radius.
    #[must_use]
    pub fn new(corner_radius: f64) -> Self {
        Self {
            corner_radius: Cell::new(corner_radius),
        }
    }

    /// The fractional corner radius in `[0, 1]`.
    #[must_use]
    pub fn corner_radius(&self) -> f64 {
        self.corner_radius.get()
    }

    /// Updates the fractional corner radius.
    pub fn set_corner_radius(&self, corner_radius: f64) {
        self.corner_radius.set(corner_radius);
    }

    /// The corner radius in points for a frame of `size`.
    #[must_use]
    pub fn pixel_radius(&self, size: Size) -> f64 {
        size.min_side().max(0.0) / 2.0 * self.corner_radius.get()
    }

    /// The clip shape for a frame of `size`.
    #[must_use]
    pub fn shape(&self, size: Size) -> RoundedRect {
        Rect::from_origin_size(Point::ZERO, size).to_rounded_rect(self.pixel_radius(size))
    }
}

impl Filter for RoundRectMaskFilter {
    fn contains_point(&self, local: Point, size: Size) -> Option<bool> {
        Some(self.shape(size).contains(local))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_radius_makes_a_circle() {
        let filter = RoundRectMaskFilter::new(1.0);
        let size = Size::new(100.0, 100.0);
        assert!((filter.pixel_radius(size) - 50.0).abs() < 1e-9);
        assert_eq!(filter.contains_point(Point::new(50.0, 50.0), size), Some(true));
        assert_eq!(filter.contains_point(Point::new(3.0, 3.0), size), Some(false));
    }

    #[test]
    fn radius_uses_smaller_side() {
        let filter = RoundRectMaskFilter::new(0.5);
        assert!((filter.pixel_radius(Size::new(200.0, 40.0)) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn identity_is_by_pointer() {
        let a: Rc<dyn Filter> = Rc::new(RoundRectMaskFilter::new(0.2));
        let b: Rc<dyn Filter> = Rc::new(RoundRectMaskFilter::new(0.2));
        assert!(same_filter(&a, &a.clone()));
        assert!(!same_filter(&a, &b));
    }
}
