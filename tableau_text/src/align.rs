// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Alignment of laid-out lines within the text rect.
//!
//! Drawing and point lookup both go through [`vertical_origin`] and
//! [`horizontal_origin`], so a point maps back to exactly the glyphs drawn
//! under it.

use kurbo::Rect;

use crate::typesetter::Line;

/// Placement of the line block within the text rect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum VerticalAlignment {
    /// Start at the top edge.
    #[default]
    Top,
    /// Center the block.
    Center,
    /// Align the block's bottom with the bottom edge.
    Bottom,
}

/// Placement of each line within its available width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HorizontalAlignment {
    /// Flush left.
    Left,
    /// Centered.
    #[default]
    Center,
    /// Flush right.
    Right,
}

/// The outline text is laid out in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextShape {
    /// The full text rect, optionally with rounded corners.
    #[default]
    Rectangle,
    /// The ellipse inscribed in the text rect.
    Ellipse,
}

/// The y coordinate of the first line's top.
///
/// A block taller than the rect is treated as exactly as tall as the rect,
/// so it never starts above the top edge.
#[must_use]
pub fn vertical_origin(alignment: VerticalAlignment, rect: Rect, total_height: f64) -> f64 {
    let block = rect.height().min(total_height);
    match alignment {
        VerticalAlignment::Top => rect.y0,
        VerticalAlignment::Center => rect.center().y - block / 2.0,
        VerticalAlignment::Bottom => rect.y1 - block,
    }
}

/// The x coordinate of `line`'s left edge.
///
/// Lines occupy a band of `line.max_width` centered in the rect. Centered and
/// right-aligned lines ignore a trailing whitespace glyph, and never measure
/// wider than the band (for ellipses) or the rect (otherwise).
#[must_use]
pub fn horizontal_origin(
    alignment: HorizontalAlignment,
    shape: TextShape,
    rect: Rect,
    line: &Line,
) -> f64 {
    let center = rect.center().x;
    let left = center - line.max_width / 2.0;
    let right = center + line.max_width / 2.0;
    let available = match shape {
        TextShape::Ellipse => line.max_width,
        TextShape::Rectangle => rect.width(),
    };
    let text_width = line.trimmed_width().min(available);
    match alignment {
        HorizontalAlignment::Left => left,
        HorizontalAlignment::Center => (center - text_width / 2.0).floor(),
        HorizontalAlignment::Right => right - text_width,
    }
}
