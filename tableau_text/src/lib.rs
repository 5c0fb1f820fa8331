// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shape-constrained text layers.
//!
//! A [`TextLayer`] wraps a drawn-surface layer of a
//! [`LayerStore`](tableau_core::layer::LayerStore). It asks a [`Typesetter`]
//! to break an [`AttributedString`] into lines that fit a rectangle, rounded
//! rectangle or ellipse, aligns the lines, and paints them into the layer's
//! surface. Points on the layer map back to the line and run drawn there, so
//! UI code can find the style of the word under the pointer.
//!
//! The typesetter is supplied by the host: shaping and font access are not
//! part of this crate.

pub mod align;
pub mod layer;
pub mod typesetter;

pub use align::{HorizontalAlignment, TextShape, VerticalAlignment};
pub use layer::{FitResult, TextLayer};
pub use typesetter::{
    AttributedRun, AttributedString, Glyph, Line, Run, TextStyle, TypesetResult, Typesetter,
};
