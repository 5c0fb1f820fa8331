// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Alpha masks used for compositing and hit testing.

use std::rc::Rc;

/// A single-channel alpha buffer.
///
/// Masks are shared by reference (`Rc<[u8]>`) so the renderer can keep the
/// buffer it uploaded while the layer swaps in a new one. Mask resolution is
/// independent of the layer's frame size; hit testing scales into it.
#[derive(Clone, PartialEq, Eq)]
pub struct Mask {
    data: Rc<[u8]>,
    width: u32,
    height: u32,
    threshold: Option<u8>,
}

impl std::fmt::Debug for Mask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mask")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

impl Mask {
    /// Creates a mask from `width × height` alpha bytes in row-major order.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != width * height`.
    #[must_use]
    pub fn new(data: impl Into<Rc<[u8]>>, width: u32, height: u32) -> Self {
        let data = data.into();
        assert_eq!(
            data.len(),
            width as usize * height as usize,
            "mask data does not match {width}x{height}"
        );
        Self {
            data,
            width,
            height,
            threshold: None,
        }
    }

    /// Returns this mask with an explicit hit-test threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Extracts the alpha channel of an RGBA8 buffer.
    ///
    /// # Panics
    ///
    /// Panics if `rgba.len() != width * height * 4`.
    #[must_use]
    pub fn from_rgba_alpha(rgba: &[u8], width: u32, height: u32) -> Self {
        assert_eq!(
            rgba.len(),
            width as usize * height as usize * 4,
            "rgba data does not match {width}x{height}"
        );
        let alpha: Vec<u8> = rgba.chunks_exact(4).map(|px| px[3]).collect();
        Self::new(alpha, width, height)
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The explicit hit-test threshold, if one was set.
    #[must_use]
    pub fn threshold(&self) -> Option<u8> {
        self.threshold
    }

    /// The raw alpha bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns `true` if the mask has no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the alpha value at pixel `(x, y)`, or `None` when out of range.
    #[must_use]
    pub fn alpha_at(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Samples the mask at normalized coordinates `(u, v)` in `[0, 1]`.
    ///
    /// Coordinates outside the unit square sample as fully transparent. The
    /// right and bottom edges map onto the last column and row.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "coordinates are floored and clamped to the mask bounds first"
    )]
    pub fn sample(&self, u: f64, v: f64) -> u8 {
        if self.is_empty() || !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return 0;
        }
        let max_x = f64::from(self.width - 1);
        let max_y = f64::from(self.height - 1);
        let x = (u * f64::from(self.width)).floor().min(max_x) as u32;
        let y = (v * f64::from(self.height)).floor().min(max_y) as u32;
        self.alpha_at(x, y).unwrap_or(0)
    }
}
