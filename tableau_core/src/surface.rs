// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Software-drawn backing stores.
//!
//! A [`DrawnSurface`] is an RGBA8 pixel buffer owned by exactly one layer.
//! Its dimensions are the ceiled layer size. A [`SurfacePainter`] renders
//! into it through a [`Canvas`], and the surface's alpha channel doubles as
//! the layer's hit-test mask.

use std::cell::OnceCell;
use std::fmt;

use kurbo::{Rect, Size};

use crate::mask::Mask;

/// An RGBA8 color, non-premultiplied.
pub type Rgba = [u8; 4];

/// Drawing target handed to a [`SurfacePainter`].
///
/// All drawing respects the optional clip rectangle. Coordinates are in
/// surface pixels, with the origin at the top-left.
pub struct Canvas<'a> {
    pixels: &'a mut [u8],
    width: u32,
    height: u32,
    clip: Option<Rect>,
}

impl fmt::Debug for Canvas<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canvas")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("clip", &self.clip)
            .finish_non_exhaustive()
    }
}

impl<'a> Canvas<'a> {
    /// Wraps an RGBA8 buffer of `width × height` pixels.
    ///
    /// # Panics
    ///
    /// Panics if `pixels.len() != width * height * 4`.
    pub fn new(pixels: &'a mut [u8], width: u32, height: u32) -> Self {
        assert_eq!(
            pixels.len(),
            width as usize * height as usize * 4,
            "canvas buffer does not match {width}x{height}"
        );
        Self {
            pixels,
            width,
            height,
            clip: None,
        }
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

    /// The canvas size as a [`Size`].
    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }

    /// Restricts subsequent drawing to `clip` (or lifts the restriction).
    pub fn set_clip(&mut self, clip: Option<Rect>) {
        self.clip = clip;
    }

    /// The active clip rectangle.
    #[must_use]
    pub fn clip(&self) -> Option<Rect> {
        self.clip
    }

    /// Resets every pixel (ignoring the clip) to transparent black.
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Writes a single pixel. Out-of-range or clipped writes are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        if x >= self.width || y >= self.height {
            return;
        }
        if let Some(clip) = self.clip {
            let (px, py) = (f64::from(x) + 0.5, f64::from(y) + 0.5);
            if px < clip.x0 || px >= clip.x1 || py < clip.y0 || py >= clip.y1 {
                return;
            }
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels[offset..offset + 4].copy_from_slice(&color);
    }

    /// Reads a single pixel.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        read_pixel(self.pixels, self.width, self.height, x, y)
    }

    /// Fills every pixel whose center lies inside `rect`.
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "bounds are clamped to the canvas before conversion"
    )]
    pub fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        let mut rect = rect.abs();
        if let Some(clip) = self.clip {
            rect = rect.intersect(clip);
        }
        let w = f64::from(self.width);
        let h = f64::from(self.height);
        let x0 = (rect.x0 - 0.5).ceil().clamp(0.0, w) as u32;
        let x1 = (rect.x1 - 0.5).ceil().clamp(0.0, w) as u32;
        let y0 = (rect.y0 - 0.5).ceil().clamp(0.0, h) as u32;
        let y1 = (rect.y1 - 0.5).ceil().clamp(0.0, h) as u32;
        for y in y0..y1 {
            for x in x0..x1 {
                let offset = (y as usize * self.width as usize + x as usize) * 4;
                self.pixels[offset..offset + 4].copy_from_slice(&color);
            }
        }
    }
}

fn read_pixel(pixels: &[u8], width: u32, height: u32, x: u32, y: u32) -> Option<Rgba> {
    if x >= width || y >= height {
        return None;
    }
    let offset = (y as usize * width as usize + x as usize) * 4;
    let px = pixels.get(offset..offset + 4)?;
    Some([px[0], px[1], px[2], px[3]])
}

/// The draw routine of a drawn-surface layer.
///
/// The canvas is cleared before `paint` is called.
pub trait SurfacePainter {
    /// Renders into `canvas`.
    fn paint(&mut self, canvas: &mut Canvas<'_>);
}

impl<F> SurfacePainter for F
where
    F: FnMut(&mut Canvas<'_>),
{
    fn paint(&mut self, canvas: &mut Canvas<'_>) {
        self(canvas);
    }
}

/// Off-screen RGBA8 backing store of a drawn layer.
pub struct DrawnSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    hit_test_mask: OnceCell<Mask>,
    painter: Option<Box<dyn SurfacePainter>>,
}

impl fmt::Debug for DrawnSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawnSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("has_painter", &self.painter.is_some())
            .field("mask_cached", &self.hit_test_mask.get().is_some())
            .finish_non_exhaustive()
    }
}

/// Converts a layer dimension to surface pixels.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "negative and NaN dimensions clamp to zero before conversion"
)]
fn pixel_extent(v: f64) -> u32 {
    v.max(0.0).ceil().min(f64::from(u32::MAX)) as u32
}

impl DrawnSurface {
    /// Creates a transparent surface for a layer of `size`.
    #[must_use]
    pub fn new(size: Size, painter: Option<Box<dyn SurfacePainter>>) -> Self {
        let width = pixel_extent(size.width);
        let height = pixel_extent(size.height);
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
            hit_test_mask: OnceCell::new(),
            painter,
        }
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

    /// Pixel dimensions as a [`Size`].
    #[must_use]
    pub fn pixel_size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }

    /// Raw RGBA8 pixels, row-major.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Reads one pixel.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        read_pixel(&self.pixels, self.width, self.height, x, y)
    }

    /// Returns `true` if a draw routine is installed.
    #[must_use]
    pub fn has_painter(&self) -> bool {
        self.painter.is_some()
    }

    /// Installs (or removes) the draw routine.
    pub fn set_painter(&mut self, painter: Option<Box<dyn SurfacePainter>>) {
        self.painter = painter;
    }

    /// Resizes to fit a layer of `size`.
    ///
    /// Returns `false`, leaving pixels and the cached mask untouched, when the
    /// ceiled dimensions do not change.
    pub fn resize(&mut self, size: Size) -> bool {
        let width = pixel_extent(size.width);
        let height = pixel_extent(size.height);
        if width == self.width && height == self.height {
            return false;
        }
        self.width = width;
        self.height = height;
        self.pixels = vec![0; width as usize * height as usize * 4];
        self.hit_test_mask.take();
        true
    }

    /// Alpha mask derived from the pixels, computed on first use after a draw
    /// or resize.
    #[must_use]
    pub fn hit_test_mask(&self) -> &Mask {
        self.hit_test_mask
            .get_or_init(|| Mask::from_rgba_alpha(&self.pixels, self.width, self.height))
    }

    /// Returns `true` if the hit-test mask is currently cached.
    #[must_use]
    pub fn has_cached_mask(&self) -> bool {
        self.hit_test_mask.get().is_some()
    }

    /// Clears and redraws with the installed painter.
    ///
    /// Returns `false` (and leaves the pixels alone) when no painter is
    /// installed.
    pub fn draw(&mut self) -> bool {
        let Some(painter) = self.painter.as_mut() else {
            return false;
        };
        let mut canvas = Canvas::new(&mut self.pixels, self.width, self.height);
        canvas.clear();
        painter.paint(&mut canvas);
        self.hit_test_mask.take();
        true
    }

    /// Clears and redraws with a borrowed painter.
    pub fn draw_with(&mut self, painter: &mut dyn SurfacePainter) {
        let mut canvas = Canvas::new(&mut self.pixels, self.width, self.height);
        canvas.clear();
        painter.paint(&mut canvas);
        self.hit_test_mask.take();
    }
}
