// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer contents.
//!
//! What a layer shows is described by a [`ContentSource`]. Rather than
//! specialized layer kinds overriding what "contents" means, the strategy is
//! held by value: a decoded [`Drawable`], a software [`DrawnSurface`], or a
//! [`Passthrough`](ContentSource::Passthrough) marker for pixels owned by the
//! renderer.

use std::fmt;

use kurbo::Size;

use crate::load::MediaKind;
use crate::mask::Mask;
use crate::surface::DrawnSurface;

/// Decoded media that a layer can display.
///
/// Implemented by the host for its image and video handles. Only
/// [`natural_size`](Self::natural_size) is required.
pub trait Drawable {
    /// The kind of media this drawable represents.
    fn kind(&self) -> MediaKind {
        MediaKind::Other
    }

    /// Intrinsic pixel size of the media.
    fn natural_size(&self) -> Size;

    /// Alpha mask used for hit testing, if the media provides one.
    fn hit_test_mask(&self) -> Option<&Mask> {
        None
    }

    /// Alpha threshold that accompanies [`hit_test_mask`](Self::hit_test_mask).
    fn hit_test_mask_threshold(&self) -> Option<u8> {
        None
    }

    /// Returns `true` for media whose pixels change every frame (a playing
    /// video with current data). Live contents always need re-upload.
    fn is_live(&self) -> bool {
        false
    }

    /// Returns `true` if playback is paused.
    fn is_paused(&self) -> bool {
        false
    }

    /// Resumes playback.
    fn play(&mut self) {}

    /// Releases decoder resources. Called right before the drawable is
    /// replaced or its layer destroyed.
    fn release(&mut self) {}
}

/// What a layer displays.
#[derive(Default)]
pub enum ContentSource {
    /// Nothing; the layer only groups its sublayers.
    #[default]
    Empty,
    /// A decoded image, video, or other host drawable.
    Drawable(Box<dyn Drawable>),
    /// An off-screen RGBA surface drawn in software.
    Surface(DrawnSurface),
    /// Pixels supplied by the renderer itself. Never needs an upload.
    Passthrough,
}

impl fmt::Debug for ContentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Drawable(d) => f
                .debug_struct("Drawable")
                .field("kind", &d.kind())
                .field("natural_size", &d.natural_size())
                .finish_non_exhaustive(),
            Self::Surface(s) => f.debug_tuple("Surface").field(s).finish(),
            Self::Passthrough => f.write_str("Passthrough"),
        }
    }
}

impl ContentSource {
    /// Returns `true` for [`ContentSource::Empty`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns `true` for [`ContentSource::Passthrough`].
    #[must_use]
    pub fn is_passthrough(&self) -> bool {
        matches!(self, Self::Passthrough)
    }

    /// Returns the drawable, if this is [`ContentSource::Drawable`].
    #[must_use]
    pub fn as_drawable(&self) -> Option<&dyn Drawable> {
        match self {
            Self::Drawable(d) => Some(d.as_ref()),
            _ => None,
        }
    }

    /// Returns the surface, if this is [`ContentSource::Surface`].
    #[must_use]
    pub fn as_surface(&self) -> Option<&DrawnSurface> {
        match self {
            Self::Surface(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn as_surface_mut(&mut self) -> Option<&mut DrawnSurface> {
        match self {
            Self::Surface(s) => Some(s),
            _ => None,
        }
    }

    /// The media kind, if the contents carry one.
    #[must_use]
    pub fn kind(&self) -> Option<MediaKind> {
        match self {
            Self::Drawable(d) => Some(d.kind()),
            Self::Surface(_) => Some(MediaKind::Other),
            Self::Empty | Self::Passthrough => None,
        }
    }

    /// Intrinsic pixel size, or `None` when the contents have none.
    #[must_use]
    pub fn natural_size(&self) -> Option<Size> {
        match self {
            Self::Drawable(d) => Some(d.natural_size()),
            Self::Surface(s) => Some(s.pixel_size()),
            Self::Empty | Self::Passthrough => None,
        }
    }

    /// Hit-test mask derived from the contents, together with its threshold.
    ///
    /// Drawn surfaces derive their mask from their own alpha channel and carry
    /// no threshold of their own.
    #[must_use]
    pub fn hit_test_mask(&self) -> Option<(&Mask, Option<u8>)> {
        match self {
            Self::Drawable(d) => d.hit_test_mask().map(|m| (m, d.hit_test_mask_threshold())),
            Self::Surface(s) => Some((s.hit_test_mask(), None)),
            Self::Empty | Self::Passthrough => None,
        }
    }

    /// Returns `true` if the contents change on their own every frame.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.as_drawable().is_some_and(|d| d.is_live())
    }

    /// Releases resources held by the contents.
    pub(crate) fn release(&mut self) {
        if let Self::Drawable(d) = self {
            d.release();
        }
    }
}
