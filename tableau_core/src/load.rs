// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Asynchronous contents loading.
//!
//! Assigning a contents *source* (a URL string) to a layer does not decode
//! anything itself. The source is classified as image or video
//! ([`classify_source`]), wrapped in a [`LoadRequest`], and handed to a
//! [`ContentDecoder`] supplied by the host. The decoder returns a future that
//! the [`LayerStore`](crate::layer::LayerStore) polls cooperatively from
//! [`poll_loads`](crate::layer::LayerStore::poll_loads); nothing blocks and
//! the tree stays renderable with its previous contents while a load is
//! pending.
//!
//! Each request carries a [`CancellationToken`]. Superseding a layer's
//! contents cancels the token of the pending load, so a late-arriving result
//! is dropped instead of racing the newer assignment.

use std::cell::Cell;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use url::Url;

use crate::config::{StageConfig, VideoPlayback};
use crate::content::Drawable;

/// The kind of media a drawable or contents source represents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// A still image.
    #[default]
    Image,
    /// A video (or audio) stream with playback state.
    Video,
    /// Anything else: canvases, renderer outputs, test doubles.
    Other,
}

/// Error produced when a contents source string cannot be interpreted.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// The source is neither an absolute URL nor resolvable against the base URL.
    #[error("malformed contents source URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Error produced by a [`ContentDecoder`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// The resource could not be fetched.
    #[error("contents source not found: {0}")]
    NotFound(String),
    /// The resource was fetched but could not be decoded.
    #[error("failed to decode contents: {0}")]
    Decode(String),
    /// The decoder does not handle this kind of media.
    #[error("unsupported media kind {0:?}")]
    Unsupported(MediaKind),
    /// The load was cancelled before it completed.
    #[error("load cancelled")]
    Cancelled,
}

/// Classifies a contents source as image or video.
///
/// `data:` and `blob:` URLs carry no usable extension, so they are video only
/// when `mime` starts with `video`. Every other source is resolved against
/// [`StageConfig::base_url`] and classified by the lowercase extension of its
/// last path segment. Content-addressed names of the form
/// `<40 hex digits>.<ext>` are handled by looking at the part before the
/// first dot when the "extension" itself is 40 characters long.
///
/// # Errors
///
/// Returns [`SourceError::InvalidUrl`] if the source cannot be parsed.
pub fn classify_source(
    src: &str,
    mime: Option<&str>,
    config: &StageConfig,
) -> Result<MediaKind, SourceError> {
    if src.starts_with("data:") || src.starts_with("blob:") {
        let video = mime.is_some_and(|m| m.starts_with("video"));
        return Ok(if video {
            MediaKind::Video
        } else {
            MediaKind::Image
        });
    }

    let url = config.base_url.join(src)?;
    let kind = match path_extension(&url) {
        Some(ext) if config.is_video_extension(&ext) => MediaKind::Video,
        _ => MediaKind::Image,
    };
    Ok(kind)
}

/// Length of a hex SHA-1 digest, used as a file name by content-addressed stores.
const DIGEST_EXTENSION_LEN: usize = 40;

fn path_extension(url: &Url) -> Option<String> {
    let filename = url.path_segments()?.next_back()?;
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = if ext.len() == DIGEST_EXTENSION_LEN {
        filename.split_once('.').map_or(ext, |(stem, _)| stem)
    } else {
        ext
    };
    Some(ext.to_ascii_lowercase())
}

/// Shared flag used to abandon an in-flight load.
///
/// Clones share the same flag. The store cancels the token when the load is
/// superseded or the layer is destroyed; decoders may poll it to stop early.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Rc<Cell<bool>>);

impl CancellationToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the token (and every clone of it) as cancelled.
    pub fn cancel(&self) {
        self.0.set(true);
    }

    /// Returns `true` once [`cancel`](Self::cancel) was called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// Everything a [`ContentDecoder`] needs to produce a drawable.
#[derive(Clone, Debug)]
pub struct LoadRequest {
    /// The source string as assigned by the caller.
    pub source: String,
    /// Whether the source was classified as image or video.
    pub kind: MediaKind,
    /// Playback settings, present only for video sources.
    pub video: Option<VideoPlayback>,
    /// Cancelled when the load is superseded.
    pub token: CancellationToken,
}

/// Result of a decode.
pub type LoadResult = Result<Box<dyn Drawable>, LoadError>;

/// Host-supplied asynchronous decoder for contents sources.
///
/// The returned future is polled without a real waker, so decoders are
/// expected to be driven by the host's own event loop (a channel filled by a
/// platform callback, an already-ready value, etc.).
pub trait ContentDecoder {
    /// Starts decoding `request`.
    fn decode(&self, request: &LoadRequest) -> LocalBoxFuture<'static, LoadResult>;
}

impl<F> ContentDecoder for F
where
    F: Fn(&LoadRequest) -> LocalBoxFuture<'static, LoadResult>,
{
    fn decode(&self, request: &LoadRequest) -> LocalBoxFuture<'static, LoadResult> {
        self(request)
    }
}
