// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scrollable windows onto large contents.
//!
//! A [`ScrollWindowLayer`] pans over contents that are larger than its frame
//! by moving the content rect, so nothing is decoded or redrawn while
//! scrolling.

use kurbo::{Rect, Size, Vec2};

use crate::layer::{LayerId, LayerStore};

/// A layer whose content rect follows a scroll offset.
///
/// The offset is in natural content pixels. The content rect is
/// `offset / natural_size` with extent `frame.size / natural_size`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollWindowLayer {
    layer: LayerId,
    content_offset: Vec2,
}

impl ScrollWindowLayer {
    /// Creates a new layer in `store` and wraps it.
    pub fn new(store: &mut LayerStore) -> Self {
        Self::wrap(store.create_layer())
    }

    /// Wraps an existing layer. The offset starts at zero.
    #[must_use]
    pub fn wrap(layer: LayerId) -> Self {
        Self {
            layer,
            content_offset: Vec2::ZERO,
        }
    }

    /// The wrapped layer.
    #[must_use]
    pub fn layer(&self) -> LayerId {
        self.layer
    }

    /// The current offset in natural content pixels.
    #[must_use]
    pub fn content_offset(&self) -> Vec2 {
        self.content_offset
    }

    /// Moves the window to `offset` and updates the content rect.
    pub fn set_content_offset(&mut self, store: &mut LayerStore, offset: Vec2) {
        self.content_offset = offset;
        self.relayout(store);
    }

    /// Resizes the wrapped layer and re-applies the offset.
    pub fn set_size(&mut self, store: &mut LayerStore, size: Size) {
        store.set_size(self.layer, size);
        self.relayout(store);
    }

    /// Re-applies the offset, e.g. after the frame or the contents changed.
    ///
    /// Contents without a natural size leave the content rect untouched.
    pub fn relayout(&self, store: &mut LayerStore) {
        let natural = store.natural_size(self.layer);
        if natural.width == 0.0 || natural.height == 0.0 {
            tracing::debug!(layer = %self.layer, "scroll window has no natural size");
            return;
        }
        let size = store.size(self.layer);
        let origin = self.content_offset;
        let rect = Rect::new(
            origin.x / natural.width,
            origin.y / natural.height,
            (origin.x + size.width) / natural.width,
            (origin.y + size.height) / natural.height,
        );
        store.set_content_rect(self.layer, rect);
    }
}
