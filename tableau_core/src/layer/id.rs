// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer handles.
//!
//! Logs, tree dumps and telemetry print handles as `#<slot>`; the generation
//! only shows up in `Debug` output.

use std::fmt;

/// Marks an empty parent slot in the store's topology arrays.
pub const INVALID: u32 = u32::MAX;

/// Converts a raw parent slot to `None` when it holds [`INVALID`].
#[inline]
pub(crate) fn parent_slot(raw: u32) -> Option<u32> {
    (raw != INVALID).then_some(raw)
}

/// Handle to a layer owned by a [`LayerStore`](super::LayerStore).
///
/// Destroying a layer bumps its slot's generation, so handles kept across a
/// destroy stop validating even after the slot is handed out again.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl LayerId {
    /// The slot index, as listed in [`FrameChanges`](super::FrameChanges)
    /// and [`traversal_order`](super::LayerStore::traversal_order).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// How many times the slot was recycled before this handle was issued.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerId(#{} gen {})", self.idx, self.generation)
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.idx)
    }
}
