// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use std::slice;

use super::id::LayerId;
use super::store::LayerStore;

/// An iterator over the direct sublayers of a layer, back to front.
///
/// Created by [`LayerStore::sublayers`]. Reverse it to walk front to back.
#[derive(Debug)]
pub struct Sublayers<'a> {
    store: &'a LayerStore,
    iter: slice::Iter<'a, u32>,
}

impl<'a> Sublayers<'a> {
    pub(crate) fn new(store: &'a LayerStore, sublayers: &'a [u32]) -> Self {
        Self {
            store,
            iter: sublayers.iter(),
        }
    }
}

impl Iterator for Sublayers<'_> {
    type Item = LayerId;

    fn next(&mut self) -> Option<LayerId> {
        self.iter.next().map(|&idx| self.store.id_at(idx))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl DoubleEndedIterator for Sublayers<'_> {
    fn next_back(&mut self) -> Option<LayerId> {
        self.iter.next_back().map(|&idx| self.store.id_at(idx))
    }
}

impl ExactSizeIterator for Sublayers<'_> {}
