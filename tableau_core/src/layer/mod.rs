// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer tree data model.
//!
//! A *layer* is a node in a compositing tree. Each layer has:
//!
//! - An identity ([`LayerId`]), a generational handle that becomes stale when
//!   the layer is destroyed.
//! - Topology: a superlayer link and a z-ordered list of sublayers.
//! - **Geometry** set by the caller: [`position`](LayerStore::set_position),
//!   [`size`](LayerStore::set_size), [`anchor_point`](LayerStore::set_anchor_point)
//!   and [`transform`](LayerStore::set_transform). Everything derived from it
//!   lives in a lazily filled [`LayoutCache`].
//! - **Compositing inputs**: [`contents`](LayerStore::set_contents),
//!   [`content_rect`](LayerStore::set_content_rect),
//!   [`mask`](LayerStore::set_mask), [`filters`](LayerStore::set_filters),
//!   opacity and the hidden and opaque flags.
//! - **Computed properties** produced by [`evaluate`](LayerStore::evaluate):
//!   `world_transform`, `effective_opacity` and `effective_hidden`.
//!
//! Layers are stored in struct-of-arrays layout with index-based handles.
//!
//! # Dirty tracking
//!
//! Property mutations mark the corresponding dirty channel
//! (see [`dirty`](crate::dirty)):
//!
//! - **FRAME** propagates to all descendants, since world transforms,
//!   opacities and hidden state are inherited.
//! - **CONTENTS** / **MASK** are local-only.
//! - **TOPOLOGY** marks structural changes (insert/remove, create/destroy)
//!   that trigger a traversal-order rebuild.

mod contents;
mod evaluate;
mod id;
mod layout;
mod store;
mod traverse;

pub use evaluate::FrameChanges;
pub use hit_test::HitTestEvent;
pub use id::{INVALID, LayerId};
pub use layout::{Geometry, LayoutCache, centered_rect};
pub use store::{LayerFlags, LayerStore};
pub use traverse::Sublayers;
