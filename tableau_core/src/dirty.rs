// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Every property mutation on a [`LayerStore`](crate::layer::LayerStore)
//! marks one of these channels (via [`understory_dirty`]), so the renderer can
//! ask for exactly what changed since the previous frame.
//!
//! # Propagation semantics
//!
//! - **Propagating**: [`FRAME`] uses
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) and has dependency edges
//!   from child to parent. World transforms and effective hidden state are
//!   inherited, so marking a parent marks every descendant. Opacity and
//!   hidden-flag changes are routed through [`FRAME`] so that one drain pass
//!   recomputes all inherited state.
//!
//! - **Local-only**: [`CONTENTS`] and [`MASK`] only mark the layer that was
//!   touched. Filter changes mark [`MASK`].
//!
//! - **Structural**: [`TOPOLOGY`] is marked on insert/remove and
//!   create/destroy. It forces a traversal-order rebuild during evaluation.
//!
//! # Consumption
//!
//! Callers never query dirty state directly.
//! [`LayerStore::evaluate`](crate::layer::LayerStore::evaluate) drains all
//! channels and reports the result as
//! [`FrameChanges`](crate::layer::FrameChanges).

use understory_dirty::Channel;

/// Geometry, opacity or hidden flag changed; inherited state of the subtree
/// must be recomputed.
pub const FRAME: Channel = Channel::new(0);

/// Contents replaced, redrawn, or finished loading.
pub const CONTENTS: Channel = Channel::new(1);

/// Mask or filters replaced.
pub const MASK: Channel = Channel::new(2);

/// Tree topology changed; triggers a traversal order rebuild.
pub const TOPOLOGY: Channel = Channel::new(3);
