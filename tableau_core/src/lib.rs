// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Retained-mode layer tree for a live video stage.
//!
//! `tableau_core` holds the scene a presenter sees: a tree of layers with
//! geometry, compositing inputs (contents, masks, filters, opacity) and
//! pointer hit testing. It does not draw to the screen; an external renderer
//! reads the evaluated tree each frame.
//!
//! # Architecture
//!
//! ```text
//!   app code ──► LayerStore setters ──► dirty channels
//!                      │                      │
//!                      │ set_contents_source  ▼
//!                      ▼             LayerStore::evaluate() ──► FrameChanges
//!               ContentDecoder                                     │
//!                      │                                           ▼
//!                      └──► poll_loads() ──► contents      Renderer::render()
//!
//!   pointer input ──► LayerStore::hit_test() ──► topmost interactive layer
//! ```
//!
//! **[`layer`]**: Struct-of-arrays layer tree with generational handles,
//! lazily cached layout, evaluation, and hit testing.
//!
//! **[`content`]**: What a layer shows: drawables decoded elsewhere, drawn
//! surfaces owned by the layer, or passthrough surfaces owned by the
//! renderer.
//!
//! **[`surface`]**: Software-drawn RGBA backing stores and the painter
//! contract used to fill them.
//!
//! **[`mask`]** / **[`filter`]**: Alpha masks and filter capabilities that
//! shape rendering and hit testing.
//!
//! **[`load`]**: Source classification and cancellable asynchronous
//! content loading.
//!
//! **[`scroll`]**: Content-offset windows over large contents.
//!
//! **[`dirty`]**: Dirty channels via `understory_dirty`.
//!
//! **[`observe`]**: Per-layer property change notifications.
//!
//! **[`telemetry`]**: Best-effort reporting of content problems.
//!
//! **[`backend`]**: The [`Renderer`](backend::Renderer) trait.
//!
//! **[`config`]**: Stage-wide settings.
//!
//! **[`transform`]**: 3D affine transform type for layer geometry.

pub mod backend;
pub mod config;
pub mod content;
pub mod dirty;
pub mod filter;
pub mod layer;
pub mod load;
pub mod mask;
pub mod observe;
pub mod scroll;
pub mod surface;
pub mod telemetry;
pub mod transform;
