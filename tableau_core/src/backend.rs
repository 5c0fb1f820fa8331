// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renderer contract.
//!
//! The core never draws pixels to the screen. A renderer walks the evaluated
//! tree each frame, back to front, and composites what it reads from the
//! store: world transforms, vertex positions, content coordinates, contents,
//! masks, filters and effective opacity.
//!
//! Renderers that keep GPU resources per layer use [`FrameChanges`] to upload
//! only what changed, and call
//! [`mark_contents_updated`](LayerStore::mark_contents_updated) once a
//! layer's contents have been uploaded. Layers whose contents are
//! [`Passthrough`](crate::content::ContentSource::Passthrough) are owned by
//! the renderer itself and never report a pending upload.

use crate::layer::{FrameChanges, LayerStore};

/// Composites an evaluated layer tree.
///
/// # Frame loop pseudocode
///
/// ```rust,ignore
/// fn on_frame(store: &mut LayerStore, renderer: &mut impl Renderer) {
///     // Let finished content loads land.
///     store.poll_loads();
///
///     // Animate: update layer properties.
///     store.set_position(layer, animated_position(now));
///
///     // Evaluate: drain dirty channels, recompute world properties.
///     let changes = store.evaluate();
///
///     // Render: composite in traversal order.
///     renderer.render(store, &changes);
/// }
/// ```
pub trait Renderer {
    /// Renders the tree, reading current property values from `store` and
    /// using `changes` to update any per-layer state it keeps.
    fn render(&mut self, store: &LayerStore, changes: &FrameChanges);
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use super::*;

    /// Records the visible layers in draw order.
    #[derive(Default)]
    struct ListRenderer {
        drawn: Vec<u32>,
        frames_seen: usize,
    }

    impl Renderer for ListRenderer {
        fn render(&mut self, store: &LayerStore, changes: &FrameChanges) {
            self.frames_seen += changes.frames.len();
            self.drawn = store
                .traversal_order()
                .iter()
                .copied()
                .filter(|&idx| !store.effective_hidden_at(idx))
                .collect();
        }
    }

    #[test]
    fn renderer_sees_visible_layers_back_to_front() {
        let mut store = LayerStore::new();
        let root = store.create_layer();
        let back = store.create_layer();
        let front = store.create_layer();
        let hidden = store.create_layer();
        store.set_frame(root, Rect::new(0.0, 0.0, 100.0, 100.0));
        store.add_sublayer(root, back);
        store.add_sublayer(root, front);
        store.add_sublayer(root, hidden);
        store.set_hidden(hidden, true);

        let mut renderer = ListRenderer::default();
        let changes = store.evaluate();
        renderer.render(&store, &changes);

        assert_eq!(renderer.drawn, vec![root.index(), back.index(), front.index()]);
        assert_eq!(renderer.frames_seen, 4);
    }
}
