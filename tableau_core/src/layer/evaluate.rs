// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame evaluation and change tracking.
//!
//! Evaluation follows a drain-recompute pattern for each dirty channel:
//!
//! 1. **FRAME**: drain dirty indices, recompute each layer's
//!    `world_transform` as `parent_world * model`, `effective_opacity` as
//!    `parent_effective * opacity`, and `effective_hidden` as
//!    `parent_effective_hidden || flags.hidden`.
//! 2. **CONTENTS** / **MASK**: drain dirty indices (no recomputation;
//!    renderers read the current values directly from the store).
//! 3. **TOPOLOGY**: drain and discard (the traversal order was already
//!    rebuilt at the start of evaluation if needed).
//!
//! [`FrameChanges`] uses raw slot indices (`u32`) rather than [`LayerId`]
//! handles so that renderers can index directly into the store via the
//! `*_at()` accessors (e.g.
//! [`world_transform_at`](super::LayerStore::world_transform_at)) without
//! paying for generation checks on every access.
//!
//! [`LayerId`]: super::LayerId

use super::id::INVALID;
use super::store::LayerStore;
use crate::dirty;
use crate::transform::Transform3d;

/// The set of changes produced by a single [`LayerStore::evaluate`] call.
///
/// Each field contains the raw slot indices of layers that changed in the
/// corresponding category.
#[derive(Clone, Debug, Default)]
pub struct FrameChanges {
    /// Layers whose world transform or effective opacity was recomputed.
    pub frames: Vec<u32>,
    /// Layers whose contents were replaced, redrawn, or loaded.
    pub contents: Vec<u32>,
    /// Layers whose mask or filters changed.
    pub masks: Vec<u32>,
    /// Layers that transitioned from visible to effectively hidden.
    pub hidden: Vec<u32>,
    /// Layers that transitioned from effectively hidden to visible.
    pub unhidden: Vec<u32>,
    /// Layers added since the last evaluate.
    pub added: Vec<u32>,
    /// Layers removed since the last evaluate.
    pub removed: Vec<u32>,
    /// Whether the tree topology changed (traversal order was rebuilt).
    pub topology_changed: bool,
}

impl FrameChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.contents.clear();
        self.masks.clear();
        self.hidden.clear();
        self.unhidden.clear();
        self.added.clear();
        self.removed.clear();
        self.topology_changed = false;
    }

    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
            && self.contents.is_empty()
            && self.masks.is_empty()
            && self.hidden.is_empty()
            && self.unhidden.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && !self.topology_changed
    }
}

impl LayerStore {
    /// Evaluates the layer tree, recomputing dirty properties and returning
    /// the set of changes.
    pub fn evaluate(&mut self) -> FrameChanges {
        let mut changes = FrameChanges::default();
        self.evaluate_into(&mut changes);
        changes
    }

    /// Like [`evaluate`](Self::evaluate), but reuses a caller-provided buffer.
    pub fn evaluate_into(&mut self, changes: &mut FrameChanges) {
        changes.clear();

        if self.traversal_dirty {
            self.rebuild_traversal_order();
            changes.topology_changed = true;
            self.traversal_dirty = false;
        }

        // Parents drain before their dependents.
        let dirty_frames: Vec<u32> = self
            .dirty
            .drain(dirty::FRAME)
            .affected()
            .deterministic()
            .run()
            .collect();
        for &idx in &dirty_frames {
            let i = idx as usize;
            let parent = self.parent[i];
            let (parent_world, parent_opacity, parent_hidden) = if parent != INVALID {
                let p = parent as usize;
                (
                    self.world_transform[p],
                    self.effective_opacity[p],
                    self.effective_hidden[p],
                )
            } else {
                (Transform3d::IDENTITY, 1.0, false)
            };

            let model = self.layout[i].model(&self.geometry[i]);
            self.world_transform[i] = parent_world * model;
            self.effective_opacity[i] = parent_opacity * self.appearance[i].opacity;

            let new_hidden = parent_hidden || self.flags[i].hidden;
            if new_hidden != self.effective_hidden[i] {
                if new_hidden {
                    changes.hidden.push(idx);
                } else {
                    changes.unhidden.push(idx);
                }
                self.effective_hidden[i] = new_hidden;
            }
        }
        changes.frames = dirty_frames;

        changes.contents = self
            .dirty
            .drain(dirty::CONTENTS)
            .deterministic()
            .run()
            .collect();

        changes.masks = self
            .dirty
            .drain(dirty::MASK)
            .deterministic()
            .run()
            .collect();

        let _: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();

        std::mem::swap(&mut self.pending_added, &mut changes.added);
        std::mem::swap(&mut self.pending_removed, &mut changes.removed);
    }

    /// Returns the back-to-front traversal order: depth-first pre-order from
    /// each root, sublayers in z-order.
    ///
    /// Only valid after [`evaluate`](Self::evaluate) has been called at least
    /// once.
    #[must_use]
    pub fn traversal_order(&self) -> &[u32] {
        &self.traversal_order
    }

    fn rebuild_traversal_order(&mut self) {
        let mut order = std::mem::take(&mut self.traversal_order);
        order.clear();
        for idx in 0..self.len {
            if self.parent[idx as usize] == INVALID && self.alive[idx as usize] {
                self.dfs_collect(idx, &mut order);
            }
        }
        self.traversal_order = order;
    }

    fn dfs_collect(&self, idx: u32, order: &mut Vec<u32>) {
        order.push(idx);
        for &sub in &self.sublayers[idx as usize] {
            self.dfs_collect(sub, order);
        }
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{Point, Rect, Size};

    use super::*;
    use crate::mask::Mask;

    const EPS: f64 = 1e-9;

    fn translation_of(t: Transform3d) -> Point {
        t.project_point(Point::ZERO)
    }

    fn assert_near(a: Point, b: Point) {
        assert!(
            (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn evaluate_computes_world_transforms() {
        let mut store = LayerStore::new();
        let parent = store.create_layer();
        let child = store.create_layer();
        store.set_frame(parent, Rect::new(10.0, 0.0, 110.0, 100.0));
        store.set_frame(child, Rect::new(0.0, 5.0, 20.0, 25.0));
        store.add_sublayer(parent, child);

        let _ = store.evaluate();

        assert_near(translation_of(store.world_transform(parent)), Point::new(10.0, 0.0));
        assert_near(translation_of(store.world_transform(child)), Point::new(10.0, 5.0));
    }

    #[test]
    fn evaluate_computes_effective_opacity() {
        let mut store = LayerStore::new();
        let grandparent = store.create_layer();
        let parent = store.create_layer();
        let child = store.create_layer();
        store.add_sublayer(grandparent, parent);
        store.add_sublayer(parent, child);

        store.set_opacity(grandparent, 0.5);
        store.set_opacity(parent, 0.8);
        store.set_opacity(child, 0.5);
        let _ = store.evaluate();

        let eps = 1e-6;
        assert!((store.effective_opacity(grandparent) - 0.5).abs() < eps);
        assert!((store.effective_opacity(parent) - 0.4).abs() < eps);
        assert!((store.effective_opacity(child) - 0.2).abs() < eps);
    }

    #[test]
    fn no_change_evaluate_returns_empty() {
        let mut store = LayerStore::new();
        let _root = store.create_layer();
        let _ = store.evaluate();

        let changes = store.evaluate();
        assert!(changes.is_empty());
    }

    #[test]
    fn traversal_order_is_depth_first_in_z_order() {
        let mut store = LayerStore::new();
        let a = store.create_layer();
        let b = store.create_layer();
        let c = store.create_layer();
        let d = store.create_layer();

        // Tree: a -> [c, b -> [d]] once b is raised above c.
        store.add_sublayer(a, b);
        store.add_sublayer(a, c);
        store.add_sublayer(b, d);
        store.set_z_index(b, 1);

        let _ = store.evaluate();
        assert_eq!(store.traversal_order(), &[a.idx, c.idx, b.idx, d.idx]);
    }

    #[test]
    fn evaluate_tracks_mask_and_contents_changes() {
        let mut store = LayerStore::new();
        let id = store.create_drawn_layer(Size::new(4.0, 4.0), None);
        let _ = store.evaluate();

        store.set_mask(id, Some(Mask::new(vec![255; 4], 2, 2)));
        store.draw_with(id, &mut |canvas: &mut crate::surface::Canvas<'_>| {
            canvas.fill_rect(Rect::new(0.0, 0.0, 2.0, 2.0), [255, 0, 0, 255]);
        });
        let changes = store.evaluate();
        assert_eq!(changes.masks, vec![id.idx]);
        assert_eq!(changes.contents, vec![id.idx]);
        assert!(changes.frames.is_empty());
    }

    #[test]
    fn evaluate_added_and_removed_lifecycle() {
        let mut store = LayerStore::new();
        let id = store.create_layer();

        let changes = store.evaluate();
        assert!(changes.added.contains(&id.idx));
        assert!(changes.removed.is_empty());

        let changes = store.evaluate();
        assert!(changes.added.is_empty());
        assert!(changes.removed.is_empty());

        store.destroy_layer(id);
        let changes = store.evaluate();
        assert!(changes.removed.contains(&id.idx));
        assert!(changes.topology_changed);
    }

    #[test]
    fn hidden_propagates_to_sublayers() {
        let mut store = LayerStore::new();
        let parent = store.create_layer();
        let child = store.create_layer();
        store.add_sublayer(parent, child);
        let _ = store.evaluate();

        store.set_hidden(parent, true);
        let changes = store.evaluate();
        assert!(store.effective_hidden(parent));
        assert!(store.effective_hidden(child));
        assert!(!store.hidden(child));
        assert!(changes.hidden.contains(&parent.idx));
        assert!(changes.hidden.contains(&child.idx));

        store.set_hidden(parent, false);
        let changes = store.evaluate();
        assert!(!store.effective_hidden(child));
        assert!(changes.unhidden.contains(&child.idx));
        assert!(changes.hidden.is_empty());
    }

    #[test]
    fn mutation_while_hidden_is_kept() {
        let mut store = LayerStore::new();
        let root = store.create_layer();
        store.set_hidden(root, true);
        let _ = store.evaluate();

        store.set_position(root, Point::new(42.0, 0.0));
        let _ = store.evaluate();
        store.set_hidden(root, false);
        let changes = store.evaluate();

        assert!(changes.unhidden.contains(&root.idx));
        assert_near(translation_of(store.world_transform(root)), Point::new(42.0, 0.0));
    }

    #[test]
    fn reparenting_recomputes_inherited_state_for_subtree() {
        let mut store = LayerStore::new();
        let old_parent = store.create_layer();
        let new_parent = store.create_layer();
        let child = store.create_layer();
        let grandchild = store.create_layer();
        store.add_sublayer(child, grandchild);
        store.add_sublayer(old_parent, child);

        store.set_position(old_parent, Point::new(10.0, 0.0));
        store.set_opacity(old_parent, 0.5);
        store.set_hidden(old_parent, true);
        store.set_position(new_parent, Point::new(25.0, 0.0));
        store.set_opacity(new_parent, 0.25);
        let _ = store.evaluate();
        assert!(store.effective_hidden(grandchild));

        store.add_sublayer(new_parent, child);
        let changes = store.evaluate();

        assert!(changes.frames.contains(&child.idx));
        assert!(changes.frames.contains(&grandchild.idx));
        assert!(changes.unhidden.contains(&grandchild.idx));
        assert_near(
            translation_of(store.world_transform(grandchild)),
            Point::new(25.0, 0.0),
        );
        assert!((store.effective_opacity(grandchild) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn removal_resets_inherited_state() {
        let mut store = LayerStore::new();
        let parent = store.create_layer();
        let child = store.create_layer();
        store.add_sublayer(parent, child);
        store.set_position(parent, Point::new(10.0, 0.0));
        store.set_opacity(parent, 0.5);
        let _ = store.evaluate();

        store.remove_from_superlayer(child);
        let changes = store.evaluate();
        assert!(changes.frames.contains(&child.idx));
        assert_eq!(store.world_transform(child), Transform3d::IDENTITY);
        assert!((store.effective_opacity(child) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn evaluate_into_reuses_buffer() {
        let mut store = LayerStore::new();
        let a = store.create_layer();
        let b = store.create_layer();

        let mut changes = FrameChanges::default();
        store.evaluate_into(&mut changes);
        assert_eq!(changes.added.len(), 2);

        store.set_opacity(a, 0.5);
        store.evaluate_into(&mut changes);
        assert!(changes.added.is_empty(), "added should be cleared");
        assert!(changes.frames.contains(&a.idx));
        assert!(!changes.frames.contains(&b.idx));
    }
}
