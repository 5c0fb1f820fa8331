// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays layer storage with allocation, topology, and property management.

use std::rc::Rc;

use kurbo::{Point, Rect, Size};
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::contents::PendingLoad;
use super::id::{INVALID, LayerId, parent_slot};
use super::layout::{Geometry, LayoutCache, centered_rect, clamp_unit};
use super::traverse::Sublayers;
use crate::config::StageConfig;
use crate::content::ContentSource;
use crate::dirty;
use crate::filter::{Filter, RoundRectMaskFilter};
use crate::mask::Mask;
use crate::observe::{ObserverRegistry, ObserverToken, Property};
use crate::telemetry::{Telemetry, TelemetrySink};
use crate::transform::Transform3d;

/// Per-layer boolean flags.
///
/// Setting [`hidden`](Self::hidden) suppresses all visual contribution of the
/// layer and its entire subtree. Properties can still be mutated while hidden.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LayerFlags {
    /// Whether the layer (and its subtree) is hidden.
    pub hidden: bool,
    /// Whether the contents are known to cover the frame without
    /// transparency, letting the renderer skip blending.
    pub opaque: bool,
}

/// Compositing inputs other than the contents themselves.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Appearance {
    pub(crate) content_center: Point,
    pub(crate) content_size: Size,
    pub(crate) opacity: f32,
    pub(crate) corner_radius: f64,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            content_center: Point::new(0.5, 0.5),
            content_size: Size::new(1.0, 1.0),
            opacity: 1.0,
            corner_radius: 0.0,
        }
    }
}

/// Input-handling settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Interaction {
    pub(crate) enabled: bool,
    pub(crate) enabled_when_hidden: bool,
    pub(crate) mask_threshold: u8,
}

/// Struct-of-arrays storage for all layers.
///
/// Layers are addressed by [`LayerId`] handles. Internally, each layer occupies
/// a slot in parallel arrays. Destroyed layers are recycled via a free list,
/// and generation counters prevent stale handle access.
#[derive(Debug)]
pub struct LayerStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) sublayers: Vec<Vec<u32>>,
    pub(crate) z_index: Vec<i32>,

    // -- Geometry (set by callers) and derived layout --
    pub(crate) geometry: Vec<Geometry>,
    pub(crate) layout: Vec<LayoutCache>,

    // -- Appearance --
    pub(crate) appearance: Vec<Appearance>,
    pub(crate) flags: Vec<LayerFlags>,
    pub(crate) filters: Vec<Vec<Rc<dyn Filter>>>,
    pub(crate) corner_radius_filter: Vec<Option<Rc<RoundRectMaskFilter>>>,

    // -- Content --
    pub(crate) content: Vec<ContentSource>,
    pub(crate) contents_need_update: Vec<bool>,
    pub(crate) contents_src: Vec<Option<String>>,
    pub(crate) mask: Vec<Option<Mask>>,
    pub(crate) mask_needs_update: Vec<bool>,

    // -- Interaction --
    pub(crate) interaction: Vec<Interaction>,

    // -- Computed properties (written by evaluate) --
    pub(crate) world_transform: Vec<Transform3d>,
    pub(crate) effective_opacity: Vec<f32>,
    pub(crate) effective_hidden: Vec<bool>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    /// `false` while a slot sits on the free list.
    pub(crate) alive: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Traversal cache --
    pub(crate) traversal_order: Vec<u32>,
    pub(crate) traversal_dirty: bool,

    // -- Lifecycle tracking --
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<u32>,

    // -- Collaborators --
    pub(crate) observers: ObserverRegistry,
    pub(crate) loads: Vec<PendingLoad>,
    pub(crate) autoplay_retries: Vec<LayerId>,
    pub(crate) telemetry: Telemetry,
    pub(crate) config: StageConfig,
}

impl Default for LayerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerStore {
    /// Creates an empty layer store with the default [`StageConfig`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StageConfig::default())
    }

    /// Creates an empty layer store with the given configuration.
    #[must_use]
    pub fn with_config(config: StageConfig) -> Self {
        Self {
            parent: Vec::new(),
            sublayers: Vec::new(),
            z_index: Vec::new(),
            geometry: Vec::new(),
            layout: Vec::new(),
            appearance: Vec::new(),
            flags: Vec::new(),
            filters: Vec::new(),
            corner_radius_filter: Vec::new(),
            content: Vec::new(),
            contents_need_update: Vec::new(),
            contents_src: Vec::new(),
            mask: Vec::new(),
            mask_needs_update: Vec::new(),
            interaction: Vec::new(),
            world_transform: Vec::new(),
            effective_opacity: Vec::new(),
            effective_hidden: Vec::new(),
            generation: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            traversal_order: Vec::new(),
            traversal_dirty: true,
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
            observers: ObserverRegistry::new(),
            loads: Vec::new(),
            autoplay_retries: Vec::new(),
            telemetry: Telemetry::none(),
            config,
        }
    }

    /// The configuration this store was created with.
    #[must_use]
    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    /// Installs the sink that receives content telemetry.
    pub fn set_telemetry_sink(&mut self, sink: Box<dyn TelemetrySink>) {
        self.telemetry = Telemetry::new(sink);
    }

    // -- Allocation API --

    /// Creates a new layer and returns its handle.
    ///
    /// The layer starts empty: zero size at the origin, centered anchor point,
    /// identity transform, full opacity, no contents, no sublayers, no parent,
    /// and user interaction disabled.
    pub fn create_layer(&mut self) -> LayerId {
        let interaction = Interaction {
            mask_threshold: self.config.default_hit_test_mask_threshold,
            ..Interaction::default()
        };
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.sublayers[i].clear();
            self.z_index[i] = 0;
            self.geometry[i] = Geometry::default();
            self.layout[i] = LayoutCache::new();
            self.appearance[i] = Appearance::default();
            self.flags[i] = LayerFlags::default();
            self.filters[i].clear();
            self.corner_radius_filter[i] = None;
            self.content[i] = ContentSource::Empty;
            self.contents_need_update[i] = false;
            self.contents_src[i] = None;
            self.mask[i] = None;
            self.mask_needs_update[i] = false;
            self.interaction[i] = interaction;
            self.world_transform[i] = Transform3d::IDENTITY;
            self.effective_opacity[i] = 1.0;
            self.effective_hidden[i] = false;
            self.alive[i] = true;
            idx
        } else {
            // Allocate a new slot.
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.sublayers.push(Vec::new());
            self.z_index.push(0);
            self.geometry.push(Geometry::default());
            self.layout.push(LayoutCache::new());
            self.appearance.push(Appearance::default());
            self.flags.push(LayerFlags::default());
            self.filters.push(Vec::new());
            self.corner_radius_filter.push(None);
            self.content.push(ContentSource::Empty);
            self.contents_need_update.push(false);
            self.contents_src.push(None);
            self.mask.push(None);
            self.mask_needs_update.push(false);
            self.interaction.push(interaction);
            self.world_transform.push(Transform3d::IDENTITY);
            self.effective_opacity.push(1.0);
            self.effective_hidden.push(false);
            self.generation.push(0);
            self.alive.push(true);
            idx
        };

        self.traversal_dirty = true;
        self.pending_added.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);
        self.dirty.mark(idx, dirty::FRAME);

        self.id_at(idx)
    }

    /// Destroys a layer, freeing its slot for reuse.
    ///
    /// The layer is detached from its superlayer, its contents are released,
    /// its pending load is cancelled, and its observers are dropped.
    ///
    /// # Panics
    ///
    /// Panics if the layer has sublayers (remove them first) or if the handle
    /// is stale.
    pub fn destroy_layer(&mut self, id: LayerId) {
        self.validate(id);
        let idx = id.idx;
        let i = idx as usize;
        assert!(
            self.sublayers[i].is_empty(),
            "cannot destroy layer with sublayers"
        );

        if self.parent[i] != INVALID {
            self.detach(idx);
        }

        self.cancel_load(idx);
        self.autoplay_retries.retain(|&r| r != id);
        self.content[i].release();
        self.content[i] = ContentSource::Empty;
        self.mask[i] = None;
        self.filters[i].clear();
        self.corner_radius_filter[i] = None;
        self.observers.remove_layer(id);

        // Remove dirty tracking dependencies.
        self.dirty.remove_key(idx);

        // Bump generation so old handles immediately fail validation.
        self.generation[i] += 1;

        self.alive[i] = false;
        self.free_list.push(idx);
        self.traversal_dirty = true;
        self.pending_removed.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);
    }

    /// Returns whether the given handle refers to a live layer.
    #[must_use]
    pub fn is_alive(&self, id: LayerId) -> bool {
        (id.idx < self.len)
            && self.alive[id.idx as usize]
            && self.generation[id.idx as usize] == id.generation
    }

    /// Returns the number of live layers.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    // -- Topology API --

    /// Appends `child` to the sublayers of `parent`, then re-sorts by z-index.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, or if `parent` is `child` or one of
    /// its descendants.
    pub fn add_sublayer(&mut self, parent: LayerId, child: LayerId) {
        self.validate(parent);
        let end = self.sublayers[parent.idx as usize].len();
        self.insert_sublayer_at(parent, child, end);
    }

    /// Inserts `child` into the sublayers of `parent` at `index`.
    ///
    /// A layer parented elsewhere is detached from its old superlayer first.
    /// If `child` is already a sublayer of `parent`, the stale entry is removed
    /// before inserting at `index` (clamped to the list length). The list is
    /// then stably re-sorted by z-index, so layers with equal z-index keep the
    /// order they have right after the insertion.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, or if `parent` is `child` or one of
    /// its descendants.
    pub fn insert_sublayer_at(&mut self, parent: LayerId, child: LayerId, index: usize) {
        self.validate(parent);
        self.validate(child);
        assert!(
            !self.is_ancestor_of(child, parent),
            "cannot insert a layer into its own subtree"
        );
        let p = parent.idx;
        let c = child.idx;

        let old_parent = self.parent[c as usize];
        if old_parent != INVALID && old_parent != p {
            self.detach(c);
        }

        let list = &mut self.sublayers[p as usize];
        if let Some(pos) = list.iter().position(|&s| s == c) {
            list.remove(pos);
        }
        let index = index.min(list.len());
        list.insert(index, c);
        self.parent[c as usize] = p;
        self.sort_sublayers(p);

        if old_parent != p {
            // Child depends on parent for world transform and hidden state.
            let _ = self.dirty.add_dependency(c, p, dirty::FRAME);
        }
        self.dirty.mark_with(c, dirty::FRAME, &EagerPolicy);
        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
        self.observers.notify(parent, Property::Sublayers);
    }

    /// Inserts `child` into `parent` directly before `sibling`.
    ///
    /// If `sibling` is not a sublayer of `parent`, `child` is appended.
    ///
    /// # Panics
    ///
    /// Panics if any handle is stale, or if `parent` is `child` or one of its
    /// descendants.
    pub fn insert_sublayer_before(&mut self, parent: LayerId, child: LayerId, sibling: LayerId) {
        self.validate(parent);
        self.validate(child);
        self.validate(sibling);
        let list = &mut self.sublayers[parent.idx as usize];
        if child != sibling
            && let Some(pos) = list.iter().position(|&s| s == child.idx)
        {
            list.remove(pos);
        }
        let target = list
            .iter()
            .position(|&s| s == sibling.idx)
            .unwrap_or(list.len());
        self.insert_sublayer_at(parent, child, target);
    }

    /// Removes `child` from the sublayers of `parent`.
    ///
    /// Does nothing if `child` is not a sublayer of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn remove_sublayer(&mut self, parent: LayerId, child: LayerId) {
        self.validate(parent);
        self.validate(child);
        if self.parent[child.idx as usize] == parent.idx {
            self.detach(child.idx);
        }
    }

    /// Removes `child` from its superlayer, if it has one.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn remove_from_superlayer(&mut self, child: LayerId) {
        self.validate(child);
        if self.parent[child.idx as usize] != INVALID {
            self.detach(child.idx);
        }
    }

    /// Returns the superlayer of a layer, if any.
    #[must_use]
    pub fn superlayer(&self, id: LayerId) -> Option<LayerId> {
        self.validate(id);
        parent_slot(self.parent[id.idx as usize]).map(|p| self.id_at(p))
    }

    /// Returns an iterator over the sublayers of a layer, back to front.
    #[must_use]
    pub fn sublayers(&self, id: LayerId) -> Sublayers<'_> {
        self.validate(id);
        Sublayers::new(self, &self.sublayers[id.idx as usize])
    }

    /// Returns the topmost ancestor of a layer (the layer itself if it has no
    /// superlayer).
    #[must_use]
    pub fn root_layer(&self, id: LayerId) -> LayerId {
        self.validate(id);
        let mut idx = id.idx;
        while let Some(p) = parent_slot(self.parent[idx as usize]) {
            idx = p;
        }
        self.id_at(idx)
    }

    /// Returns `true` if `ancestor` is `layer` or one of its ancestors.
    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: LayerId, layer: LayerId) -> bool {
        self.validate(ancestor);
        self.validate(layer);
        let mut idx = layer.idx;
        loop {
            if idx == ancestor.idx {
                return true;
            }
            idx = self.parent[idx as usize];
            if idx == INVALID {
                return false;
            }
        }
    }

    /// Returns the root layers (those with no superlayer).
    #[must_use]
    pub fn roots(&self) -> Vec<LayerId> {
        (0..self.len)
            .filter(|&idx| self.parent[idx as usize] == INVALID && self.alive[idx as usize])
            .map(|idx| self.id_at(idx))
            .collect()
    }

    // -- Geometry --

    /// Returns the geometry of a layer.
    #[must_use]
    pub fn geometry(&self, id: LayerId) -> Geometry {
        self.validate(id);
        self.geometry[id.idx as usize]
    }

    /// Returns the center of the layer's frame.
    #[must_use]
    pub fn position(&self, id: LayerId) -> Point {
        self.geometry(id).position
    }

    /// Moves the layer so its frame is centered on `position`.
    ///
    /// Assigning the current position is a no-op.
    pub fn set_position(&mut self, id: LayerId, position: Point) {
        self.validate(id);
        if self.geometry[id.idx as usize].position == position {
            return;
        }
        self.geometry[id.idx as usize].position = position;
        self.geometry_changed(id.idx);
        self.observers.notify(id, Property::Frame);
    }

    /// Returns the frame size.
    #[must_use]
    pub fn size(&self, id: LayerId) -> Size {
        self.geometry(id).size
    }

    /// Sets the frame size, keeping the position.
    ///
    /// Drawn-surface layers resize their surface when the ceiled pixel
    /// dimensions change.
    pub fn set_size(&mut self, id: LayerId, size: Size) {
        self.validate(id);
        self.apply_size(id.idx, size);
        self.observers.notify(id, Property::Frame);
    }

    /// Returns the frame: a rect of [`size`](Self::size) centered on
    /// [`position`](Self::position).
    #[must_use]
    pub fn frame(&self, id: LayerId) -> Rect {
        self.geometry(id).frame()
    }

    /// Sets size and position from `frame`. `None` means the zero rect.
    pub fn set_frame(&mut self, id: LayerId, frame: impl Into<Option<Rect>>) {
        self.validate(id);
        let frame = frame.into().unwrap_or(Rect::ZERO);
        self.apply_size(id.idx, frame.size());
        self.geometry[id.idx as usize].position = frame.center();
        self.geometry_changed(id.idx);
        self.observers.notify(id, Property::Frame);
    }

    /// Returns the anchor point.
    #[must_use]
    pub fn anchor_point(&self, id: LayerId) -> Point {
        self.geometry(id).anchor_point
    }

    /// Sets the anchor point, clamped to `[0, 1]²`. `None` means `(0, 0)`.
    pub fn set_anchor_point(&mut self, id: LayerId, anchor: impl Into<Option<Point>>) {
        self.validate(id);
        let anchor = anchor.into().unwrap_or(Point::ZERO);
        let clamped = Point::new(clamp_unit(anchor.x), clamp_unit(anchor.y));
        if self.geometry[id.idx as usize].anchor_point == clamped {
            return;
        }
        self.geometry[id.idx as usize].anchor_point = clamped;
        self.geometry_changed(id.idx);
    }

    /// Returns the layer transform.
    #[must_use]
    pub fn transform(&self, id: LayerId) -> Transform3d {
        self.geometry(id).transform
    }

    /// Sets the transform applied around the anchor point.
    pub fn set_transform(&mut self, id: LayerId, transform: Transform3d) {
        self.validate(id);
        self.geometry[id.idx as usize].transform = transform;
        self.geometry_changed(id.idx);
    }

    /// Returns the z-index.
    #[must_use]
    pub fn z_index(&self, id: LayerId) -> i32 {
        self.validate(id);
        self.z_index[id.idx as usize]
    }

    /// Sets the z-index and re-sorts the superlayer's sublayers.
    pub fn set_z_index(&mut self, id: LayerId, z_index: i32) {
        self.validate(id);
        self.z_index[id.idx as usize] = z_index;
        let p = self.parent[id.idx as usize];
        if p != INVALID {
            self.sort_sublayers(p);
            self.traversal_dirty = true;
            self.dirty.mark(p, dirty::TOPOLOGY);
            let parent = self.id_at(p);
            self.observers.notify(parent, Property::Sublayers);
        }
    }

    /// The model matrix: local frame space to superlayer space.
    #[must_use]
    pub fn model(&self, id: LayerId) -> Transform3d {
        self.validate(id);
        let i = id.idx as usize;
        self.layout[i].model(&self.geometry[i])
    }

    /// The inverse of [`model`](Self::model), or `None` if it is singular.
    #[must_use]
    pub fn inverted_model(&self, id: LayerId) -> Option<Transform3d> {
        self.validate(id);
        let i = id.idx as usize;
        self.layout[i].inverted_model(&self.geometry[i])
    }

    /// Axis-aligned bounds of the transformed frame in superlayer space.
    #[must_use]
    pub fn bounding_box(&self, id: LayerId) -> Rect {
        self.validate(id);
        let i = id.idx as usize;
        self.layout[i].bounding_box(&self.geometry[i])
    }

    /// Local vertex positions (two triangles) of the frame.
    #[must_use]
    pub fn positions(&self, id: LayerId) -> [f32; 12] {
        self.validate(id);
        let i = id.idx as usize;
        self.layout[i].positions(&self.geometry[i])
    }

    /// The derived-state cache of a layer.
    #[must_use]
    pub fn layout_cache(&self, id: LayerId) -> &LayoutCache {
        self.validate(id);
        &self.layout[id.idx as usize]
    }

    // -- Content rect --

    /// Center of the content rect in normalized content space.
    #[must_use]
    pub fn content_center(&self, id: LayerId) -> Point {
        self.validate(id);
        self.appearance[id.idx as usize].content_center
    }

    /// Sets the center of the content rect.
    pub fn set_content_center(&mut self, id: LayerId, center: Point) {
        self.validate(id);
        self.appearance[id.idx as usize].content_center = center;
        self.content_rect_changed(id.idx);
    }

    /// Size of the content rect; negative extents mirror.
    #[must_use]
    pub fn content_size(&self, id: LayerId) -> Size {
        self.validate(id);
        self.appearance[id.idx as usize].content_size
    }

    /// Sets the size of the content rect.
    pub fn set_content_size(&mut self, id: LayerId, size: Size) {
        self.validate(id);
        self.appearance[id.idx as usize].content_size = size;
        self.content_rect_changed(id.idx);
    }

    /// The normalized crop window into the contents. Defaults to the unit
    /// rect; width or height may be negative to express mirroring.
    #[must_use]
    pub fn content_rect(&self, id: LayerId) -> Rect {
        self.validate(id);
        let a = &self.appearance[id.idx as usize];
        centered_rect(a.content_center, a.content_size)
    }

    /// Sets the content rect. `None` means the zero rect.
    pub fn set_content_rect(&mut self, id: LayerId, rect: impl Into<Option<Rect>>) {
        self.validate(id);
        let rect = rect.into().unwrap_or(Rect::ZERO);
        let a = &mut self.appearance[id.idx as usize];
        a.content_size = Size::new(rect.width(), rect.height());
        a.content_center = Point::new(
            rect.x0 + rect.width() / 2.0,
            rect.y0 + rect.height() / 2.0,
        );
        self.content_rect_changed(id.idx);
    }

    /// Texture coordinates of the content rect (two triangles).
    #[must_use]
    pub fn content_coordinates(&self, id: LayerId) -> [f32; 12] {
        let rect = self.content_rect(id);
        self.layout[id.idx as usize].content_coordinates(rect)
    }

    // -- Appearance --

    /// Returns the layer opacity.
    #[must_use]
    pub fn opacity(&self, id: LayerId) -> f32 {
        self.validate(id);
        self.appearance[id.idx as usize].opacity
    }

    /// Sets the layer opacity.
    pub fn set_opacity(&mut self, id: LayerId, opacity: f32) {
        self.validate(id);
        self.appearance[id.idx as usize].opacity = opacity;
        self.dirty.mark_with(id.idx, dirty::FRAME, &EagerPolicy);
    }

    /// Returns the layer's own hidden flag.
    #[must_use]
    pub fn hidden(&self, id: LayerId) -> bool {
        self.validate(id);
        self.flags[id.idx as usize].hidden
    }

    /// Hides or shows the layer and its subtree.
    ///
    /// Observers are only notified on an actual change.
    pub fn set_hidden(&mut self, id: LayerId, hidden: bool) {
        self.validate(id);
        let flags = &mut self.flags[id.idx as usize];
        if flags.hidden == hidden {
            return;
        }
        flags.hidden = hidden;
        self.dirty.mark_with(id.idx, dirty::FRAME, &EagerPolicy);
        self.observers.notify(id, Property::Hidden);
    }

    /// Returns whether the contents are marked opaque.
    #[must_use]
    pub fn opaque(&self, id: LayerId) -> bool {
        self.validate(id);
        self.flags[id.idx as usize].opaque
    }

    /// Marks the contents as fully opaque (or not).
    pub fn set_opaque(&mut self, id: LayerId, opaque: bool) {
        self.validate(id);
        self.flags[id.idx as usize].opaque = opaque;
        self.dirty.mark(id.idx, dirty::CONTENTS);
    }

    /// Returns the flags of a layer.
    #[must_use]
    pub fn flags(&self, id: LayerId) -> LayerFlags {
        self.validate(id);
        self.flags[id.idx as usize]
    }

    /// Returns the corner radius as a fraction of half the smaller side.
    #[must_use]
    pub fn corner_radius(&self, id: LayerId) -> f64 {
        self.validate(id);
        self.appearance[id.idx as usize].corner_radius
    }

    /// Sets the corner radius, clamped to `[0, 1]`.
    ///
    /// A nonzero radius installs a [`RoundRectMaskFilter`] at the end of the
    /// filter list; returning to zero removes it.
    pub fn set_corner_radius(&mut self, id: LayerId, corner_radius: f64) {
        self.validate(id);
        let i = id.idx as usize;
        let corner_radius = clamp_unit(corner_radius);
        if self.appearance[i].corner_radius == corner_radius {
            return;
        }
        self.appearance[i].corner_radius = corner_radius;

        if corner_radius == 0.0 {
            if let Some(filter) = self.corner_radius_filter[i].take() {
                let filter: Rc<dyn Filter> = filter;
                self.remove_filter(id, &filter);
            }
        } else if let Some(filter) = &self.corner_radius_filter[i] {
            filter.set_corner_radius(corner_radius);
            self.dirty.mark(id.idx, dirty::MASK);
        } else {
            let filter = Rc::new(RoundRectMaskFilter::new(corner_radius));
            self.corner_radius_filter[i] = Some(filter.clone());
            self.add_filter(id, filter);
        }
    }

    // -- Interaction --

    /// Returns whether the layer takes part in hit testing.
    #[must_use]
    pub fn user_interaction_enabled(&self, id: LayerId) -> bool {
        self.validate(id);
        self.interaction[id.idx as usize].enabled
    }

    /// Enables or disables hit testing for the layer and its subtree.
    pub fn set_user_interaction_enabled(&mut self, id: LayerId, enabled: bool) {
        self.validate(id);
        self.interaction[id.idx as usize].enabled = enabled;
    }

    /// Returns whether a hidden layer still takes part in hit testing.
    #[must_use]
    pub fn user_interaction_enabled_when_hidden(&self, id: LayerId) -> bool {
        self.validate(id);
        self.interaction[id.idx as usize].enabled_when_hidden
    }

    /// Lets a hidden layer keep receiving hits.
    pub fn set_user_interaction_enabled_when_hidden(&mut self, id: LayerId, enabled: bool) {
        self.validate(id);
        self.interaction[id.idx as usize].enabled_when_hidden = enabled;
    }

    /// Returns the fallback alpha threshold for mask hit testing.
    #[must_use]
    pub fn hit_test_mask_threshold(&self, id: LayerId) -> u8 {
        self.validate(id);
        self.interaction[id.idx as usize].mask_threshold
    }

    /// Sets the fallback alpha threshold for mask hit testing.
    pub fn set_hit_test_mask_threshold(&mut self, id: LayerId, threshold: u8) {
        self.validate(id);
        self.interaction[id.idx as usize].mask_threshold = threshold;
    }

    // -- Computed properties --

    /// Returns the computed world transform of a layer.
    ///
    /// Only valid after [`evaluate`](Self::evaluate) has been called.
    #[must_use]
    pub fn world_transform(&self, id: LayerId) -> Transform3d {
        self.validate(id);
        self.world_transform[id.idx as usize]
    }

    /// Returns the product of the opacities of the layer and its ancestors.
    ///
    /// Only valid after [`evaluate`](Self::evaluate) has been called.
    #[must_use]
    pub fn effective_opacity(&self, id: LayerId) -> f32 {
        self.validate(id);
        self.effective_opacity[id.idx as usize]
    }

    /// Returns whether the layer is effectively hidden (including by an
    /// ancestor's hidden flag).
    ///
    /// Only valid after [`evaluate`](Self::evaluate) has been called.
    #[must_use]
    pub fn effective_hidden(&self, id: LayerId) -> bool {
        self.validate(id);
        self.effective_hidden[id.idx as usize]
    }

    // -- Raw-index accessors for renderers --
    //
    // These accept raw slot indices (as found in `FrameChanges`) rather than
    // `LayerId` handles, skipping generation validation. Only use with indices
    // that came from `FrameChanges` or `traversal_order()`.

    /// Returns the handle currently occupying raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn id_at(&self, idx: u32) -> LayerId {
        self.check_slot(idx);
        LayerId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Returns the computed world transform at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn world_transform_at(&self, idx: u32) -> Transform3d {
        self.check_slot(idx);
        self.world_transform[idx as usize]
    }

    /// Returns the computed effective opacity at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn effective_opacity_at(&self, idx: u32) -> f32 {
        self.check_slot(idx);
        self.effective_opacity[idx as usize]
    }

    /// Returns whether the layer at raw slot `idx` is effectively hidden.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn effective_hidden_at(&self, idx: u32) -> bool {
        self.check_slot(idx);
        self.effective_hidden[idx as usize]
    }

    /// Returns the contents at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn contents_at(&self, idx: u32) -> &ContentSource {
        self.check_slot(idx);
        &self.content[idx as usize]
    }

    /// Returns the mask at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn mask_at(&self, idx: u32) -> Option<&Mask> {
        self.check_slot(idx);
        self.mask[idx as usize].as_ref()
    }

    // -- Notifications --

    /// Registers `callback` for changes of `property` on `id`.
    ///
    /// Callbacks run synchronously after the mutation has been applied.
    pub fn observe(
        &mut self,
        id: LayerId,
        property: Property,
        callback: impl FnMut(LayerId, Property) + 'static,
    ) -> ObserverToken {
        self.validate(id);
        self.observers.subscribe(id, property, callback)
    }

    /// Removes an observer. Returns `false` if the token was unknown.
    pub fn unobserve(&mut self, token: ObserverToken) -> bool {
        self.observers.unsubscribe(token)
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: LayerId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale LayerId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    fn check_slot(&self, idx: u32) {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
    }

    /// Removes `idx` from its superlayer, updating dirty state and notifying.
    fn detach(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        self.sublayers[p as usize].retain(|&s| s != idx);
        self.parent[idx as usize] = INVALID;

        self.dirty.remove_dependency(idx, p, dirty::FRAME);
        self.dirty.mark_with(idx, dirty::FRAME, &EagerPolicy);
        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
        let parent = self.id_at(p);
        self.observers.notify(parent, Property::Sublayers);
    }

    /// Stable sort by z-index; ties keep their current relative order.
    fn sort_sublayers(&mut self, p: u32) {
        let z_index = &self.z_index;
        self.sublayers[p as usize].sort_by_key(|&s| z_index[s as usize]);
    }

    fn apply_size(&mut self, idx: u32, size: Size) {
        let i = idx as usize;
        self.geometry[i].size = size;
        if let Some(surface) = self.content[i].as_surface_mut()
            && surface.resize(size)
        {
            self.contents_need_update[i] = true;
            self.dirty.mark(idx, dirty::CONTENTS);
        }
        self.geometry_changed(idx);
    }

    fn geometry_changed(&mut self, idx: u32) {
        self.layout[idx as usize].invalidate_layout();
        self.dirty.mark_with(idx, dirty::FRAME, &EagerPolicy);
    }

    fn content_rect_changed(&mut self, idx: u32) {
        self.layout[idx as usize].invalidate_content();
        self.dirty.mark(idx, dirty::CONTENTS);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[test]
    fn create_and_destroy() {
        let mut store = LayerStore::new();
        let id = store.create_layer();
        assert!(store.is_alive(id));
        assert_eq!(store.layer_count(), 1);
        store.destroy_layer(id);
        assert!(!store.is_alive(id));
        assert_eq!(store.layer_count(), 0);
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut store = LayerStore::new();
        let id1 = store.create_layer();
        store.destroy_layer(id1);
        let id2 = store.create_layer();
        // id2 reuses the same slot but has a different generation.
        assert!(!store.is_alive(id1));
        assert!(store.is_alive(id2));
        assert_eq!(id1.idx, id2.idx);
        assert_ne!(id1.generation, id2.generation);
    }

    #[test]
    fn roots_skip_freed_slots() {
        let mut store = LayerStore::new();
        let a = store.create_layer();
        let b = store.create_layer();
        let c = store.create_layer();
        store.add_sublayer(a, c);
        store.destroy_layer(b);
        assert_eq!(store.roots(), vec![a]);

        let d = store.create_layer();
        assert_eq!(d.idx, b.idx);
        assert!(store.is_alive(d));
        assert!(!store.is_alive(b));
        assert_eq!(store.roots(), vec![a, d]);
    }

    #[test]
    fn new_layer_defaults() {
        let mut store = LayerStore::new();
        let id = store.create_layer();
        assert_eq!(store.size(id), Size::ZERO);
        assert_eq!(store.anchor_point(id), Point::new(0.5, 0.5));
        assert_eq!(store.content_rect(id), Rect::new(0.0, 0.0, 1.0, 1.0));
        assert!(!store.user_interaction_enabled(id));
        assert!(store.contents(id).is_empty());
        assert!(store.sublayers(id).next().is_none());
    }

    #[test]
    fn add_sublayer_and_query() {
        let mut store = LayerStore::new();
        let parent = store.create_layer();
        let a = store.create_layer();
        let b = store.create_layer();

        store.add_sublayer(parent, a);
        store.add_sublayer(parent, b);

        assert_eq!(store.superlayer(a), Some(parent));
        let kids: Vec<_> = store.sublayers(parent).collect();
        assert_eq!(kids, vec![a, b]);
    }

    #[test]
    fn inserting_elsewhere_detaches_from_old_parent() {
        let mut store = LayerStore::new();
        let p1 = store.create_layer();
        let p2 = store.create_layer();
        let child = store.create_layer();

        store.add_sublayer(p1, child);
        store.add_sublayer(p2, child);
        assert_eq!(store.superlayer(child), Some(p2));
        assert!(store.sublayers(p1).next().is_none());
    }

    #[test]
    fn reinserting_moves_instead_of_duplicating() {
        let mut store = LayerStore::new();
        let parent = store.create_layer();
        let a = store.create_layer();
        let b = store.create_layer();
        let c = store.create_layer();
        for l in [a, b, c] {
            store.add_sublayer(parent, l);
        }

        store.insert_sublayer_at(parent, c, 0);
        let kids: Vec<_> = store.sublayers(parent).collect();
        assert_eq!(kids, vec![c, a, b]);
    }

    #[test]
    fn insert_before_sibling() {
        let mut store = LayerStore::new();
        let parent = store.create_layer();
        let a = store.create_layer();
        let b = store.create_layer();
        let c = store.create_layer();
        let stray = store.create_layer();

        store.add_sublayer(parent, a);
        store.add_sublayer(parent, c);
        store.insert_sublayer_before(parent, b, c);
        assert_eq!(store.sublayers(parent).collect::<Vec<_>>(), vec![a, b, c]);

        // Moving an existing sublayer lands directly before the sibling.
        store.insert_sublayer_before(parent, a, c);
        assert_eq!(store.sublayers(parent).collect::<Vec<_>>(), vec![b, a, c]);

        // Unknown sibling appends.
        let d = store.create_layer();
        store.insert_sublayer_before(parent, d, stray);
        assert_eq!(store.sublayers(parent).last(), Some(d));
    }

    #[test]
    fn z_index_orders_sublayers_stably() {
        let mut store = LayerStore::new();
        let parent = store.create_layer();
        let top = store.create_layer();
        let a = store.create_layer();
        let b = store.create_layer();

        store.set_z_index(top, 5);
        store.add_sublayer(parent, top);
        store.add_sublayer(parent, a);
        store.add_sublayer(parent, b);
        assert_eq!(store.sublayers(parent).collect::<Vec<_>>(), vec![a, b, top]);

        // Ties keep the order they had when the sort was triggered.
        store.set_z_index(b, 5);
        assert_eq!(store.sublayers(parent).collect::<Vec<_>>(), vec![a, b, top]);
        // Re-inserting moves a layer behind its ties.
        store.add_sublayer(parent, b);
        assert_eq!(store.sublayers(parent).collect::<Vec<_>>(), vec![a, top, b]);
        store.set_z_index(top, -1);
        assert_eq!(store.sublayers(parent).collect::<Vec<_>>(), vec![top, a, b]);
    }

    #[test]
    fn remove_sublayer_ignores_non_children() {
        let mut store = LayerStore::new();
        let p1 = store.create_layer();
        let p2 = store.create_layer();
        let child = store.create_layer();
        store.add_sublayer(p1, child);

        store.remove_sublayer(p2, child);
        assert_eq!(store.superlayer(child), Some(p1));

        store.remove_from_superlayer(child);
        assert_eq!(store.superlayer(child), None);
        assert!(store.sublayers(p1).next().is_none());
    }

    #[test]
    fn ancestry_queries() {
        let mut store = LayerStore::new();
        let root = store.create_layer();
        let mid = store.create_layer();
        let leaf = store.create_layer();
        store.add_sublayer(root, mid);
        store.add_sublayer(mid, leaf);

        assert_eq!(store.root_layer(leaf), root);
        assert!(store.is_ancestor_of(root, leaf));
        assert!(store.is_ancestor_of(leaf, leaf));
        assert!(!store.is_ancestor_of(leaf, root));
        assert_eq!(store.roots(), vec![root]);
    }

    #[test]
    #[should_panic(expected = "cannot insert a layer into its own subtree")]
    fn cycles_are_rejected() {
        let mut store = LayerStore::new();
        let root = store.create_layer();
        let child = store.create_layer();
        store.add_sublayer(root, child);
        store.add_sublayer(child, root);
    }

    #[test]
    #[should_panic(expected = "cannot destroy layer with sublayers")]
    fn destroy_with_sublayers_panics() {
        let mut store = LayerStore::new();
        let parent = store.create_layer();
        let child = store.create_layer();
        store.add_sublayer(parent, child);
        store.destroy_layer(parent);
    }

    #[test]
    #[should_panic(expected = "stale LayerId")]
    fn destroyed_handle_panics_on_set_transform() {
        let mut store = LayerStore::new();
        let id = store.create_layer();
        store.destroy_layer(id);
        store.set_transform(id, Transform3d::IDENTITY);
    }

    #[test]
    #[should_panic(expected = "stale LayerId")]
    fn destroyed_handle_panics_on_superlayer() {
        let mut store = LayerStore::new();
        let id = store.create_layer();
        store.destroy_layer(id);
        let _ = store.superlayer(id);
    }

    #[test]
    fn anchor_point_is_clamped() {
        let mut store = LayerStore::new();
        let id = store.create_layer();
        store.set_anchor_point(id, Point::new(-2.0, 3.0));
        assert_eq!(store.anchor_point(id), Point::new(0.0, 1.0));
        store.set_anchor_point(id, None);
        assert_eq!(store.anchor_point(id), Point::ZERO);
    }

    #[test]
    fn frame_round_trips_through_position_and_size() {
        let mut store = LayerStore::new();
        let id = store.create_layer();
        store.set_frame(id, Rect::new(10.0, 20.0, 110.0, 70.0));
        assert_eq!(store.position(id), Point::new(60.0, 45.0));
        assert_eq!(store.size(id), Size::new(100.0, 50.0));
        assert_eq!(store.frame(id), Rect::new(10.0, 20.0, 110.0, 70.0));
        store.set_frame(id, None);
        assert_eq!(store.frame(id), Rect::ZERO);
    }

    #[test]
    fn content_rect_round_trips_and_mirrors() {
        let mut store = LayerStore::new();
        let id = store.create_layer();
        let crop = Rect::new(0.25, 0.1, 0.75, 0.6);
        store.set_content_rect(id, crop);
        let back = store.content_rect(id);
        for (a, b) in [(back.x0, crop.x0), (back.y0, crop.y0), (back.x1, crop.x1), (back.y1, crop.y1)] {
            assert!((a - b).abs() < 1e-9, "{back:?} != {crop:?}");
        }

        store.set_content_size(id, Size::new(-1.0, 1.0));
        store.set_content_center(id, Point::new(0.5, 0.5));
        assert_eq!(store.content_rect(id).width(), -1.0);
    }

    #[test]
    fn geometry_setters_invalidate_layout() {
        let mut store = LayerStore::new();
        let id = store.create_layer();
        store.set_size(id, Size::new(10.0, 10.0));
        let _ = store.model(id);
        assert!(store.layout_cache(id).has_model());
        store.set_position(id, Point::new(1.0, 1.0));
        assert!(!store.layout_cache(id).has_model());
        assert_eq!(
            store.model(id),
            Transform3d::from_translation(-4.0, -4.0, 0.0)
        );
    }

    #[test]
    fn corner_radius_manages_its_filter() {
        let mut store = LayerStore::new();
        let id = store.create_layer();
        store.set_corner_radius(id, 2.0);
        assert_eq!(store.corner_radius(id), 1.0);
        assert_eq!(store.filters(id).len(), 1);

        // Replacing the filter list keeps the corner filter.
        store.set_filters(id, Vec::new());
        assert_eq!(store.filters(id).len(), 1);

        store.set_corner_radius(id, 0.0);
        assert!(store.filters(id).is_empty());
    }

    #[test]
    fn observers_see_frame_hidden_and_sublayer_changes() {
        let mut store = LayerStore::new();
        let parent = store.create_layer();
        let child = store.create_layer();
        let log = Rc::new(RefCell::new(Vec::new()));
        for (layer, property) in [
            (child, Property::Frame),
            (child, Property::Hidden),
            (parent, Property::Sublayers),
        ] {
            let log = log.clone();
            store.observe(layer, property, move |_, p| log.borrow_mut().push(p));
        }

        store.set_position(child, Point::new(3.0, 3.0));
        store.set_position(child, Point::new(3.0, 3.0));
        store.set_hidden(child, true);
        store.set_hidden(child, true);
        store.add_sublayer(parent, child);
        store.remove_from_superlayer(child);

        assert_eq!(
            *log.borrow(),
            vec![
                Property::Frame,
                Property::Hidden,
                Property::Sublayers,
                Property::Sublayers
            ]
        );
    }

    #[test]
    fn destroy_drops_observers() {
        let mut store = LayerStore::new();
        let id = store.create_layer();
        let token = store.observe(id, Property::Frame, |_, _| {});
        store.destroy_layer(id);
        assert!(!store.unobserve(token));
    }
}
