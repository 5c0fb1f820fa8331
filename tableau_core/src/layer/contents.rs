// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Contents, masks, filters, drawn surfaces, and asynchronous loading.

use std::fmt;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use futures::task::noop_waker_ref;
use kurbo::Size;

use super::id::{INVALID, LayerId};
use super::store::LayerStore;
use crate::content::{ContentSource, Drawable};
use crate::dirty;
use crate::filter::{Filter, same_filter};
use crate::load::{
    CancellationToken, ContentDecoder, LoadError, LoadRequest, LoadResult, MediaKind,
    classify_source,
};
use crate::mask::Mask;
use crate::observe::Property;
use crate::surface::{DrawnSurface, Rgba, SurfacePainter};
use crate::telemetry::{LoadCompletedEvent, LoadFailedEvent, SourceErrorEvent};

/// A load started by [`LayerStore::set_contents_source`] that has not
/// settled yet.
pub(crate) struct PendingLoad {
    layer: LayerId,
    source: String,
    auto_hide: bool,
    token: CancellationToken,
    future: LocalBoxFuture<'static, LoadResult>,
}

impl fmt::Debug for PendingLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingLoad")
            .field("layer", &self.layer)
            .field("source", &self.source)
            .field("auto_hide", &self.auto_hide)
            .field("cancelled", &self.token.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl LayerStore {
    // -- Specialized constructors --

    /// Creates a layer backed by a software-drawn surface of `size`.
    ///
    /// `painter` is the draw routine used by [`draw`](Self::draw). Layers
    /// whose drawing depends on external state pass `None` and draw with
    /// [`draw_with`](Self::draw_with).
    pub fn create_drawn_layer(
        &mut self,
        size: Size,
        painter: Option<Box<dyn SurfacePainter>>,
    ) -> LayerId {
        let id = self.create_layer();
        self.content[id.idx as usize] = ContentSource::Surface(DrawnSurface::new(size, painter));
        self.set_size(id, size);
        id
    }

    /// Creates a layer whose pixels are supplied by the renderer.
    ///
    /// Its contents cannot be reassigned and never need an upload.
    pub fn create_passthrough_layer(&mut self) -> LayerId {
        let id = self.create_layer();
        self.content[id.idx as usize] = ContentSource::Passthrough;
        id
    }

    // -- Contents --

    /// Returns the contents of a layer.
    #[must_use]
    pub fn contents(&self, id: LayerId) -> &ContentSource {
        self.validate(id);
        &self.content[id.idx as usize]
    }

    /// Replaces the contents of a layer.
    ///
    /// The previous contents are released first and any pending load is
    /// cancelled. Assignments to passthrough layers are ignored.
    pub fn set_contents(&mut self, id: LayerId, contents: ContentSource) {
        self.validate(id);
        if self.content[id.idx as usize].is_passthrough() {
            tracing::debug!(layer = %id, "ignoring contents assignment on passthrough layer");
            return;
        }
        self.cancel_load(id.idx);
        self.contents_src[id.idx as usize] = None;
        self.replace_contents(id, contents);
    }

    /// Shorthand for [`set_contents`](Self::set_contents) with a drawable.
    pub fn set_drawable(&mut self, id: LayerId, drawable: Box<dyn Drawable>) {
        self.set_contents(id, ContentSource::Drawable(drawable));
    }

    /// Returns `true` if the renderer must re-upload the contents.
    ///
    /// Live drawables always need an update; passthrough contents never do.
    #[must_use]
    pub fn contents_need_update(&self, id: LayerId) -> bool {
        self.validate(id);
        let i = id.idx as usize;
        match &self.content[i] {
            ContentSource::Passthrough => false,
            c if c.is_live() => true,
            _ => self.contents_need_update[i],
        }
    }

    /// Records that the renderer uploaded the current contents.
    pub fn mark_contents_updated(&mut self, id: LayerId) {
        self.validate(id);
        self.contents_need_update[id.idx as usize] = false;
    }

    /// Intrinsic size of the contents, falling back to the layer size.
    #[must_use]
    pub fn natural_size(&self, id: LayerId) -> Size {
        self.validate(id);
        let i = id.idx as usize;
        self.content[i]
            .natural_size()
            .unwrap_or(self.geometry[i].size)
    }

    // -- Mask --

    /// Returns the explicit mask of a layer.
    #[must_use]
    pub fn mask(&self, id: LayerId) -> Option<&Mask> {
        self.validate(id);
        self.mask[id.idx as usize].as_ref()
    }

    /// Replaces the explicit mask. The previous mask is dropped first.
    pub fn set_mask(&mut self, id: LayerId, mask: Option<Mask>) {
        self.validate(id);
        let i = id.idx as usize;
        drop(self.mask[i].take());
        self.mask[i] = mask;
        self.mask_needs_update[i] = true;
        self.dirty.mark(id.idx, dirty::MASK);
    }

    /// Returns `true` if the renderer must re-upload the mask.
    #[must_use]
    pub fn mask_needs_update(&self, id: LayerId) -> bool {
        self.validate(id);
        self.mask_needs_update[id.idx as usize]
    }

    /// Records that the renderer uploaded the current mask.
    pub fn mark_mask_updated(&mut self, id: LayerId) {
        self.validate(id);
        self.mask_needs_update[id.idx as usize] = false;
    }

    // -- Filters --

    /// Returns the filters of a layer, in application order.
    #[must_use]
    pub fn filters(&self, id: LayerId) -> &[Rc<dyn Filter>] {
        self.validate(id);
        &self.filters[id.idx as usize]
    }

    /// Replaces the filter list.
    ///
    /// The built-in corner-radius filter stays installed (appended at the end)
    /// while the corner radius is nonzero.
    pub fn set_filters(&mut self, id: LayerId, filters: Vec<Rc<dyn Filter>>) {
        self.validate(id);
        let i = id.idx as usize;
        let mut filters = filters;
        if let Some(corner) = &self.corner_radius_filter[i] {
            let corner: Rc<dyn Filter> = corner.clone();
            if !filters.iter().any(|f| same_filter(f, &corner)) {
                filters.push(corner);
            }
        }
        self.filters[i] = filters;
        self.dirty.mark(id.idx, dirty::MASK);
    }

    /// Appends `filter` unless that instance is already installed.
    pub fn add_filter(&mut self, id: LayerId, filter: Rc<dyn Filter>) {
        self.validate(id);
        let mut filters = self.filters[id.idx as usize].clone();
        if !filters.iter().any(|f| same_filter(f, &filter)) {
            filters.push(filter);
            self.set_filters(id, filters);
        }
    }

    /// Removes `filter` if that instance is installed.
    pub fn remove_filter(&mut self, id: LayerId, filter: &Rc<dyn Filter>) {
        self.validate(id);
        let mut filters = self.filters[id.idx as usize].clone();
        if let Some(pos) = filters.iter().position(|f| same_filter(f, filter)) {
            filters.remove(pos);
            self.set_filters(id, filters);
        }
    }

    // -- Drawn surfaces --

    /// Returns the drawn surface of a layer, if it has one.
    #[must_use]
    pub fn surface(&self, id: LayerId) -> Option<&DrawnSurface> {
        self.validate(id);
        self.content[id.idx as usize].as_surface()
    }

    /// Reads one pixel of a drawn layer's surface.
    #[must_use]
    pub fn surface_pixel(&self, id: LayerId, x: u32, y: u32) -> Option<Rgba> {
        self.surface(id)?.pixel(x, y)
    }

    /// Installs the draw routine of a drawn layer.
    ///
    /// # Panics
    ///
    /// Panics if the layer has no drawn surface.
    pub fn set_surface_painter(&mut self, id: LayerId, painter: Option<Box<dyn SurfacePainter>>) {
        self.surface_mut(id).set_painter(painter);
    }

    /// Clears and redraws a drawn layer with its installed routine.
    ///
    /// Marks the contents as needing an upload and invalidates the cached
    /// hit-test mask.
    ///
    /// # Panics
    ///
    /// Panics if the layer has no drawn surface, or if no draw routine is
    /// installed.
    pub fn draw(&mut self, id: LayerId) {
        if !self.surface_mut(id).draw() {
            unimplemented!("draw routine for drawn layer {id:?}");
        }
        self.contents_drawn(id.idx);
    }

    /// Clears and redraws a drawn layer with `painter`.
    ///
    /// # Panics
    ///
    /// Panics if the layer has no drawn surface.
    pub fn draw_with(&mut self, id: LayerId, painter: &mut dyn SurfacePainter) {
        self.surface_mut(id).draw_with(painter);
        self.contents_drawn(id.idx);
    }

    fn surface_mut(&mut self, id: LayerId) -> &mut DrawnSurface {
        self.validate(id);
        let Some(surface) = self.content[id.idx as usize].as_surface_mut() else {
            panic!("layer {id:?} has no drawn surface");
        };
        surface
    }

    fn contents_drawn(&mut self, idx: u32) {
        self.contents_need_update[idx as usize] = true;
        self.dirty.mark(idx, dirty::CONTENTS);
    }

    // -- Loading --

    /// Returns the contents source last assigned to a layer.
    #[must_use]
    pub fn contents_source(&self, id: LayerId) -> Option<&str> {
        self.validate(id);
        self.contents_src[id.idx as usize].as_deref()
    }

    /// Starts loading `source` into the layer's contents via `decoder`.
    ///
    /// The source is classified as image or video ([`classify_source`]);
    /// malformed sources are reported to telemetry and loaded as images. When
    /// [`auto_hide_on_load`](crate::config::StageConfig::auto_hide_on_load) is
    /// set, the layer is hidden until the load succeeds. A pending load for
    /// the same layer is cancelled.
    ///
    /// `None` clears the contents.
    pub fn set_contents_source(
        &mut self,
        id: LayerId,
        source: Option<&str>,
        mime: Option<&str>,
        decoder: &dyn ContentDecoder,
    ) {
        self.validate(id);
        self.cancel_load(id.idx);
        let Some(source) = source else {
            self.set_contents(id, ContentSource::Empty);
            return;
        };
        self.contents_src[id.idx as usize] = Some(source.to_owned());

        let auto_hide = self.config.auto_hide_on_load;
        if auto_hide {
            self.set_hidden(id, true);
        }

        let kind = match classify_source(source, mime, &self.config) {
            Ok(kind) => kind,
            Err(error) => {
                tracing::warn!(layer = %id, source, %error, "malformed contents source, loading as image");
                self.telemetry.source_error(&SourceErrorEvent {
                    layer: id,
                    source: source.to_owned(),
                    error,
                });
                MediaKind::Image
            }
        };

        let request = LoadRequest {
            source: source.to_owned(),
            kind,
            video: (kind == MediaKind::Video).then_some(self.config.video_playback),
            token: CancellationToken::new(),
        };
        tracing::debug!(layer = %id, source, ?kind, "loading contents");
        let future = decoder.decode(&request);
        self.loads.push(PendingLoad {
            layer: id,
            source: request.source,
            auto_hide,
            token: request.token,
            future,
        });
    }

    /// Returns `true` while any load has not settled.
    #[must_use]
    pub fn has_pending_loads(&self) -> bool {
        !self.loads.is_empty()
    }

    /// Polls pending loads once without blocking and applies the ones that
    /// settled. Returns how many settled.
    ///
    /// Successful loads become the layer's contents and un-hide auto-hidden
    /// layers. Failed loads are logged and reported, and the layer keeps its
    /// previous contents. Loads that were cancelled, or whose layer was
    /// destroyed, are dropped. Videos that come up paused get one autoplay
    /// retry on the following poll, if their layer is still parented.
    pub fn poll_loads(&mut self) -> usize {
        for id in std::mem::take(&mut self.autoplay_retries) {
            self.retry_autoplay(id);
        }

        let mut cx = Context::from_waker(noop_waker_ref());
        let mut settled = 0;
        let mut i = 0;
        while i < self.loads.len() {
            let (layer, cancelled) = {
                let load = &self.loads[i];
                (load.layer, load.token.is_cancelled())
            };
            if cancelled || !self.is_alive(layer) {
                let load = self.loads.remove(i);
                tracing::debug!(layer = %load.layer, source = %load.source, "dropping abandoned load");
                continue;
            }
            match self.loads[i].future.poll_unpin(&mut cx) {
                Poll::Pending => i += 1,
                Poll::Ready(result) => {
                    let load = self.loads.remove(i);
                    settled += 1;
                    self.finish_load(load, result);
                }
            }
        }
        settled
    }

    fn finish_load(&mut self, load: PendingLoad, result: LoadResult) {
        let id = load.layer;
        match result {
            Ok(drawable) => {
                let kind = drawable.kind();
                self.replace_contents(id, ContentSource::Drawable(drawable));
                if load.auto_hide {
                    self.set_hidden(id, false);
                }
                if kind == MediaKind::Video {
                    self.autoplay_retries.push(id);
                }
                tracing::debug!(layer = %id, source = %load.source, "contents loaded");
                self.telemetry.load_completed(&LoadCompletedEvent {
                    layer: id,
                    source: load.source,
                    kind,
                });
            }
            Err(LoadError::Cancelled) => {
                tracing::debug!(layer = %id, source = %load.source, "load cancelled by decoder");
            }
            Err(error) => {
                tracing::error!(layer = %id, source = %load.source, %error, "error loading contents source");
                self.telemetry.load_failed(&LoadFailedEvent {
                    layer: id,
                    source: load.source,
                    error,
                });
            }
        }
    }

    fn retry_autoplay(&mut self, id: LayerId) {
        if !self.is_alive(id) || self.parent[id.idx as usize] == INVALID {
            return;
        }
        if let ContentSource::Drawable(drawable) = &mut self.content[id.idx as usize]
            && drawable.is_paused()
        {
            tracing::debug!(layer = %id, "retrying video autoplay");
            drawable.play();
        }
    }

    /// Cancels and drops the pending load of slot `idx`, if any.
    pub(crate) fn cancel_load(&mut self, idx: u32) {
        self.loads.retain(|load| {
            if load.layer.idx == idx {
                load.token.cancel();
                false
            } else {
                true
            }
        });
    }

    fn replace_contents(&mut self, id: LayerId, contents: ContentSource) {
        let i = id.idx as usize;
        if self.content[i].is_passthrough() {
            tracing::debug!(layer = %id, "ignoring loaded contents on passthrough layer");
            return;
        }
        self.content[i].release();
        self.content[i] = contents;
        if let Some(surface) = self.content[i].as_surface_mut() {
            surface.resize(self.geometry[i].size);
        }
        self.contents_need_update[i] = true;
        self.dirty.mark(id.idx, dirty::CONTENTS);
        self.observers.notify(id, Property::Contents);
    }
}
