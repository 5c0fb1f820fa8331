// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable output.
//!
//! [`dump_tree`] renders a subtree as indented text. [`PrettyTelemetrySink`]
//! implements [`TelemetrySink`] and writes one line per event to a
//! [`Write`](std::io::Write) destination (default: stderr).

use std::fmt::Write as _;
use std::io::Write;

use kurbo::Rect;
use tableau_core::content::ContentSource;
use tableau_core::layer::{LayerId, LayerStore};
use tableau_core::load::MediaKind;
use tableau_core::telemetry::{
    LoadCompletedEvent, LoadFailedEvent, SourceErrorEvent, TelemetrySink,
};

/// Short name of what a layer displays.
pub(crate) fn contents_label(contents: &ContentSource) -> &'static str {
    match contents {
        ContentSource::Empty => "empty",
        ContentSource::Drawable(d) => match d.kind() {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Other => "drawable",
        },
        ContentSource::Surface(_) => "surface",
        ContentSource::Passthrough => "passthrough",
    }
}

fn format_rect(r: Rect) -> String {
    format!("({}, {}, {}×{})", r.x0, r.y0, r.width(), r.height())
}

/// Renders `root` and its sublayers, back to front, one line per layer.
///
/// ```text
/// #0 frame=(0, 0, 200×200) contents=image interactive
///   #1 frame=(0, 0, 50×50) z=1 contents=empty hidden
/// ```
#[must_use]
pub fn dump_tree(store: &LayerStore, root: LayerId) -> String {
    let mut out = String::new();
    dump_layer(store, root, 0, &mut out);
    out
}

fn dump_layer(store: &LayerStore, id: LayerId, depth: usize, out: &mut String) {
    let _ = write!(
        out,
        "{:indent$}{id} frame={}",
        "",
        format_rect(store.frame(id)),
        indent = depth * 2
    );
    let z = store.z_index(id);
    if z != 0 {
        let _ = write!(out, " z={z}");
    }
    let opacity = store.opacity(id);
    if opacity != 1.0 {
        let _ = write!(out, " opacity={opacity}");
    }
    let _ = write!(out, " contents={}", contents_label(store.contents(id)));
    if let Some(src) = store.contents_source(id) {
        let _ = write!(out, " src={src:?}");
    }
    if let Some(mask) = store.mask(id) {
        let _ = write!(out, " mask={}x{}", mask.width(), mask.height());
    }
    let filters = store.filters(id).len();
    if filters > 0 {
        let _ = write!(out, " filters={filters}");
    }
    if store.hidden(id) {
        out.push_str(" hidden");
    }
    if store.user_interaction_enabled(id) {
        out.push_str(" interactive");
    }
    out.push('\n');
    for sub in store.sublayers(id) {
        dump_layer(store, sub, depth + 1, out);
    }
}

/// Writes human-readable telemetry lines to a [`Write`](std::io::Write)
/// destination.
pub struct PrettyTelemetrySink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyTelemetrySink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyTelemetrySink").finish_non_exhaustive()
    }
}

impl PrettyTelemetrySink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }
}

impl<W: Write> PrettyTelemetrySink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<W: Write> TelemetrySink for PrettyTelemetrySink<W> {
    fn on_source_error(&mut self, e: &SourceErrorEvent) {
        let _ = writeln!(
            self.writer,
            "[source-error] layer={} source={:?} error={}",
            e.layer, e.source, e.error,
        );
    }

    fn on_load_failed(&mut self, e: &LoadFailedEvent) {
        let _ = writeln!(
            self.writer,
            "[load-failed] layer={} source={:?} error={}",
            e.layer, e.source, e.error,
        );
    }

    fn on_load_completed(&mut self, e: &LoadCompletedEvent) {
        let _ = writeln!(
            self.writer,
            "[load-completed] layer={} source={:?} kind={:?}",
            e.layer, e.source, e.kind,
        );
    }
}
