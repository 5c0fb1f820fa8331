// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Best-effort error reporting for content problems.
//!
//! The layer tree never fails loudly on bad content: malformed sources and
//! failed decodes degrade to "no new contents". They are, however, reported
//! to a [`TelemetrySink`] so the host application can forward them to its
//! crash/error service. All sink methods default to no-ops, so implementing
//! only the events you care about is fine.

use crate::layer::LayerId;
use crate::load::{LoadError, MediaKind, SourceError};

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a contents source string could not be parsed.
#[derive(Clone, Debug)]
pub struct SourceErrorEvent {
    /// Layer whose contents source was assigned.
    pub layer: LayerId,
    /// The offending source string.
    pub source: String,
    /// What went wrong.
    pub error: SourceError,
}

/// Emitted when an asynchronous content load failed.
#[derive(Clone, Debug)]
pub struct LoadFailedEvent {
    /// Layer the load was targeting.
    pub layer: LayerId,
    /// Source string of the load.
    pub source: String,
    /// Decoder error.
    pub error: LoadError,
}

/// Emitted when an asynchronous content load completed and was applied.
#[derive(Clone, Debug)]
pub struct LoadCompletedEvent {
    /// Layer that received the new contents.
    pub layer: LayerId,
    /// Source string of the load.
    pub source: String,
    /// Kind of media that was loaded.
    pub kind: MediaKind,
}

// ---------------------------------------------------------------------------
// TelemetrySink trait
// ---------------------------------------------------------------------------

/// Receives content telemetry from a [`LayerStore`](crate::layer::LayerStore).
pub trait TelemetrySink {
    /// Called when a contents source could not be parsed.
    fn on_source_error(&mut self, e: &SourceErrorEvent) {
        _ = e;
    }

    /// Called when a content load failed.
    fn on_load_failed(&mut self, e: &LoadFailedEvent) {
        _ = e;
    }

    /// Called when a content load completed.
    fn on_load_completed(&mut self, e: &LoadCompletedEvent) {
        _ = e;
    }
}

/// A [`TelemetrySink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TelemetrySink for NoopSink {}

// ---------------------------------------------------------------------------
// Telemetry wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional boxed [`TelemetrySink`].
#[derive(Default)]
pub struct Telemetry {
    sink: Option<Box<dyn TelemetrySink>>,
}

impl std::fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Telemetry")
            .field("installed", &self.sink.is_some())
            .finish()
    }
}

impl Telemetry {
    /// Creates a wrapper that dispatches to `sink`.
    #[must_use]
    pub fn new(sink: Box<dyn TelemetrySink>) -> Self {
        Self { sink: Some(sink) }
    }

    /// Creates a wrapper that discards all events.
    #[must_use]
    pub fn none() -> Self {
        Self { sink: None }
    }

    /// Emits a [`SourceErrorEvent`].
    #[inline]
    pub fn source_error(&mut self, e: &SourceErrorEvent) {
        if let Some(s) = &mut self.sink {
            s.on_source_error(e);
        }
    }

    /// Emits a [`LoadFailedEvent`].
    #[inline]
    pub fn load_failed(&mut self, e: &LoadFailedEvent) {
        if let Some(s) = &mut self.sink {
            s.on_load_failed(e);
        }
    }

    /// Emits a [`LoadCompletedEvent`].
    #[inline]
    pub fn load_completed(&mut self, e: &LoadCompletedEvent) {
        if let Some(s) = &mut self.sink {
            s.on_load_completed(e);
        }
    }
}
