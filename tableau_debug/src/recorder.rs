// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Telemetry capture.
//!
//! [`RecordingSink`] implements [`TelemetrySink`] and keeps every event it
//! receives. The store owns the installed sink, so the recording lives
//! behind a shared handle: keep a clone of the sink and read the events
//! through it.

use std::cell::RefCell;
use std::rc::Rc;

use tableau_core::telemetry::{
    LoadCompletedEvent, LoadFailedEvent, SourceErrorEvent, TelemetrySink,
};

/// A recorded telemetry event.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`SourceErrorEvent`].
    SourceError(SourceErrorEvent),
    /// A [`LoadFailedEvent`].
    LoadFailed(LoadFailedEvent),
    /// A [`LoadCompletedEvent`].
    LoadCompleted(LoadCompletedEvent),
}

/// A [`TelemetrySink`] that records events in memory.
///
/// Clones share the same recording.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    events: Rc<RefCell<Vec<RecordedEvent>>>,
}

impl RecordingSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the events recorded so far, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.borrow().clone()
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Drops all recorded events.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    fn record(&self, event: RecordedEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl TelemetrySink for RecordingSink {
    fn on_source_error(&mut self, e: &SourceErrorEvent) {
        self.record(RecordedEvent::SourceError(e.clone()));
    }

    fn on_load_failed(&mut self, e: &LoadFailedEvent) {
        self.record(RecordedEvent::LoadFailed(e.clone()));
    }

    fn on_load_completed(&mut self, e: &LoadCompletedEvent) {
        self.record(RecordedEvent::LoadCompleted(e.clone()));
    }
}
