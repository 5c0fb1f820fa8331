// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Diagnostics for tableau layer trees.
//!
//! - [`pretty::dump_tree`]: an indented, one-line-per-layer text dump.
//! - [`snapshot::to_json`]: a JSON export of a subtree for bug reports and
//!   test fixtures.
//! - [`pretty::PrettyTelemetrySink`]: human-readable telemetry, one line per
//!   event.
//! - [`recorder::RecordingSink`]: captures telemetry events for inspection.

pub mod pretty;
pub mod recorder;
pub mod snapshot;
