//! History tracking
//!
//! Immutable per-record snapshots, one per applied write, keyed by
//! `(record_id, version)`.

mod tracker;

pub use tracker::{HistoryEntry, HistoryTracker};
