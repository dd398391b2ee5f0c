//! History tracker
//!
//! Records each accepted mutation as an immutable snapshot. Entries
//! are append-only: once captured they never change, and a duplicate
//! `(record_id, version)` key is ignored rather than overwritten.
//! Listing returns newest-first.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::record::{DataRecord, RecordMetadata};
use crate::store::RecordPatch;

/// Immutable snapshot of a record at one version.
///
/// All fields are private to enforce immutability.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    entry_id: String,
    record_id: String,
    version: u64,
    #[serde(rename = "type")]
    record_type: String,
    data: Map<String, Value>,
    metadata: RecordMetadata,
    captured_at: DateTime<Utc>,
    captured_by: String,
}

impl HistoryEntry {
    /// Captures a snapshot of the record as it is now.
    fn capture(record: &DataRecord) -> Self {
        Self {
            entry_id: Uuid::new_v4().to_string(),
            record_id: record.id.clone(),
            version: record.metadata.version,
            record_type: record.record_type.clone(),
            data: record.data.clone(),
            metadata: record.metadata.clone(),
            captured_at: Utc::now(),
            captured_by: record.updated_by.clone(),
        }
    }

    #[inline]
    pub fn entry_id(&self) -> &str {
        &self.entry_id
    }

    #[inline]
    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    #[inline]
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    #[inline]
    pub fn metadata(&self) -> &RecordMetadata {
        &self.metadata
    }

    #[inline]
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    #[inline]
    pub fn captured_by(&self) -> &str {
        &self.captured_by
    }

    /// Builds the patch a restore submits: the snapshot's type, data,
    /// and metadata (the version inside is ignored by the store).
    pub fn to_patch(&self) -> RecordPatch {
        RecordPatch {
            record_type: Some(self.record_type.clone()),
            data: Some(self.data.clone()),
            metadata: Some(self.metadata.clone()),
            updated_by: None,
        }
    }
}

/// Append-only history store.
#[derive(Debug, Default)]
pub struct HistoryTracker {
    entries: Mutex<HashMap<String, Vec<HistoryEntry>>>,
}

impl HistoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a snapshot of the record at its current version.
    ///
    /// Called exactly once per applied write. A snapshot for an
    /// already-captured `(record_id, version)` key is a no-op: the
    /// first capture wins.
    pub fn append(&self, record: &DataRecord) {
        let mut entries = self.entries.lock().expect("history lock poisoned");
        let chain = entries.entry(record.id.clone()).or_default();
        if chain.iter().any(|e| e.version == record.metadata.version) {
            return;
        }
        chain.push(HistoryEntry::capture(record));
    }

    /// All snapshots for a record, newest-first.
    pub fn for_record(&self, record_id: &str) -> Vec<HistoryEntry> {
        let entries = self.entries.lock().expect("history lock poisoned");
        let mut chain = entries.get(record_id).cloned().unwrap_or_default();
        chain.sort_by(|a, b| b.version.cmp(&a.version));
        chain
    }

    /// The snapshot at one specific version, if captured.
    pub fn entry(&self, record_id: &str, version: u64) -> Option<HistoryEntry> {
        let entries = self.entries.lock().expect("history lock poisoned");
        entries
            .get(record_id)?
            .iter()
            .find(|e| e.version == version)
            .cloned()
    }
}
