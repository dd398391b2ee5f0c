//! Version engine
//!
//! The write path for versioned records. The compare-and-swap itself
//! is delegated to the store's conditional write, which is the only
//! critical section: of two concurrent writers carrying the same
//! expected version, exactly one observes success. Reads here may see
//! slightly stale versions; the write re-checks atomically.
//!
//! Every applied write appends exactly one history snapshot.

use std::sync::Arc;

use super::errors::{VersionError, VersionResult};
use super::write::{ConflictCheck, Resolution, VersionedWrite, WriteConflict, WriteOutcome};
use crate::history::{HistoryEntry, HistoryTracker};
use crate::observability::Logger;
use crate::record::DataRecord;
use crate::store::{ConditionalWrite, RecordPatch, RecordStore, StoreError};

/// Optimistic concurrency engine over a record store.
pub struct VersionEngine<S: RecordStore> {
    store: Arc<S>,
    history: HistoryTracker,
}

impl<S: RecordStore> VersionEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            history: HistoryTracker::new(),
        }
    }

    /// The underlying store handle.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Inserts a new record and seeds its version-1 history snapshot.
    pub fn create(&self, record: DataRecord) -> VersionResult<DataRecord> {
        self.store.insert(record.clone())?;
        self.history.append(&record);
        let version = record.version().to_string();
        Logger::info(
            "record_created",
            &[("recordId", &record.id), ("version", &version)],
        );
        Ok(record)
    }

    /// Read-only conflict probe: compares the caller's last known
    /// version against the stored one. No side effects; the answer
    /// may already be stale by the time the caller acts on it.
    pub fn check_for_conflicts(
        &self,
        record_id: &str,
        last_known_version: u64,
    ) -> VersionResult<ConflictCheck> {
        let record = self
            .store
            .get_by_id(record_id)?
            .ok_or_else(|| VersionError::not_found(record_id))?;

        let has_conflict = record.version() != last_known_version;
        Ok(ConflictCheck {
            has_conflict,
            current: has_conflict.then_some(record),
        })
    }

    /// Applies a versioned write. Consumes the write: it is either
    /// applied or rejected as a conflict, never retried here.
    ///
    /// A forced write bypasses the version comparison entirely and
    /// always wins.
    pub fn apply(&self, write: VersionedWrite) -> VersionResult<WriteOutcome> {
        if write.force {
            let record = self
                .store
                .write_forced(&write.record_id, &write.patch)
                .map_err(|e| map_store_error(&write.record_id, e))?;
            self.history.append(&record);
            let version = record.version().to_string();
            Logger::info(
                "write_forced",
                &[("recordId", &record.id), ("version", &version)],
            );
            return Ok(WriteOutcome::Applied(record));
        }

        let result = self
            .store
            .write(&write.record_id, &write.patch, write.expected_version)
            .map_err(|e| map_store_error(&write.record_id, e))?;

        match result {
            ConditionalWrite::Applied(record) => {
                self.history.append(&record);
                let version = record.version().to_string();
                Logger::info(
                    "write_applied",
                    &[("recordId", &record.id), ("version", &version)],
                );
                Ok(WriteOutcome::Applied(record))
            }
            ConditionalWrite::VersionMismatch {
                current_version,
                current,
            } => {
                let expected = write.expected_version.to_string();
                let stored = current_version.to_string();
                Logger::warn(
                    "write_conflict",
                    &[
                        ("currentVersion", &stored),
                        ("expectedVersion", &expected),
                        ("recordId", &write.record_id),
                    ],
                );
                Ok(WriteOutcome::Conflict(WriteConflict {
                    record_id: write.record_id,
                    expected_version: write.expected_version,
                    current_version,
                    current,
                    incoming: write.patch,
                }))
            }
        }
    }

    /// Builds the follow-up write for a surfaced conflict.
    ///
    /// All strategies target the *current* stored version, so the
    /// resolution itself goes through normal conflict detection and
    /// can lose another race.
    pub fn resolve_conflict(&self, resolution: Resolution, conflict: &WriteConflict) -> VersionedWrite {
        let patch = match resolution {
            Resolution::KeepCurrent => RecordPatch::from_snapshot(&conflict.current),
            Resolution::KeepIncoming => conflict.incoming.clone(),
            Resolution::Merge(merged) => merged,
        };
        VersionedWrite::new(conflict.record_id.clone(), conflict.current_version, patch)
    }

    /// Restores a record to a prior snapshot through the normal write
    /// path, so a restore is conflict-checked like any other write.
    pub fn restore(&self, record_id: &str, target_version: u64) -> VersionResult<WriteOutcome> {
        let entry = self
            .history
            .entry(record_id, target_version)
            .ok_or_else(|| VersionError::history_missing(record_id, target_version))?;

        let current = self
            .store
            .get_by_id(record_id)?
            .ok_or_else(|| VersionError::not_found(record_id))?;

        let write = VersionedWrite::new(record_id, current.version(), entry.to_patch());
        let outcome = self.apply(write)?;

        if let WriteOutcome::Applied(record) = &outcome {
            let target = target_version.to_string();
            let version = record.version().to_string();
            Logger::info(
                "record_restored",
                &[
                    ("recordId", &record.id),
                    ("restoredFrom", &target),
                    ("version", &version),
                ],
            );
        }
        Ok(outcome)
    }

    /// History snapshots for a record, newest-first.
    pub fn history(&self, record_id: &str) -> Vec<HistoryEntry> {
        self.history.for_record(record_id)
    }
}

/// The store reports a missing id as its own error; surface it as the
/// engine's NotFound so callers see one error shape.
fn map_store_error(record_id: &str, error: StoreError) -> VersionError {
    match error {
        StoreError::NotFound(_) => VersionError::not_found(record_id),
        other => VersionError::Store(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::{json, Map};

    fn engine() -> VersionEngine<MemoryStore> {
        VersionEngine::new(Arc::new(MemoryStore::new()))
    }

    fn content_patch(content: &str) -> RecordPatch {
        let mut data = Map::new();
        data.insert("content".to_string(), json!(content));
        RecordPatch {
            data: Some(data),
            ..Default::default()
        }
    }

    fn new_record(content: &str) -> DataRecord {
        let mut data = Map::new();
        data.insert("content".to_string(), json!(content));
        DataRecord::new("note", data, "user-1")
    }

    #[test]
    fn test_create_seeds_history() {
        let engine = engine();
        let record = engine.create(new_record("v1")).unwrap();

        let history = engine.history(&record.id);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].version(), 1);
    }

    #[test]
    fn test_apply_matching_version_succeeds() {
        let engine = engine();
        let record = engine.create(new_record("v1")).unwrap();

        let outcome = engine
            .apply(VersionedWrite::new(record.id.clone(), 1, content_patch("v2")))
            .unwrap();

        let updated = outcome.applied().expect("write should apply");
        assert_eq!(updated.version(), 2);
        assert_eq!(updated.data.get("content"), Some(&json!("v2")));
        assert_eq!(engine.history(&record.id).len(), 2);
    }

    #[test]
    fn test_stale_version_conflicts_without_mutation() {
        let engine = engine();
        let record = engine.create(new_record("v1")).unwrap();

        engine
            .apply(VersionedWrite::new(record.id.clone(), 1, content_patch("v2")))
            .unwrap();

        let outcome = engine
            .apply(VersionedWrite::new(record.id.clone(), 1, content_patch("lost")))
            .unwrap();

        let conflict = outcome.conflict().expect("stale write should conflict");
        assert_eq!(conflict.current_version, 2);
        assert_eq!(conflict.expected_version, 1);

        // Stored state untouched by the losing write
        let stored = engine.store().get_by_id(&record.id).unwrap().unwrap();
        assert_eq!(stored.data.get("content"), Some(&json!("v2")));
        assert_eq!(engine.history(&record.id).len(), 2);
    }

    #[test]
    fn test_check_for_conflicts_is_read_only() {
        let engine = engine();
        let record = engine.create(new_record("v1")).unwrap();

        let check = engine.check_for_conflicts(&record.id, 1).unwrap();
        assert!(!check.has_conflict);
        assert!(check.current.is_none());

        engine
            .apply(VersionedWrite::new(record.id.clone(), 1, content_patch("v2")))
            .unwrap();

        let check = engine.check_for_conflicts(&record.id, 1).unwrap();
        assert!(check.has_conflict);
        assert_eq!(check.current.as_ref().map(|r| r.version()), Some(2));
    }

    #[test]
    fn test_check_unknown_record_is_not_found() {
        let engine = engine();
        let result = engine.check_for_conflicts("ghost", 1);
        assert!(matches!(result, Err(VersionError::NotFound(_))));
    }

    #[test]
    fn test_resolution_keep_current_restamps_stored_content() {
        let engine = engine();
        let record = engine.create(new_record("v1")).unwrap();
        engine
            .apply(VersionedWrite::new(record.id.clone(), 1, content_patch("winner")))
            .unwrap();

        let outcome = engine
            .apply(VersionedWrite::new(record.id.clone(), 1, content_patch("loser")))
            .unwrap();
        let conflict = outcome.conflict().unwrap().clone();

        let resolution = engine.resolve_conflict(Resolution::KeepCurrent, &conflict);
        assert_eq!(resolution.expected_version, 2);

        let resolved = engine.apply(resolution).unwrap();
        let record = resolved.applied().expect("resolution should apply");
        assert_eq!(record.version(), 3);
        assert_eq!(record.data.get("content"), Some(&json!("winner")));
    }

    #[test]
    fn test_resolution_keep_incoming_resubmits_losing_patch() {
        let engine = engine();
        let record = engine.create(new_record("v1")).unwrap();
        engine
            .apply(VersionedWrite::new(record.id.clone(), 1, content_patch("winner")))
            .unwrap();

        let outcome = engine
            .apply(VersionedWrite::new(record.id.clone(), 1, content_patch("mine")))
            .unwrap();
        let conflict = outcome.conflict().unwrap().clone();

        let resolution = engine.resolve_conflict(Resolution::KeepIncoming, &conflict);
        let resolved = engine.apply(resolution).unwrap();
        let record = resolved.applied().unwrap();
        assert_eq!(record.data.get("content"), Some(&json!("mine")));
    }

    #[test]
    fn test_resolution_can_conflict_again() {
        let engine = engine();
        let record = engine.create(new_record("v1")).unwrap();
        engine
            .apply(VersionedWrite::new(record.id.clone(), 1, content_patch("v2")))
            .unwrap();

        let outcome = engine
            .apply(VersionedWrite::new(record.id.clone(), 1, content_patch("late")))
            .unwrap();
        let conflict = outcome.conflict().unwrap().clone();

        // Another writer sneaks in before the resolution lands.
        engine
            .apply(VersionedWrite::new(record.id.clone(), 2, content_patch("v3")))
            .unwrap();

        let resolution = engine.resolve_conflict(Resolution::KeepIncoming, &conflict);
        let resolved = engine.apply(resolution).unwrap();
        assert!(resolved.is_conflict());
    }

    #[test]
    fn test_forced_write_always_wins() {
        let engine = engine();
        let record = engine.create(new_record("v1")).unwrap();
        engine
            .apply(VersionedWrite::new(record.id.clone(), 1, content_patch("v2")))
            .unwrap();

        let outcome = engine
            .apply(VersionedWrite::forced(record.id.clone(), content_patch("forced")))
            .unwrap();

        let updated = outcome.applied().expect("forced write always applies");
        assert_eq!(updated.version(), 3);
        assert_eq!(updated.data.get("content"), Some(&json!("forced")));
        assert_eq!(engine.history(&record.id).len(), 3);
    }

    #[test]
    fn test_restore_goes_through_write_path() {
        let engine = engine();
        let record = engine.create(new_record("original")).unwrap();
        engine
            .apply(VersionedWrite::new(record.id.clone(), 1, content_patch("edited")))
            .unwrap();

        let outcome = engine.restore(&record.id, 1).unwrap();
        let restored = outcome.applied().expect("restore should apply");

        assert_eq!(restored.version(), 3);
        assert_eq!(restored.data.get("content"), Some(&json!("original")));
        assert_eq!(engine.history(&record.id).len(), 3);
    }

    #[test]
    fn test_restore_missing_version() {
        let engine = engine();
        let record = engine.create(new_record("v1")).unwrap();

        let result = engine.restore(&record.id, 9);
        assert!(matches!(result, Err(VersionError::HistoryMissing { .. })));
    }
}
