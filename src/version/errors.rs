//! Version engine error types
//!
//! A version conflict is NOT an error: it is an expected, frequent
//! outcome carried by `WriteOutcome::Conflict` so the caller can
//! drive resolution. The variants here are the genuinely exceptional
//! paths.

use thiserror::Error;

use crate::store::StoreError;

/// Result type for version engine operations
pub type VersionResult<T> = Result<T, VersionError>;

/// Errors from the version control engine
#[derive(Debug, Clone, Error)]
pub enum VersionError {
    /// Record id unknown
    #[error("Record not found: {0}")]
    NotFound(String),

    /// No history snapshot at the requested version
    #[error("No history entry for record {record_id} at version {version}")]
    HistoryMissing { record_id: String, version: u64 },

    /// Underlying store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl VersionError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    pub fn history_missing(record_id: impl Into<String>, version: u64) -> Self {
        Self::HistoryMissing {
            record_id: record_id.into(),
            version,
        }
    }
}
