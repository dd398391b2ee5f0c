//! Store error types

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by a record store.
///
/// Writes are all-or-nothing: an error never leaves a record in an
/// intermediate state.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Insert with an id that already exists
    #[error("Record already exists: {0}")]
    DuplicateId(String),

    /// Record id unknown
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Unexpected persistence failure
    #[error("Store failure: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn duplicate(id: impl Into<String>) -> Self {
        Self::DuplicateId(id.into())
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
