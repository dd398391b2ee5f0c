//! Store adapter boundary
//!
//! The query assembler and version engine never touch persistence
//! directly; they speak to a `RecordStore`. The conditional `write`
//! is the one operation with an atomicity contract: the version
//! comparison and the increment must be a single atomic step with
//! respect to concurrent writers.

pub mod errors;
mod memory;
mod patch;

pub use errors::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use patch::RecordPatch;

use crate::filter::PredicateNode;
use crate::query::{Pagination, Sorting};
use crate::record::DataRecord;

/// One page of query results.
///
/// `total` counts every match before pagination is applied.
#[derive(Debug, Clone)]
pub struct Page {
    pub items: Vec<DataRecord>,
    pub total: usize,
}

/// Outcome of a conditional write.
///
/// A version mismatch is an expected result, not an error; it carries
/// the record as currently stored so the caller can drive resolution.
#[derive(Debug, Clone)]
pub enum ConditionalWrite {
    Applied(DataRecord),
    VersionMismatch {
        current_version: u64,
        current: DataRecord,
    },
}

/// Storage boundary for versioned records.
///
/// Implementations must guarantee that `write` performs its version
/// comparison and increment atomically: of two concurrent writers
/// carrying the same expected version, exactly one observes
/// `Applied`.
pub trait RecordStore: Send + Sync {
    /// Inserts a new record. The id must be unused.
    fn insert(&self, record: DataRecord) -> StoreResult<()>;

    /// Fetches a record by id.
    fn get_by_id(&self, id: &str) -> StoreResult<Option<DataRecord>>;

    /// Executes a compiled predicate tree.
    fn find(
        &self,
        predicate: &PredicateNode,
        pagination: &Pagination,
        sorting: &Sorting,
    ) -> StoreResult<Page>;

    /// Compare-and-swap write: applies `patch` and bumps the version
    /// by 1 iff the stored version equals `expected_version`.
    fn write(
        &self,
        id: &str,
        patch: &RecordPatch,
        expected_version: u64,
    ) -> StoreResult<ConditionalWrite>;

    /// Unconditional write: always applies, still bumps the version.
    fn write_forced(&self, id: &str, patch: &RecordPatch) -> StoreResult<DataRecord>;
}
