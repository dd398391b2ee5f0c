//! Version control engine
//!
//! Optimistic concurrency over versioned records: every record
//! carries a monotone version stamp, writes are compare-and-swap
//! against an expected version, and conflicts surface as values the
//! caller resolves explicitly. The atomicity of the swap lives at the
//! store boundary; the engine itself holds no locks.

mod engine;
pub mod errors;
mod write;

pub use engine::VersionEngine;
pub use errors::{VersionError, VersionResult};
pub use write::{ConflictCheck, Resolution, VersionedWrite, WriteConflict, WriteOutcome};
