//! Observability
//!
//! Structured event logging for the write path: applied writes,
//! detected conflicts, restores. Logging is synchronous, read-only,
//! and has no effect on execution.

mod logger;

pub use logger::{Logger, Severity};
