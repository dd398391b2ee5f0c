//! versadb - versioned record store core
//!
//! Filter/search compilation into backend-agnostic predicate trees,
//! and optimistic concurrency control over schemaless versioned
//! records with explicit conflict resolution and history.

pub mod filter;
pub mod history;
pub mod observability;
pub mod query;
pub mod record;
pub mod store;
pub mod version;
