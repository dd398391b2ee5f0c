//! Record data model
//!
//! Defines the schemaless versioned record and the JSON path helper
//! used to address nested payload fields.

mod json_path;
mod record;

pub use json_path::get_path;
pub(crate) use record::format_ts;
pub use record::{DataRecord, RecordMetadata};
