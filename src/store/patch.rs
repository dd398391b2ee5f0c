//! Record patch
//!
//! The unit of change carried by a versioned write. Present fields
//! replace the stored ones wholesale; absent fields are untouched.
//! The version counter inside `metadata` is store-owned and any value
//! supplied here is ignored.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::record::{DataRecord, RecordMetadata};

/// Partial update for a record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPatch {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RecordMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

impl RecordPatch {
    /// A patch replacing the full mutable content of `record`.
    ///
    /// Used by conflict resolution (keep-current re-stamps the stored
    /// content) and by history restore.
    pub fn from_snapshot(record: &DataRecord) -> Self {
        Self {
            record_type: Some(record.record_type.clone()),
            data: Some(record.data.clone()),
            metadata: Some(record.metadata.clone()),
            updated_by: None,
        }
    }

    /// Returns true if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.record_type.is_none()
            && self.data.is_none()
            && self.metadata.is_none()
            && self.updated_by.is_none()
    }
}
