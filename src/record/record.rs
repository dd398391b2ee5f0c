//! DataRecord - schemaless versioned record
//!
//! A record carries an opaque identifier, a classifying type string,
//! an arbitrary JSON payload, and version-stamped metadata. The
//! version counter is owned by the store; it starts at 1 and advances
//! by exactly 1 per applied write.
//!
//! Soft deletion: `deleted_at == None` means the record is live.
//! Compiled queries constrain to live records unless explicitly
//! overridden.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Version-stamped record metadata.
///
/// `version` is engine-owned; a value supplied by a caller in a patch
/// is ignored. The remaining fields are free-form classification
/// attributes; unknown keys are preserved through `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetadata {
    /// Monotone write counter, >= 1.
    #[serde(default = "initial_version")]
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    /// Any additional metadata keys a caller stored.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn initial_version() -> u64 {
    1
}

impl RecordMetadata {
    /// Creates metadata for a freshly inserted record.
    pub fn initial() -> Self {
        Self {
            version: initial_version(),
            tags: None,
            category: None,
            priority: None,
            extra: Map::new(),
        }
    }
}

impl Default for RecordMetadata {
    fn default() -> Self {
        Self::initial()
    }
}

/// A schemaless, version-stamped record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRecord {
    /// Opaque unique identifier.
    pub id: String,
    /// Classifying type string.
    #[serde(rename = "type")]
    pub record_type: String,
    /// Schemaless payload.
    pub data: Map<String, Value>,
    pub metadata: RecordMetadata,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker. `None` means live.
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl DataRecord {
    /// Creates a new live record at version 1 with a fresh identifier.
    pub fn new(
        record_type: impl Into<String>,
        data: Map<String, Value>,
        created_by: impl Into<String>,
    ) -> Self {
        let actor = created_by.into();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            record_type: record_type.into(),
            data,
            metadata: RecordMetadata::initial(),
            created_by: actor.clone(),
            updated_by: actor,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Returns true if the record has not been soft-deleted.
    #[inline]
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Current version stamp.
    #[inline]
    pub fn version(&self) -> u64 {
        self.metadata.version
    }

    /// Resolves a record-level column to its JSON representation.
    ///
    /// This is the column addressing used by predicate evaluation:
    /// timestamps serialize to RFC 3339 UTC strings (lexicographic
    /// order matches chronological order), `deletedAt` is an explicit
    /// null for live records, and unknown column names yield `None`.
    pub fn column_value(&self, column: &str) -> Option<Value> {
        match column {
            "id" => Some(Value::String(self.id.clone())),
            "type" => Some(Value::String(self.record_type.clone())),
            "createdBy" => Some(Value::String(self.created_by.clone())),
            "updatedBy" => Some(Value::String(self.updated_by.clone())),
            "createdAt" => Some(Value::String(format_ts(&self.created_at))),
            "updatedAt" => Some(Value::String(format_ts(&self.updated_at))),
            "deletedAt" => Some(match &self.deleted_at {
                Some(ts) => Value::String(format_ts(ts)),
                None => Value::Null,
            }),
            "data" => Some(Value::Object(self.data.clone())),
            "metadata" => serde_json::to_value(&self.metadata).ok(),
            _ => None,
        }
    }
}

/// Canonical wire form for timestamps: RFC 3339 UTC with millisecond
/// precision, so lexicographic comparison matches chronological order.
pub(crate) fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
