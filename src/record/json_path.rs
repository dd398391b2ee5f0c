//! JSON path addressing for schemaless payloads
//!
//! Walks object keys only. Array elements are not addressable by the
//! filter DSL, so a path segment landing on an array yields absent.

use serde_json::Value;

/// Resolves a path of object keys inside a JSON value.
///
/// Returns `None` if any segment is missing or the value at an
/// intermediate segment is not an object.
pub fn get_path<'a>(value: &'a Value, segments: &[String]) -> Option<&'a Value> {
    let mut current = value;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}
