//! In-memory record store
//!
//! Reference adapter: evaluates predicate trees directly against
//! records. Matching is strict; a missing field or an operand type
//! incompatible with the comparison never matches. Sorting is stable
//! and deterministic.
//!
//! The write lock over the record map is the critical section that
//! makes the conditional write's compare-and-swap atomic: of two
//! racing writers carrying the same expected version, exactly one
//! observes `Applied`.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use super::patch::RecordPatch;
use super::{ConditionalWrite, Page, RecordStore};
use crate::filter::{CompareOp, FieldCondition, FieldTarget, PredicateNode};
use crate::query::{Pagination, SortOrder, Sorting};
use crate::record::{get_path, DataRecord};

/// Thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, DataRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, deleted ones included.
    pub fn len(&self) -> usize {
        self.records.read().expect("store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Marks a record soft-deleted. The record stays addressable; live
    /// queries stop matching it.
    pub fn soft_delete(&self, id: &str) -> StoreResult<DataRecord> {
        let mut records = self.records.write().expect("store lock poisoned");
        let record = records
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(id))?;
        record.deleted_at = Some(Utc::now());
        record.updated_at = Utc::now();
        record.metadata.version += 1;
        Ok(record.clone())
    }
}

impl RecordStore for MemoryStore {
    fn insert(&self, record: DataRecord) -> StoreResult<()> {
        let mut records = self.records.write().expect("store lock poisoned");
        if records.contains_key(&record.id) {
            return Err(StoreError::duplicate(&record.id));
        }
        records.insert(record.id.clone(), record);
        Ok(())
    }

    fn get_by_id(&self, id: &str) -> StoreResult<Option<DataRecord>> {
        let records = self.records.read().expect("store lock poisoned");
        Ok(records.get(id).cloned())
    }

    fn find(
        &self,
        predicate: &PredicateNode,
        pagination: &Pagination,
        sorting: &Sorting,
    ) -> StoreResult<Page> {
        let records = self.records.read().expect("store lock poisoned");

        let mut matched: Vec<DataRecord> = records
            .values()
            .filter(|record| matches(record, predicate))
            .cloned()
            .collect();
        drop(records);

        sort_records(&mut matched, sorting);
        let total = matched.len();

        let items = matched
            .into_iter()
            .skip(pagination.offset())
            .take(pagination.limit as usize)
            .collect();

        Ok(Page { items, total })
    }

    fn write(
        &self,
        id: &str,
        patch: &RecordPatch,
        expected_version: u64,
    ) -> StoreResult<ConditionalWrite> {
        let mut records = self.records.write().expect("store lock poisoned");
        let record = records
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(id))?;

        if record.metadata.version != expected_version {
            return Ok(ConditionalWrite::VersionMismatch {
                current_version: record.metadata.version,
                current: record.clone(),
            });
        }

        apply_patch(record, patch);
        record.metadata.version += 1;
        Ok(ConditionalWrite::Applied(record.clone()))
    }

    fn write_forced(&self, id: &str, patch: &RecordPatch) -> StoreResult<DataRecord> {
        let mut records = self.records.write().expect("store lock poisoned");
        let record = records
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(id))?;

        apply_patch(record, patch);
        record.metadata.version += 1;
        Ok(record.clone())
    }
}

/// Applies a patch in place. The version counter is untouched here;
/// the caller owns the increment.
fn apply_patch(record: &mut DataRecord, patch: &RecordPatch) {
    if let Some(record_type) = &patch.record_type {
        record.record_type = record_type.clone();
    }
    if let Some(data) = &patch.data {
        record.data = data.clone();
    }
    if let Some(metadata) = &patch.metadata {
        let version = record.metadata.version;
        record.metadata = metadata.clone();
        record.metadata.version = version;
    }
    if let Some(updated_by) = &patch.updated_by {
        record.updated_by = updated_by.clone();
    }
    record.updated_at = Utc::now();
}

/// Checks if a record matches a predicate tree.
///
/// An empty AND group matches everything; `Nothing` matches no
/// record.
pub(crate) fn matches(record: &DataRecord, node: &PredicateNode) -> bool {
    match node {
        PredicateNode::Condition(condition) => matches_condition(record, condition),
        PredicateNode::Not(inner) => !matches(record, inner),
        PredicateNode::And(children) => children.iter().all(|child| matches(record, child)),
        PredicateNode::Or(children) => children.iter().any(|child| matches(record, child)),
        PredicateNode::Nothing => false,
    }
}

fn matches_condition(record: &DataRecord, condition: &FieldCondition) -> bool {
    let value = resolve_target(record, &condition.target);

    if let CompareOp::IsNull = condition.op {
        return value.map_or(true, |v| v.is_null());
    }

    // Missing fields and nulls never match a concrete comparison.
    let actual = match value {
        Some(v) if !v.is_null() => v,
        _ => return false,
    };

    match &condition.op {
        CompareOp::Eq(expected) => actual == *expected,
        CompareOp::Neq(expected) => actual != *expected,
        CompareOp::Gt(bound) => compare(&actual, bound) == Some(Ordering::Greater),
        CompareOp::Gte(bound) => {
            matches!(compare(&actual, bound), Some(Ordering::Greater | Ordering::Equal))
        }
        CompareOp::Lt(bound) => compare(&actual, bound) == Some(Ordering::Less),
        CompareOp::Lte(bound) => {
            matches!(compare(&actual, bound), Some(Ordering::Less | Ordering::Equal))
        }
        CompareOp::Contains(needle) => text_match(&actual, needle, |h, n| h.contains(n)),
        CompareOp::StartsWith(needle) => text_match(&actual, needle, |h, n| h.starts_with(n)),
        CompareOp::EndsWith(needle) => text_match(&actual, needle, |h, n| h.ends_with(n)),
        CompareOp::In(items) => items.contains(&actual),
        CompareOp::IsNull => unreachable!("handled above"),
    }
}

fn resolve_target(record: &DataRecord, target: &FieldTarget) -> Option<Value> {
    match target {
        FieldTarget::Column(name) => record.column_value(name),
        FieldTarget::JsonPath { column, path } => {
            let value = record.column_value(column)?;
            get_path(&value, path).cloned()
        }
    }
}

/// Ordering comparison: numbers compare numerically, strings
/// lexicographically. Anything else is incomparable and never
/// matches.
fn compare(actual: &Value, bound: &Value) -> Option<Ordering> {
    match (actual, bound) {
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(af), Some(bf)) = (a.as_f64(), b.as_f64()) {
                return af.partial_cmp(&bf);
            }
            if let (Some(ai), Some(bi)) = (a.as_i64(), b.as_i64()) {
                return Some(ai.cmp(&bi));
            }
            None
        }
        (Value::String(a), Value::String(b)) => Some(a.as_str().cmp(b.as_str())),
        _ => None,
    }
}

/// Case-insensitive text matching on string values only.
fn text_match(actual: &Value, needle: &str, check: fn(&str, &str) -> bool) -> bool {
    match actual.as_str() {
        Some(haystack) => check(&haystack.to_lowercase(), &needle.to_lowercase()),
        None => false,
    }
}

/// Stable, deterministic sort by the validated sort column.
fn sort_records(records: &mut [DataRecord], sorting: &Sorting) {
    let column = sorting.sort_by.column();
    records.sort_by(|a, b| {
        let ordering = compare_sort_values(
            a.column_value(column).as_ref(),
            b.column_value(column).as_ref(),
        );
        match sorting.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

/// Total order over JSON values for sorting: absent < null < bool <
/// number < string; same-type values compare naturally.
fn compare_sort_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let type_order = |v: &Value| -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    };

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a_val), Some(b_val)) => {
            let a_type = type_order(a_val);
            let b_type = type_order(b_val);
            if a_type != b_type {
                return a_type.cmp(&b_type);
            }
            match (a_val, b_val) {
                (Value::Bool(a_b), Value::Bool(b_b)) => a_b.cmp(b_b),
                (Value::Number(a_n), Value::Number(b_n)) => {
                    let a_f = a_n.as_f64().unwrap_or(0.0);
                    let b_f = b_n.as_f64().unwrap_or(0.0);
                    a_f.partial_cmp(&b_f).unwrap_or(Ordering::Equal)
                }
                (Value::String(a_s), Value::String(b_s)) => a_s.cmp(b_s),
                _ => Ordering::Equal,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{compile_condition, DynamicFilter, Operator};
    use serde_json::{json, Map};

    fn record_with(record_type: &str, data: serde_json::Value) -> DataRecord {
        let data = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        DataRecord::new(record_type, data, "tester")
    }

    fn filter_node(field: &str, operator: Operator, value: serde_json::Value) -> PredicateNode {
        compile_condition(&DynamicFilter::new(field, operator, value))
    }

    #[test]
    fn test_insert_and_get() {
        let store = MemoryStore::new();
        let record = record_with("report", json!({"content": "x"}));
        let id = record.id.clone();

        store.insert(record).unwrap();
        assert!(store.get_by_id(&id).unwrap().is_some());
        assert!(store.get_by_id("missing").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let store = MemoryStore::new();
        let record = record_with("report", json!({}));
        store.insert(record.clone()).unwrap();

        let result = store.insert(record);
        assert!(matches!(result, Err(StoreError::DuplicateId(_))));
    }

    #[test]
    fn test_direct_column_match() {
        let record = record_with("report", json!({}));
        let node = filter_node("type", Operator::Eq, json!("report"));
        assert!(matches(&record, &node));

        let node = filter_node("type", Operator::Eq, json!("invoice"));
        assert!(!matches(&record, &node));
    }

    #[test]
    fn test_json_path_match() {
        let record = record_with("report", json!({"priority": "high"}));
        let node = filter_node("data.priority", Operator::Eq, json!("high"));
        assert!(matches(&record, &node));

        let node = filter_node("data.priority", Operator::Eq, json!("low"));
        assert!(!matches(&record, &node));
    }

    #[test]
    fn test_missing_field_never_matches() {
        let record = record_with("report", json!({}));
        let node = filter_node("data.priority", Operator::Eq, json!("high"));
        assert!(!matches(&record, &node));

        let node = filter_node("data.priority", Operator::Neq, json!("high"));
        assert!(!matches(&record, &node));
    }

    #[test]
    fn test_no_type_coercion() {
        let record = record_with("report", json!({"count": 123}));
        let node = filter_node("data.count", Operator::Eq, json!("123"));
        assert!(!matches(&record, &node));

        let node = filter_node("data.count", Operator::Eq, json!(123));
        assert!(matches(&record, &node));
    }

    #[test]
    fn test_ordering_comparisons() {
        let record = record_with("report", json!({"score": 25}));

        assert!(matches(&record, &filter_node("data.score", Operator::Gte, json!(18))));
        assert!(matches(&record, &filter_node("data.score", Operator::Lte, json!(25))));
        assert!(!matches(&record, &filter_node("data.score", Operator::Gt, json!(25))));
        assert!(!matches(&record, &filter_node("data.score", Operator::Lt, json!(25))));
    }

    #[test]
    fn test_ordering_incompatible_runtime_type_never_matches() {
        // The bound compiles (it is a number) but the stored value is
        // a string: incomparable, no match.
        let record = record_with("report", json!({"score": "high"}));
        assert!(!matches(&record, &filter_node("data.score", Operator::Gt, json!(10))));
    }

    #[test]
    fn test_text_operators_case_insensitive() {
        let record = record_with("report", json!({"content": "Quarterly Summary"}));

        assert!(matches(
            &record,
            &filter_node("data.content", Operator::Contains, json!("quarterly"))
        ));
        assert!(matches(
            &record,
            &filter_node("data.content", Operator::StartsWith, json!("qUaRt"))
        ));
        assert!(matches(
            &record,
            &filter_node("data.content", Operator::EndsWith, json!("SUMMARY"))
        ));
        assert!(!matches(
            &record,
            &filter_node("data.content", Operator::Contains, json!("annual"))
        ));
    }

    #[test]
    fn test_membership() {
        let record = record_with("report", json!({}));
        assert!(matches(
            &record,
            &filter_node("type", Operator::In, json!(["invoice", "report"]))
        ));
        assert!(!matches(
            &record,
            &filter_node("type", Operator::In, json!(["invoice"]))
        ));
    }

    #[test]
    fn test_not_and_or_composition() {
        let record = record_with("report", json!({"priority": "high"}));

        let node = PredicateNode::negate(filter_node("type", Operator::Eq, json!("invoice")));
        assert!(matches(&record, &node));

        let node = PredicateNode::or(vec![
            filter_node("type", Operator::Eq, json!("invoice")),
            filter_node("data.priority", Operator::Eq, json!("high")),
        ]);
        assert!(matches(&record, &node));

        let node = PredicateNode::and(vec![
            filter_node("type", Operator::Eq, json!("invoice")),
            filter_node("data.priority", Operator::Eq, json!("high")),
        ]);
        assert!(!matches(&record, &node));
    }

    #[test]
    fn test_nothing_matches_no_record() {
        let record = record_with("report", json!({}));
        assert!(!matches(&record, &PredicateNode::Nothing));
        assert!(matches(&record, &PredicateNode::and(vec![])));
    }

    #[test]
    fn test_is_null_matches_live_records() {
        let store = MemoryStore::new();
        let record = record_with("report", json!({}));
        let id = record.id.clone();
        store.insert(record).unwrap();

        let live = PredicateNode::Condition(FieldCondition::column_is_null("deletedAt"));
        let page = store
            .find(&live, &Pagination::default(), &Sorting::default())
            .unwrap();
        assert_eq!(page.total, 1);

        store.soft_delete(&id).unwrap();
        let page = store
            .find(&live, &Pagination::default(), &Sorting::default())
            .unwrap();
        assert_eq!(page.total, 0);
    }

    #[test]
    fn test_find_sorts_and_paginates() {
        let store = MemoryStore::new();
        for record_type in ["c", "a", "b", "d", "e"] {
            store.insert(record_with(record_type, json!({}))).unwrap();
        }

        let sorting = Sorting::validate(Some("type"), Some("asc"));
        let pagination = Pagination::validate(Some(1.0), Some(2.0));
        let page = store
            .find(&PredicateNode::and(vec![]), &pagination, &sorting)
            .unwrap();

        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].record_type, "a");
        assert_eq!(page.items[1].record_type, "b");

        let pagination = Pagination::validate(Some(3.0), Some(2.0));
        let page = store
            .find(&PredicateNode::and(vec![]), &pagination, &sorting)
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].record_type, "e");
    }

    #[test]
    fn test_conditional_write_applies_on_matching_version() {
        let store = MemoryStore::new();
        let record = record_with("report", json!({"content": "v1"}));
        let id = record.id.clone();
        store.insert(record).unwrap();

        let mut data = Map::new();
        data.insert("content".to_string(), json!("v2"));
        let patch = RecordPatch {
            data: Some(data),
            ..Default::default()
        };

        match store.write(&id, &patch, 1).unwrap() {
            ConditionalWrite::Applied(updated) => {
                assert_eq!(updated.version(), 2);
                assert_eq!(updated.data.get("content"), Some(&json!("v2")));
            }
            other => panic!("Expected applied, got {:?}", other),
        }
    }

    #[test]
    fn test_conditional_write_reports_mismatch() {
        let store = MemoryStore::new();
        let record = record_with("report", json!({}));
        let id = record.id.clone();
        store.insert(record).unwrap();

        store.write(&id, &RecordPatch::default(), 1).unwrap();

        match store.write(&id, &RecordPatch::default(), 1).unwrap() {
            ConditionalWrite::VersionMismatch {
                current_version, ..
            } => assert_eq!(current_version, 2),
            other => panic!("Expected mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_patch_version_is_ignored() {
        let store = MemoryStore::new();
        let record = record_with("report", json!({}));
        let id = record.id.clone();
        store.insert(record).unwrap();

        let mut metadata = crate::record::RecordMetadata::initial();
        metadata.version = 999;
        let patch = RecordPatch {
            metadata: Some(metadata),
            ..Default::default()
        };

        match store.write(&id, &patch, 1).unwrap() {
            ConditionalWrite::Applied(updated) => assert_eq!(updated.version(), 2),
            other => panic!("Expected applied, got {:?}", other),
        }
    }

    #[test]
    fn test_forced_write_always_wins() {
        let store = MemoryStore::new();
        let record = record_with("report", json!({}));
        let id = record.id.clone();
        store.insert(record).unwrap();

        store.write(&id, &RecordPatch::default(), 1).unwrap();
        let updated = store.write_forced(&id, &RecordPatch::default()).unwrap();
        assert_eq!(updated.version(), 3);
    }

    #[test]
    fn test_write_unknown_id_is_not_found() {
        let store = MemoryStore::new();
        let result = store.write("ghost", &RecordPatch::default(), 1);
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }
}
