//! Predicate tree assembly
//!
//! Builds one predicate tree from basic filters or advanced search
//! input. Composition rules:
//! - the root is an AND group, live-records constraint first;
//! - free-text search ORs a type-column match with a payload match;
//! - `exact_match` switches between AND-of-OR-groups (every term must
//!   match somewhere) and one flattened OR group (any sub-condition
//!   suffices);
//! - merge helpers append without deduplication and preserve
//!   insertion order so assembled trees are reproducible.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use super::errors::{QueryError, QueryResult};
use super::params::{AdvancedSearchParams, RecordFilters, MAX_SEARCH_TERMS, MAX_TYPES};
use crate::filter::{
    compile_condition, is_valid_search_term, sanitize_filters, sanitize_search_term, CompareOp,
    FieldCondition, FieldTarget, PredicateNode,
};
use crate::record::format_ts;

/// JSON column holding the schemaless payload.
const DATA_COLUMN: &str = "data";
/// Payload field searched by free-text terms.
const SEARCH_CONTENT_FIELD: &str = "content";

/// Assembles the predicate tree for a basic record listing.
///
/// Always constrains to live records unless `include_deleted` is set.
/// Unparseable date bounds are an error, never silently dropped.
pub fn build_query(filters: &RecordFilters) -> QueryResult<PredicateNode> {
    let mut root = Vec::new();

    if !filters.include_deleted {
        root.push(PredicateNode::Condition(FieldCondition::column_is_null(
            "deletedAt",
        )));
    }

    if let Some(record_type) = &filters.record_type {
        root.push(PredicateNode::Condition(FieldCondition::column_eq(
            "type",
            Value::String(record_type.clone()),
        )));
    }

    if let Some(created_by) = &filters.created_by {
        root.push(PredicateNode::Condition(FieldCondition::column_eq(
            "createdBy",
            Value::String(created_by.clone()),
        )));
    }

    push_date_range(
        &mut root,
        filters.date_from.as_deref(),
        filters.date_to.as_deref(),
    )?;

    if let Some(search) = &filters.search {
        let term = sanitize_search_term(search);
        if is_valid_search_term(&term) {
            root.push(PredicateNode::Or(search_conditions(&term)));
        }
    }

    for filter in sanitize_filters(filters.dynamic_filters.clone()) {
        root.push(compile_condition(&filter));
    }

    Ok(PredicateNode::And(root))
}

/// Assembles the predicate tree for a multi-term advanced search.
///
/// Terms are sanitized, invalid ones dropped, and the survivors
/// capped at `MAX_SEARCH_TERMS`; type filters are capped at
/// `MAX_TYPES` and expressed as one membership condition.
pub fn build_advanced_query(params: &AdvancedSearchParams) -> QueryResult<PredicateNode> {
    let mut root = vec![PredicateNode::Condition(FieldCondition::column_is_null(
        "deletedAt",
    ))];

    let types: Vec<Value> = params
        .record_types
        .iter()
        .take(MAX_TYPES)
        .map(|t| Value::String(t.clone()))
        .collect();
    if !types.is_empty() {
        root.push(PredicateNode::Condition(FieldCondition::new(
            FieldTarget::column("type"),
            CompareOp::In(types),
        )));
    }

    let terms: Vec<String> = params
        .search_terms
        .iter()
        .map(|t| sanitize_search_term(t))
        .filter(|t| is_valid_search_term(t))
        .take(MAX_SEARCH_TERMS)
        .collect();

    if !terms.is_empty() {
        if params.exact_match {
            // Every term must match somewhere: independent OR groups,
            // all AND'd at the root.
            for term in &terms {
                root.push(PredicateNode::Or(search_conditions(term)));
            }
        } else {
            // Any term's any sub-condition suffices: one flattened OR
            // group holding every sub-condition of every term.
            let mut group = PredicateNode::Or(Vec::new());
            for term in &terms {
                merge_or(&mut group, search_conditions(term));
            }
            root.push(group);
        }
    }

    push_date_range(
        &mut root,
        params.date_from.as_deref(),
        params.date_to.as_deref(),
    )?;

    Ok(PredicateNode::And(root))
}

/// Appends conditions to an OR group without deduplication.
///
/// A non-OR node is first wrapped into an OR group holding itself.
/// Insertion order is preserved.
pub fn merge_or(node: &mut PredicateNode, additions: Vec<PredicateNode>) {
    match node {
        PredicateNode::Or(children) => children.extend(additions),
        other => {
            let existing = std::mem::replace(other, PredicateNode::Or(Vec::new()));
            let mut children = vec![existing];
            children.extend(additions);
            *other = PredicateNode::Or(children);
        }
    }
}

/// Appends conditions to an AND group without deduplication.
pub fn merge_and(node: &mut PredicateNode, additions: Vec<PredicateNode>) {
    match node {
        PredicateNode::And(children) => children.extend(additions),
        other => {
            let existing = std::mem::replace(other, PredicateNode::And(Vec::new()));
            let mut children = vec![existing];
            children.extend(additions);
            *other = PredicateNode::And(children);
        }
    }
}

/// The two sub-conditions a search term expands to: a
/// case-insensitive match on the type column and on the designated
/// payload content field.
fn search_conditions(term: &str) -> Vec<PredicateNode> {
    vec![
        PredicateNode::Condition(FieldCondition::column_contains("type", term)),
        PredicateNode::Condition(FieldCondition::new(
            FieldTarget::json_path(DATA_COLUMN, vec![SEARCH_CONTENT_FIELD.to_string()]),
            CompareOp::Contains(term.to_string()),
        )),
    ]
}

fn push_date_range(
    root: &mut Vec<PredicateNode>,
    date_from: Option<&str>,
    date_to: Option<&str>,
) -> QueryResult<()> {
    if let Some(input) = date_from {
        let ts = parse_date("dateFrom", input)?;
        root.push(PredicateNode::Condition(FieldCondition::new(
            FieldTarget::column("createdAt"),
            CompareOp::Gte(Value::String(format_ts(&ts))),
        )));
    }
    if let Some(input) = date_to {
        let ts = parse_date("dateTo", input)?;
        root.push(PredicateNode::Condition(FieldCondition::new(
            FieldTarget::column("createdAt"),
            CompareOp::Lte(Value::String(format_ts(&ts))),
        )));
    }
    Ok(())
}

/// Parses a date bound: RFC 3339, or a bare `YYYY-MM-DD` taken as
/// midnight UTC.
fn parse_date(field: &str, input: &str) -> QueryResult<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(date) = input.parse::<NaiveDate>() {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(QueryError::malformed_date(field, input))
}
