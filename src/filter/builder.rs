//! Filter condition compilation
//!
//! Pure translation of a single validated filter into a predicate
//! node. The column/path split happens here: a `field` containing `.`
//! addresses a nested location inside a JSON column, anything else is
//! a direct record-level column.

use serde_json::Value;

use super::ast::{CompareOp, DynamicFilter, FieldCondition, FieldTarget, Operator, PredicateNode};

/// Compiles one filter into a predicate node.
///
/// Operand types incompatible with the operator (ordering on a bool,
/// text matching on a number, `in` with a non-array) compile to the
/// empty-matching node rather than an error.
pub fn compile_condition(filter: &DynamicFilter) -> PredicateNode {
    let target = resolve_target(&filter.field);

    let op = match filter.operator {
        Operator::Eq => CompareOp::Eq(filter.value.clone()),
        Operator::Neq => CompareOp::Neq(filter.value.clone()),
        Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => {
            if !is_comparable(&filter.value) {
                return PredicateNode::Nothing;
            }
            match filter.operator {
                Operator::Gt => CompareOp::Gt(filter.value.clone()),
                Operator::Gte => CompareOp::Gte(filter.value.clone()),
                Operator::Lt => CompareOp::Lt(filter.value.clone()),
                _ => CompareOp::Lte(filter.value.clone()),
            }
        }
        Operator::Contains | Operator::StartsWith | Operator::EndsWith => {
            let needle = match filter.value.as_str() {
                Some(s) => s.to_string(),
                None => return PredicateNode::Nothing,
            };
            match filter.operator {
                Operator::Contains => CompareOp::Contains(needle),
                Operator::StartsWith => CompareOp::StartsWith(needle),
                _ => CompareOp::EndsWith(needle),
            }
        }
        Operator::In => match filter.value.as_array() {
            Some(items) => CompareOp::In(items.clone()),
            None => return PredicateNode::Nothing,
        },
    };

    PredicateNode::Condition(FieldCondition::new(target, op))
}

/// Splits a field reference into its addressing target.
///
/// The first `.`-separated segment names the JSON column; the
/// remaining segments form the path into that column's value.
fn resolve_target(field: &str) -> FieldTarget {
    match field.split_once('.') {
        Some((column, rest)) => FieldTarget::JsonPath {
            column: column.to_string(),
            path: rest.split('.').map(str::to_string).collect(),
        },
        None => FieldTarget::Column(field.to_string()),
    }
}

/// Ordering comparisons are defined for numbers and strings only.
fn is_comparable(value: &Value) -> bool {
    value.is_number() || value.is_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_direct_column_equality() {
        let filter = DynamicFilter::new("type", Operator::Eq, json!("report"));
        let node = compile_condition(&filter);

        assert_eq!(
            node,
            PredicateNode::Condition(FieldCondition::new(
                FieldTarget::column("type"),
                CompareOp::Eq(json!("report")),
            ))
        );
    }

    #[test]
    fn test_dotted_field_compiles_to_json_path() {
        let filter = DynamicFilter::new("data.priority", Operator::Eq, json!("high"));
        let node = compile_condition(&filter);

        assert_eq!(
            node,
            PredicateNode::Condition(FieldCondition::new(
                FieldTarget::json_path("data", vec!["priority".to_string()]),
                CompareOp::Eq(json!("high")),
            ))
        );
    }

    #[test]
    fn test_multi_segment_path_splits_on_first_dot() {
        let filter = DynamicFilter::new("data.address.city", Operator::Eq, json!("Oslo"));
        let node = compile_condition(&filter);

        match node {
            PredicateNode::Condition(cond) => assert_eq!(
                cond.target,
                FieldTarget::json_path(
                    "data",
                    vec!["address".to_string(), "city".to_string()]
                )
            ),
            other => panic!("Expected condition, got {:?}", other),
        }
    }

    #[test]
    fn test_ordering_on_number() {
        let filter = DynamicFilter::new("data.score", Operator::Gte, json!(10));
        let node = compile_condition(&filter);

        match node {
            PredicateNode::Condition(cond) => {
                assert_eq!(cond.op, CompareOp::Gte(json!(10)));
            }
            other => panic!("Expected condition, got {:?}", other),
        }
    }

    #[test]
    fn test_ordering_on_incompatible_type_matches_nothing() {
        let filter = DynamicFilter::new("data.flag", Operator::Gt, json!(true));
        assert!(compile_condition(&filter).is_nothing());

        let filter = DynamicFilter::new("data.items", Operator::Lt, json!([1, 2]));
        assert!(compile_condition(&filter).is_nothing());
    }

    #[test]
    fn test_text_operators_require_string_value() {
        let filter = DynamicFilter::new("type", Operator::Contains, json!("rep"));
        match compile_condition(&filter) {
            PredicateNode::Condition(cond) => {
                assert_eq!(cond.op, CompareOp::Contains("rep".to_string()));
            }
            other => panic!("Expected condition, got {:?}", other),
        }

        let filter = DynamicFilter::new("type", Operator::StartsWith, json!(42));
        assert!(compile_condition(&filter).is_nothing());
    }

    #[test]
    fn test_in_requires_array_value() {
        let filter = DynamicFilter::new("type", Operator::In, json!(["a", "b"]));
        match compile_condition(&filter) {
            PredicateNode::Condition(cond) => {
                assert_eq!(cond.op, CompareOp::In(vec![json!("a"), json!("b")]));
            }
            other => panic!("Expected condition, got {:?}", other),
        }

        let filter = DynamicFilter::new("type", Operator::In, json!("a"));
        assert!(compile_condition(&filter).is_nothing());
    }

    #[test]
    fn test_compile_is_pure() {
        let filter = DynamicFilter::new("data.priority", Operator::Eq, json!("high"));
        assert_eq!(compile_condition(&filter), compile_condition(&filter));
    }
}
