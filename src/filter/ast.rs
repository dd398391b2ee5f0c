//! Filter and predicate AST structures
//!
//! Defines the user-facing filter DSL and the predicate tree it
//! compiles into. The tree is never executed here; it is handed to a
//! store adapter for translation into the adapter's native query form.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Filter operator whitelist.
///
/// Closed enum: an operator string outside the whitelist fails
/// deserialization. There is no silent "contributes no constraint"
/// path for unknown operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    StartsWith,
    EndsWith,
    In,
}

impl Operator {
    /// Returns the wire name of the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Contains => "contains",
            Operator::StartsWith => "startsWith",
            Operator::EndsWith => "endsWith",
            Operator::In => "in",
        }
    }

    /// Returns true for the ordering comparisons.
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte
        )
    }

    /// Returns true for the case-insensitive text operators.
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            Operator::Contains | Operator::StartsWith | Operator::EndsWith
        )
    }
}

/// A single user-supplied filter.
///
/// `field` containing `.` denotes a path into a JSON column: the
/// first segment is the column name, the remainder is the path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicFilter {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

impl DynamicFilter {
    pub fn new(field: impl Into<String>, operator: Operator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }
}

/// Where a condition looks for its operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldTarget {
    /// A record-level column.
    Column(String),
    /// A path into a JSON column's value.
    JsonPath { column: String, path: Vec<String> },
}

impl FieldTarget {
    pub fn column(name: impl Into<String>) -> Self {
        FieldTarget::Column(name.into())
    }

    pub fn json_path(column: impl Into<String>, path: Vec<String>) -> Self {
        FieldTarget::JsonPath {
            column: column.into(),
            path,
        }
    }
}

/// Comparison carried by a field condition.
///
/// Text comparisons are case-insensitive and only match string
/// values. `IsNull` is assembler-internal (live-record constraint);
/// it is not reachable from the user operator whitelist.
#[derive(Debug, Clone, PartialEq)]
pub enum CompareOp {
    Eq(Value),
    Neq(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    Contains(String),
    StartsWith(String),
    EndsWith(String),
    In(Vec<Value>),
    IsNull,
}

impl CompareOp {
    /// Returns the operation name for diagnostics.
    pub fn op_name(&self) -> &'static str {
        match self {
            CompareOp::Eq(_) => "eq",
            CompareOp::Neq(_) => "neq",
            CompareOp::Gt(_) => "gt",
            CompareOp::Gte(_) => "gte",
            CompareOp::Lt(_) => "lt",
            CompareOp::Lte(_) => "lte",
            CompareOp::Contains(_) => "contains",
            CompareOp::StartsWith(_) => "startsWith",
            CompareOp::EndsWith(_) => "endsWith",
            CompareOp::In(_) => "in",
            CompareOp::IsNull => "isNull",
        }
    }
}

/// A predicate targeting one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCondition {
    pub target: FieldTarget,
    pub op: CompareOp,
}

impl FieldCondition {
    pub fn new(target: FieldTarget, op: CompareOp) -> Self {
        Self { target, op }
    }

    /// Equality on a record-level column.
    pub fn column_eq(column: impl Into<String>, value: Value) -> Self {
        Self::new(FieldTarget::column(column), CompareOp::Eq(value))
    }

    /// Case-insensitive substring match on a record-level column.
    pub fn column_contains(column: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::new(FieldTarget::column(column), CompareOp::Contains(needle.into()))
    }

    /// Null check on a record-level column.
    pub fn column_is_null(column: impl Into<String>) -> Self {
        Self::new(FieldTarget::column(column), CompareOp::IsNull)
    }
}

/// Backend-agnostic predicate tree.
///
/// `And([])` matches every record. `Nothing` matches no record; it is
/// produced when a filter's operand type is incompatible with its
/// operator (ordering on a bool, membership with a non-array).
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateNode {
    Condition(FieldCondition),
    Not(Box<PredicateNode>),
    And(Vec<PredicateNode>),
    Or(Vec<PredicateNode>),
    Nothing,
}

impl PredicateNode {
    pub fn condition(condition: FieldCondition) -> Self {
        PredicateNode::Condition(condition)
    }

    pub fn negate(node: PredicateNode) -> Self {
        PredicateNode::Not(Box::new(node))
    }

    pub fn and(children: Vec<PredicateNode>) -> Self {
        PredicateNode::And(children)
    }

    pub fn or(children: Vec<PredicateNode>) -> Self {
        PredicateNode::Or(children)
    }

    /// Returns true if this node can never match any record.
    pub fn is_nothing(&self) -> bool {
        matches!(self, PredicateNode::Nothing)
    }
}
