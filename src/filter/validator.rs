//! Filter and search-term validation
//!
//! Validation runs before compilation and is deterministic and
//! non-mutating; sanitization produces a bounded, well-formed input
//! set for the query assembler.

use serde_json::Value;

use super::ast::DynamicFilter;
use super::errors::FilterResult;

/// Maximum accepted length of a filter field reference.
pub const MAX_FIELD_LEN: usize = 100;
/// Maximum number of filters kept after sanitization.
pub const MAX_FILTERS: usize = 50;
/// Minimum trimmed length of a usable search term.
pub const MIN_SEARCH_TERM_LEN: usize = 2;
/// Maximum raw length of a search term.
pub const MAX_SEARCH_TERM_LEN: usize = 200;

/// Parses a raw JSON filter list at the DSL boundary.
///
/// An unknown operator name or a structurally malformed filter is a
/// validation error here; dropping individually invalid-but-parseable
/// filters happens later in `sanitize_filters`.
pub fn parse_filters(value: Value) -> FilterResult<Vec<DynamicFilter>> {
    Ok(serde_json::from_value(value)?)
}

/// Checks a single filter for well-formedness.
///
/// The operator whitelist is enforced by the `Operator` type at the
/// deserialization boundary; what remains is the field shape and the
/// null-value rule.
pub fn validate_filter(filter: &DynamicFilter) -> bool {
    if filter.field.is_empty() || filter.field.len() > MAX_FIELD_LEN {
        return false;
    }
    !filter.value.is_null()
}

/// Drops invalid filters and bounds the surviving list.
///
/// First-wins: order is preserved and the list is truncated to
/// `MAX_FILTERS`, keeping predicate trees bounded.
pub fn sanitize_filters(filters: Vec<DynamicFilter>) -> Vec<DynamicFilter> {
    filters
        .into_iter()
        .filter(validate_filter)
        .take(MAX_FILTERS)
        .collect()
}

/// A term is usable iff its trimmed length is at least
/// `MIN_SEARCH_TERM_LEN` and its raw length at most
/// `MAX_SEARCH_TERM_LEN`.
pub fn is_valid_search_term(term: &str) -> bool {
    term.trim().chars().count() >= MIN_SEARCH_TERM_LEN
        && term.chars().count() <= MAX_SEARCH_TERM_LEN
}

/// Normalizes a search term: trim, strip `<` and `>`, truncate.
pub fn sanitize_search_term(term: &str) -> String {
    term.trim()
        .chars()
        .filter(|c| *c != '<' && *c != '>')
        .take(MAX_SEARCH_TERM_LEN)
        .collect()
}
