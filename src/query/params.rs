//! Query parameter types and normalization
//!
//! Pagination and sorting inputs arrive untyped and hostile; the
//! validators here clamp them into a fixed safe range and fall back
//! to defaults instead of erroring. Re-applying a validator to its
//! own output is a no-op.

use serde::{Deserialize, Serialize};

use crate::filter::DynamicFilter;

/// Default page number.
pub const DEFAULT_PAGE: u32 = 1;
/// Default page size.
pub const DEFAULT_LIMIT: u32 = 10;
/// Upper bound on page size.
pub const MAX_LIMIT: u32 = 100;
/// Upper bound on advanced-search terms.
pub const MAX_SEARCH_TERMS: usize = 10;
/// Upper bound on advanced-search type filters.
pub const MAX_TYPES: usize = 20;

/// Basic record listing filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFilters {
    /// Restrict to one record type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    /// Inclusive lower bound on the creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,
    /// Inclusive upper bound on the creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,
    /// Free-text search term.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dynamic_filters: Vec<DynamicFilter>,
    /// Include soft-deleted records. Off by default.
    #[serde(default)]
    pub include_deleted: bool,
}

/// Multi-term advanced search input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedSearchParams {
    #[serde(default)]
    pub search_terms: Vec<String>,
    #[serde(rename = "types", default)]
    pub record_types: Vec<String>,
    /// `true`: every term must match somewhere (AND of per-term OR
    /// groups). `false`: any term's sub-condition suffices (one
    /// flattened OR group).
    #[serde(default)]
    pub exact_match: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,
}

/// Validated pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    /// Clamps raw pagination input into the accepted range.
    ///
    /// `page = max(1, floor(page))`, `limit` additionally capped at
    /// `MAX_LIMIT`. Non-finite or zero input falls back to the
    /// defaults.
    pub fn validate(page: Option<f64>, limit: Option<f64>) -> Self {
        Self {
            page: floor_or(page, DEFAULT_PAGE).max(1.0) as u32,
            limit: floor_or(limit, DEFAULT_LIMIT).clamp(1.0, f64::from(MAX_LIMIT)) as u32,
        }
    }

    /// Number of records to skip.
    #[inline]
    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

fn floor_or(input: Option<f64>, default: u32) -> f64 {
    match input.map(f64::floor) {
        Some(v) if v.is_finite() && v != 0.0 => v,
        _ => f64::from(default),
    }
}

/// Sortable record columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Type,
    Id,
}

impl SortField {
    /// Parses an allow-listed column name.
    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "createdAt" => Some(SortField::CreatedAt),
            "updatedAt" => Some(SortField::UpdatedAt),
            "type" => Some(SortField::Type),
            "id" => Some(SortField::Id),
            _ => None,
        }
    }

    /// Column name this field sorts on.
    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "createdAt",
            SortField::UpdatedAt => "updatedAt",
            SortField::Type => "type",
            SortField::Id => "id",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Validated sort specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sorting {
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl Sorting {
    /// Validates raw sort input against the allow-list.
    ///
    /// Anything unrecognized falls back to `createdAt`/`desc`.
    pub fn validate(sort_by: Option<&str>, sort_order: Option<&str>) -> Self {
        Self {
            sort_by: sort_by
                .and_then(SortField::parse)
                .unwrap_or(SortField::CreatedAt),
            sort_order: sort_order
                .and_then(SortOrder::parse)
                .unwrap_or(SortOrder::Desc),
        }
    }
}

impl Default for Sorting {
    fn default() -> Self {
        Self {
            sort_by: SortField::CreatedAt,
            sort_order: SortOrder::Desc,
        }
    }
}
