//! Query assembly
//!
//! Combines record filters, date ranges, free-text search, and
//! dynamic filters into a single predicate tree, and validates the
//! pagination and sorting parameters that accompany a query. The
//! assembler never executes anything; the finished tree is handed to
//! a store adapter.

mod assembler;
pub mod errors;
mod params;

pub use assembler::{build_advanced_query, build_query, merge_and, merge_or};
pub use params::{
    AdvancedSearchParams, Pagination, RecordFilters, SortField, SortOrder, Sorting,
    DEFAULT_LIMIT, DEFAULT_PAGE, MAX_LIMIT, MAX_SEARCH_TERMS, MAX_TYPES,
};
