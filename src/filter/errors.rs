//! Filter error types

use thiserror::Error;

/// Result type for filter operations
pub type FilterResult<T> = Result<T, FilterError>;

/// Errors raised at the filter DSL boundary
#[derive(Debug, Clone, Error)]
pub enum FilterError {
    /// Filter input was malformed (bad field, unknown operator, null value)
    #[error("Invalid filter: {0}")]
    Validation(String),
}

impl FilterError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<serde_json::Error> for FilterError {
    fn from(e: serde_json::Error) -> Self {
        Self::Validation(e.to_string())
    }
}
