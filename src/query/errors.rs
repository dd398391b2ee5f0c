//! Query assembly error types

use thiserror::Error;

/// Result type for query assembly
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors raised while assembling a query
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    /// A date bound could not be parsed. Never silently ignored.
    #[error("Malformed date in '{field}': '{input}'")]
    MalformedDate { field: String, input: String },

    /// Query input was malformed
    #[error("Invalid query: {0}")]
    Validation(String),
}

impl QueryError {
    pub fn malformed_date(field: impl Into<String>, input: impl Into<String>) -> Self {
        Self::MalformedDate {
            field: field.into(),
            input: input.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
