//! Error types for pgquery

use thiserror::Error;

/// Result type alias for pgquery operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors raised while building, compiling, or running a query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// No declared relation links the two tables
    #[error("No relation declared between '{from}' and '{to}'")]
    RelationNotFound { from: String, to: String },

    /// Condition built on a column the bound table does not have
    #[error("Invalid field '{field}' for table '{table}'")]
    InvalidField { table: String, field: String },

    /// Bound value does not fit the column's scalar kind
    #[error("Type mismatch on '{field}': expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    /// Table is not part of the schema
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// Malformed identifier or builder input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Schema input could not be decoded
    #[error("Schema error: {0}")]
    Schema(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Query timeout error
    #[error("Query timeout after {0:?}")]
    Timeout(std::time::Duration),
}

impl QueryError {
    /// Create a relation-not-found error for a join request.
    pub fn relation_not_found(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::RelationNotFound {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create an invalid-field error.
    pub fn invalid_field(table: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidField {
            table: table.into(),
            field: field.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Check if this is a relation-not-found error
    pub fn is_relation_not_found(&self) -> bool {
        matches!(self, Self::RelationNotFound { .. })
    }

    /// Check if this is an invalid-field error
    pub fn is_invalid_field(&self) -> bool {
        matches!(self, Self::InvalidField { .. })
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Schema(err.to_string())
    }
}
