//! Error types for the adherence core
//!
//! Malformed *data* never surfaces here: validation and generation report it
//! through [`ErrorRecord`](crate::report::ErrorRecord) lists. These errors
//! cover loading a schema document into the [`Schema`](crate::schema::Schema)
//! model.

use thiserror::Error;

/// Main error type for schema loading operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// The document is not a schema object
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// The document is not a parameter object
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// JSON parsing error
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl CoreError {
    /// Create an invalid schema error
    pub fn invalid_schema(msg: impl Into<String>) -> Self {
        CoreError::InvalidSchema(msg.into())
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        CoreError::InvalidParameter(msg.into())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::ParseError(format!("JSON error: {}", err))
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
