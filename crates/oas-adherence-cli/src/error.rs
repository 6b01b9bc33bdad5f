//! Error types for the adherence CLI
//!
//! Covers document loading, configuration, HTTP dispatch and rendering.
//! Test failures are not errors; they are reported in the run summary.

use oas_adherence_core::CoreError;
use thiserror::Error;

/// Main error type for CLI operations
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid input data or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File access or I/O error
    #[error("File error: {0}")]
    FileError(String),

    /// Document parsing error
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The OAS document or a schema inside it is unusable
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// Invalid runner configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// HTTP client setup or transport failure outside a test case
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Serialization error while rendering output
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AppError {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        AppError::InvalidInput(msg.into())
    }

    /// Create a file error
    pub fn file_error(msg: impl Into<String>) -> Self {
        AppError::FileError(msg.into())
    }

    /// Create a schema error
    pub fn schema_error(msg: impl Into<String>) -> Self {
        AppError::SchemaError(msg.into())
    }

    /// Create a configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        AppError::ConfigError(msg.into())
    }

    /// Check if this is a user-facing error (vs internal)
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            AppError::InvalidInput(_)
                | AppError::FileError(_)
                | AppError::ParseError(_)
                | AppError::SchemaError(_)
                | AppError::ConfigError(_)
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::FileError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ParseError(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::ParseError(format!("YAML error: {}", err))
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::ParseError(format!("TOML error: {}", err))
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ParseError(msg) => AppError::ParseError(msg),
            other => AppError::SchemaError(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::HttpError(err.to_string())
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, AppError>;
