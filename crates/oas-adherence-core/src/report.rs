//! Structured error records
//!
//! Every violation the validator finds is an [`ErrorRecord`]: a fixed
//! [`ErrorKind`] tag, the [`JsonPath`] of the offending data, the data
//! itself, and a kind-specific [`ErrorDetails`] payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::path::JsonPath;

/// Taxonomy of violations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Runtime shape disagrees with the declared `type`
    DataTypeMismatch,
    /// Number outside `[minimum, maximum]` or length outside `[minLength, maxLength]`
    OutOfRange,
    /// An object omits a `required` key
    RequiredKeyMissing,
    /// Unrecognized `format` or `type`
    LimitedSupport,
    /// Value is not a member of `enum`
    Enum,
    /// Value satisfies none of the `oneOf` alternatives
    OneOf,
    /// `null` or absent where a schema expects a value
    LackOfData,
    /// Value present where no schema describes it
    ExcessOfData,
    /// String fails its `format` checker
    FormatViolation,
    /// String fails its `pattern`
    PatternViolation,
    /// The schema itself is malformed
    SchemaError,
}

impl ErrorKind {
    /// Stable tag for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::DataTypeMismatch => "data_type_mismatch",
            ErrorKind::OutOfRange => "out_of_range",
            ErrorKind::RequiredKeyMissing => "required_key_missing",
            ErrorKind::LimitedSupport => "limited_support",
            ErrorKind::Enum => "enum",
            ErrorKind::OneOf => "one_of",
            ErrorKind::LackOfData => "lack_of_data",
            ErrorKind::ExcessOfData => "excess_of_data",
            ErrorKind::FormatViolation => "format_violation",
            ErrorKind::PatternViolation => "pattern_violation",
            ErrorKind::SchemaError => "schema_error",
        }
    }

    /// Whether this kind points at the schema rather than the value
    pub fn is_schema_fault(&self) -> bool {
        matches!(self, ErrorKind::SchemaError | ErrorKind::LimitedSupport)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific payload of an [`ErrorRecord`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "detail")]
pub enum ErrorDetails {
    TypeMismatch {
        expected: String,
        actual: String,
    },
    Range {
        low: Option<f64>,
        high: Option<f64>,
    },
    Length {
        low: Option<usize>,
        high: Option<usize>,
        actual: usize,
    },
    MissingKey {
        key: String,
    },
    Enum {
        allowed: Vec<Value>,
    },
    OneOf {
        alternatives: usize,
    },
    Format {
        format: String,
    },
    Pattern {
        pattern: String,
    },
    InvalidPattern {
        pattern: String,
        reason: String,
    },
    Unsupported {
        feature: String,
    },
    /// A structural keyword the schema needs but lacks (`properties`, `items`)
    MissingSchemaPart {
        part: String,
    },
    None,
}

/// A single violation found in a value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Taxonomy tag
    pub kind: ErrorKind,
    /// Location of the offending data
    pub path: JsonPath,
    /// The offending data, `null` when absent
    pub value: Value,
    /// Kind-specific payload
    pub details: ErrorDetails,
    /// Human-readable description
    pub message: String,
}

impl ErrorRecord {
    /// Create a new record with no value and no details
    pub fn new(kind: ErrorKind, path: &JsonPath, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.clone(),
            value: Value::Null,
            details: ErrorDetails::None,
            message: message.into(),
        }
    }

    /// Attach the offending value
    pub fn with_value(mut self, value: &Value) -> Self {
        self.value = value.clone();
        self
    }

    /// Attach a details payload
    pub fn with_details(mut self, details: ErrorDetails) -> Self {
        self.details = details;
        self
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] at '{}': {}", self.kind, self.path, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_display() {
        let record = ErrorRecord::new(
            ErrorKind::RequiredKeyMissing,
            &JsonPath::root().key("breed"),
            "Missing required key 'breed'",
        );
        let display = record.to_string();
        assert!(display.contains("required_key_missing"));
        assert!(display.contains("$.breed"));
    }

    #[test]
    fn test_record_builder() {
        let record = ErrorRecord::new(ErrorKind::OutOfRange, &JsonPath::root(), "too small")
            .with_value(&json!(0))
            .with_details(ErrorDetails::Range {
                low: Some(1.0),
                high: Some(4.0),
            });
        assert_eq!(record.value, json!(0));
        assert!(matches!(record.details, ErrorDetails::Range { low: Some(_), .. }));
    }

    #[test]
    fn test_record_serialization_shape() {
        let record = ErrorRecord::new(ErrorKind::Enum, &JsonPath::root(), "not allowed")
            .with_value(&json!("Dino"))
            .with_details(ErrorDetails::Enum {
                allowed: vec![json!("Dingo"), json!("Husky")],
            });
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "enum");
        assert_eq!(json["path"], "$");
        assert_eq!(json["details"]["detail"], "enum");
        assert_eq!(json["details"]["allowed"][1], "Husky");
    }

    #[test]
    fn test_schema_fault_kinds() {
        assert!(ErrorKind::SchemaError.is_schema_fault());
        assert!(ErrorKind::LimitedSupport.is_schema_fault());
        assert!(!ErrorKind::Enum.is_schema_fault());
    }
}
