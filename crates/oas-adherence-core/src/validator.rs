//! Validation of values against schemas
//!
//! The validator walks a value and its schema together and returns every
//! violation as an [`ErrorRecord`]. An empty list means the value is valid.
//! Malformed data never produces an `Err`; malformed schemas are logged and
//! reported as [`ErrorKind::SchemaError`] records.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use crate::format;
use crate::path::JsonPath;
use crate::report::{ErrorDetails, ErrorKind, ErrorRecord};
use crate::schema::{json_kind, Schema, SchemaType};

/// Validation switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOptions {
    /// Report undeclared data and unsupported formats as errors
    #[serde(default)]
    pub strict_validation: bool,
}

impl ValidationOptions {
    /// Create permissive options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set strict mode
    pub fn with_strict_validation(mut self, strict: bool) -> Self {
        self.strict_validation = strict;
        self
    }
}

/// Schema validator
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    options: ValidationOptions,
}

impl Validator {
    /// Create a validator with the given options
    pub fn new(options: ValidationOptions) -> Self {
        Self { options }
    }

    /// Create a strict validator
    pub fn strict() -> Self {
        Self::new(ValidationOptions::new().with_strict_validation(true))
    }

    /// The options in effect
    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Validate `value` against `schema` at `path`.
    ///
    /// `None` stands for an absent value or an absent schema.
    pub fn validate(
        &self,
        value: Option<&Value>,
        schema: Option<&Schema>,
        path: &JsonPath,
    ) -> Vec<ErrorRecord> {
        let Some(schema) = schema else {
            return self.undeclared(value, path);
        };

        let value = match value {
            Some(value) if !value.is_null() => value,
            _ => {
                return vec![ErrorRecord::new(
                    ErrorKind::LackOfData,
                    path,
                    "Value is missing where the schema expects one",
                )];
            }
        };

        if let Some(alternatives) = &schema.one_of {
            return self.validate_one_of(value, alternatives, path);
        }

        if let Some(declared) = &schema.schema_type {
            if !declared.is_supported() {
                warn!(path = %path, schema_type = %declared, "Limited support: unsupported schema type");
                return vec![ErrorRecord::new(
                    ErrorKind::LimitedSupport,
                    path,
                    format!("Schema type '{}' is not supported", declared),
                )
                .with_value(value)
                .with_details(ErrorDetails::Unsupported {
                    feature: format!("type '{}'", declared),
                })];
            }
            if !declared.accepts(value) {
                return vec![ErrorRecord::new(
                    ErrorKind::DataTypeMismatch,
                    path,
                    format!("Expected {}, found {}", declared, json_kind(value)),
                )
                .with_value(value)
                .with_details(ErrorDetails::TypeMismatch {
                    expected: declared.to_string(),
                    actual: json_kind(value).to_string(),
                })];
            }
        }

        if let Some(allowed) = &schema.enum_values {
            if allowed.iter().any(|member| values_equal(member, value)) {
                return Vec::new();
            }
            return vec![ErrorRecord::new(
                ErrorKind::Enum,
                path,
                "Value is not one of the allowed values",
            )
            .with_value(value)
            .with_details(ErrorDetails::Enum {
                allowed: allowed.clone(),
            })];
        }

        match (&schema.schema_type, value) {
            (Some(SchemaType::Integer | SchemaType::Number), Value::Number(n)) => {
                check_range(schema, n.as_f64().unwrap_or_default(), value, path)
                    .into_iter()
                    .collect()
            }
            (Some(SchemaType::String), Value::String(s)) => self.validate_string(schema, s, value, path),
            (Some(SchemaType::Array), Value::Array(elements)) => {
                self.validate_array(schema, elements, path)
            }
            (Some(SchemaType::Object), Value::Object(object)) => {
                self.validate_object(schema, object, path)
            }
            _ => Vec::new(),
        }
    }

    /// Validate a present value against a present schema
    pub fn validate_value(&self, value: &Value, schema: &Schema, path: &JsonPath) -> Vec<ErrorRecord> {
        self.validate(Some(value), Some(schema), path)
    }

    fn undeclared(&self, value: Option<&Value>, path: &JsonPath) -> Vec<ErrorRecord> {
        let Some(value) = value else {
            return Vec::new();
        };
        if !self.options.strict_validation {
            debug!(path = %path, "Ignoring data not described by the schema");
            return Vec::new();
        }
        vec![ErrorRecord::new(
            ErrorKind::ExcessOfData,
            path,
            "Value is not described by the schema",
        )
        .with_value(value)]
    }

    fn validate_one_of(
        &self,
        value: &Value,
        alternatives: &[Schema],
        path: &JsonPath,
    ) -> Vec<ErrorRecord> {
        if alternatives.is_empty() {
            error!(path = %path, "Schema error: oneOf has no alternatives");
            return vec![schema_error(path, value, "oneOf has no alternatives", "oneOf")];
        }

        for (idx, alternative) in alternatives.iter().enumerate() {
            let errors = self.validate(Some(value), Some(alternative), path);
            if errors.is_empty() {
                return Vec::new();
            }
            debug!(
                path = %path,
                alternative = idx,
                errors = errors.len(),
                "oneOf alternative rejected the value"
            );
        }

        vec![ErrorRecord::new(
            ErrorKind::OneOf,
            path,
            format!("Value matches none of the {} oneOf alternatives", alternatives.len()),
        )
        .with_value(value)
        .with_details(ErrorDetails::OneOf {
            alternatives: alternatives.len(),
        })]
    }

    /// Strings check exactly one rule: `format`, else `pattern`, else length
    fn validate_string(
        &self,
        schema: &Schema,
        s: &str,
        value: &Value,
        path: &JsonPath,
    ) -> Vec<ErrorRecord> {
        if let Some(string_format) = &schema.format {
            return match format::check(string_format, s) {
                Some(true) => Vec::new(),
                Some(false) => vec![ErrorRecord::new(
                    ErrorKind::FormatViolation,
                    path,
                    format!("Value is not a valid {}", string_format),
                )
                .with_value(value)
                .with_details(ErrorDetails::Format {
                    format: string_format.to_string(),
                })],
                None => {
                    warn!(path = %path, format = %string_format, "Limited support: unsupported string format");
                    if !self.options.strict_validation {
                        return Vec::new();
                    }
                    vec![ErrorRecord::new(
                        ErrorKind::LimitedSupport,
                        path,
                        format!("String format '{}' is not supported", string_format),
                    )
                    .with_value(value)
                    .with_details(ErrorDetails::Unsupported {
                        feature: format!("format '{}'", string_format),
                    })]
                }
            };
        }

        if let Some(pattern) = &schema.pattern {
            return match Regex::new(pattern) {
                Ok(re) if re.is_match(s) => Vec::new(),
                Ok(_) => vec![ErrorRecord::new(
                    ErrorKind::PatternViolation,
                    path,
                    format!("Value does not match pattern '{}'", pattern),
                )
                .with_value(value)
                .with_details(ErrorDetails::Pattern {
                    pattern: pattern.clone(),
                })],
                Err(e) => {
                    error!(path = %path, pattern = %pattern, error = %e, "Schema error: invalid pattern");
                    vec![ErrorRecord::new(
                        ErrorKind::SchemaError,
                        path,
                        format!("Pattern '{}' does not compile", pattern),
                    )
                    .with_value(value)
                    .with_details(ErrorDetails::InvalidPattern {
                        pattern: pattern.clone(),
                        reason: e.to_string(),
                    })]
                }
            };
        }

        check_length(schema, s, value, path).into_iter().collect()
    }

    fn validate_array(&self, schema: &Schema, elements: &[Value], path: &JsonPath) -> Vec<ErrorRecord> {
        let Some(items) = schema.items.as_deref() else {
            error!(path = %path, "Schema error: array schema has no items");
            return vec![schema_error(
                path,
                &Value::Array(elements.to_vec()),
                "Array schema has no items",
                "items",
            )];
        };
        elements
            .iter()
            .enumerate()
            .flat_map(|(idx, element)| self.validate(Some(element), Some(items), &path.index(idx)))
            .collect()
    }

    fn validate_object(
        &self,
        schema: &Schema,
        object: &Map<String, Value>,
        path: &JsonPath,
    ) -> Vec<ErrorRecord> {
        let missing: Vec<ErrorRecord> = schema
            .required
            .iter()
            .filter(|key| object.get(key.as_str()).map_or(true, Value::is_null))
            .map(|key| {
                ErrorRecord::new(
                    ErrorKind::RequiredKeyMissing,
                    &path.key(key),
                    format!("Missing required key '{}'", key),
                )
                .with_details(ErrorDetails::MissingKey { key: key.clone() })
            })
            .collect();
        if !missing.is_empty() {
            return missing;
        }

        let Some(properties) = &schema.properties else {
            error!(path = %path, "Schema error: object schema has no properties");
            return vec![schema_error(
                path,
                &Value::Object(object.clone()),
                "Object schema has no properties",
                "properties",
            )];
        };
        object
            .iter()
            .flat_map(|(key, member)| self.validate(Some(member), properties.get(key), &path.key(key)))
            .collect()
    }
}

/// Validate a value with the given options
pub fn validate(
    value: &Value,
    schema: &Schema,
    path: &JsonPath,
    options: ValidationOptions,
) -> Vec<ErrorRecord> {
    Validator::new(options).validate(Some(value), Some(schema), path)
}

fn schema_error(path: &JsonPath, value: &Value, message: &str, part: &str) -> ErrorRecord {
    ErrorRecord::new(ErrorKind::SchemaError, path, message)
        .with_value(value)
        .with_details(ErrorDetails::MissingSchemaPart {
            part: part.to_string(),
        })
}

/// Closed-interval check; a bound only applies when it is defined
fn check_range(schema: &Schema, n: f64, value: &Value, path: &JsonPath) -> Option<ErrorRecord> {
    let below = schema.minimum.is_some_and(|low| n < low);
    let above = schema.maximum.is_some_and(|high| n > high);
    if !below && !above {
        return None;
    }
    Some(
        ErrorRecord::new(
            ErrorKind::OutOfRange,
            path,
            format!("{} is outside {}", n, describe_bounds(schema.minimum, schema.maximum)),
        )
        .with_value(value)
        .with_details(ErrorDetails::Range {
            low: schema.minimum,
            high: schema.maximum,
        }),
    )
}

fn check_length(schema: &Schema, s: &str, value: &Value, path: &JsonPath) -> Option<ErrorRecord> {
    let actual = s.chars().count();
    let short = schema.min_length.is_some_and(|low| actual < low);
    let long = schema.max_length.is_some_and(|high| actual > high);
    if !short && !long {
        return None;
    }
    Some(
        ErrorRecord::new(
            ErrorKind::OutOfRange,
            path,
            format!(
                "Length {} is outside {}",
                actual,
                describe_bounds(schema.min_length, schema.max_length)
            ),
        )
        .with_value(value)
        .with_details(ErrorDetails::Length {
            low: schema.min_length,
            high: schema.max_length,
            actual,
        }),
    )
}

fn describe_bounds<T: std::fmt::Display>(low: Option<T>, high: Option<T>) -> String {
    let low = low.map_or_else(|| "-inf".to_string(), |l| l.to_string());
    let high = high.map_or_else(|| "+inf".to_string(), |h| h.to_string());
    format!("[{}, {}]", low, high)
}

/// Equality that treats `1` and `1.0` as the same number
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return x == y;
            }
            if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                return x == y;
            }
            x.as_f64() == y.as_f64()
        }
        _ => a == b,
    }
}
