//! Schema model
//!
//! The recognized subset of the JSON-Schema / OAS vocabulary shared by the
//! generators and the validator. A [`Schema`] is an immutable tree supplied
//! by the caller after `$ref` resolution; nothing in this crate mutates it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{CoreError, Result};

/// Value shapes a schema node can declare through `type`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SchemaType {
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
    /// A `type` name outside the supported subset
    Other(String),
}

impl SchemaType {
    /// Every supported shape, in the order deficiency dummies are produced
    pub const SHAPES: [SchemaType; 6] = [
        SchemaType::Integer,
        SchemaType::Number,
        SchemaType::String,
        SchemaType::Object,
        SchemaType::Array,
        SchemaType::Boolean,
    ];

    /// The keyword spelling of this type
    pub fn as_str(&self) -> &str {
        match self {
            SchemaType::Boolean => "boolean",
            SchemaType::Integer => "integer",
            SchemaType::Number => "number",
            SchemaType::String => "string",
            SchemaType::Array => "array",
            SchemaType::Object => "object",
            SchemaType::Other(name) => name,
        }
    }

    /// Whether this type belongs to the supported subset
    pub fn is_supported(&self) -> bool {
        !matches!(self, SchemaType::Other(_))
    }

    /// The shape of a JSON value, as the type keyword that best describes it.
    ///
    /// Whole numbers report `integer`; `null` has no shape.
    pub fn of_value(value: &Value) -> Option<SchemaType> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(SchemaType::Boolean),
            Value::Number(n) => {
                if is_whole_number(n) {
                    Some(SchemaType::Integer)
                } else {
                    Some(SchemaType::Number)
                }
            }
            Value::String(_) => Some(SchemaType::String),
            Value::Array(_) => Some(SchemaType::Array),
            Value::Object(_) => Some(SchemaType::Object),
        }
    }

    /// Check whether a value's runtime shape satisfies this declared type.
    ///
    /// `number` accepts whole numbers; `integer` accepts any number with no
    /// fractional part.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (SchemaType::Boolean, Value::Bool(_)) => true,
            (SchemaType::Integer, Value::Number(n)) => is_whole_number(n),
            (SchemaType::Number, Value::Number(_)) => true,
            (SchemaType::String, Value::String(_)) => true,
            (SchemaType::Array, Value::Array(_)) => true,
            (SchemaType::Object, Value::Object(_)) => true,
            _ => false,
        }
    }
}

impl From<String> for SchemaType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "boolean" => SchemaType::Boolean,
            "integer" => SchemaType::Integer,
            "number" => SchemaType::Number,
            "string" => SchemaType::String,
            "array" => SchemaType::Array,
            "object" => SchemaType::Object,
            _ => SchemaType::Other(name),
        }
    }
}

impl From<SchemaType> for String {
    fn from(schema_type: SchemaType) -> Self {
        schema_type.as_str().to_string()
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// String formats with a dedicated checker and generator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StringFormat {
    Email,
    Uuid,
    Uri,
    Ipv4,
    Ipv6,
    /// Any other `format` value (date-time, hostname, byte, ...)
    Other(String),
}

impl StringFormat {
    /// The keyword spelling of this format
    pub fn as_str(&self) -> &str {
        match self {
            StringFormat::Email => "email",
            StringFormat::Uuid => "uuid",
            StringFormat::Uri => "uri",
            StringFormat::Ipv4 => "ipv4",
            StringFormat::Ipv6 => "ipv6",
            StringFormat::Other(name) => name,
        }
    }
}

impl From<String> for StringFormat {
    fn from(name: String) -> Self {
        match name.as_str() {
            "email" => StringFormat::Email,
            "uuid" => StringFormat::Uuid,
            "uri" => StringFormat::Uri,
            "ipv4" => StringFormat::Ipv4,
            "ipv6" => StringFormat::Ipv6,
            _ => StringFormat::Other(name),
        }
    }
}

impl From<StringFormat> for String {
    fn from(format: StringFormat) -> Self {
        format.as_str().to_string()
    }
}

impl fmt::Display for StringFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node of the schema tree.
///
/// Refinement fields that do not belong to the node's `type` are ignored by
/// every engine. Unrecognized keywords in the source document are dropped
/// on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Declared value shape
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,

    /// Allowed literal values
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,

    /// Alternative sub-schemas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Schema>>,

    /// Required property names (objects)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    /// Property schemas (objects)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Schema>>,

    /// Element schema (arrays)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,

    /// Inclusive lower bound (numbers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,

    /// Inclusive upper bound (numbers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,

    /// Minimum character count (strings)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    /// Maximum character count (strings)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    /// Regular expression the string must match (strings)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Named string format (strings)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<StringFormat>,
}

impl Schema {
    /// Create an empty schema of the given type
    pub fn of_type(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(schema_type),
            ..Default::default()
        }
    }

    /// Load a schema from its JSON form
    pub fn from_value(value: &Value) -> Result<Self> {
        if !value.is_object() {
            return Err(CoreError::invalid_schema(format!(
                "expected a schema object, found {}",
                json_kind(value)
            )));
        }
        serde_json::from_value(value.clone()).map_err(|e| CoreError::invalid_schema(e.to_string()))
    }

    /// Load a schema from a JSON document
    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_value(&value)
    }

    /// Add a property schema
    pub fn with_property(mut self, key: impl Into<String>, schema: Schema) -> Self {
        self.properties
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), schema);
        self
    }

    /// Mark a property as required
    pub fn with_required(mut self, key: impl Into<String>) -> Self {
        self.required.push(key.into());
        self
    }

    /// Set the element schema
    pub fn with_items(mut self, items: Schema) -> Self {
        self.items = Some(Box::new(items));
        self
    }

    /// Set the allowed literal values
    pub fn with_enum(mut self, values: Vec<Value>) -> Self {
        self.enum_values = Some(values);
        self
    }

    /// Set the numeric bounds
    pub fn with_range(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        self.minimum = minimum;
        self.maximum = maximum;
        self
    }

    /// Set the string length bounds
    pub fn with_length(mut self, min_length: Option<usize>, max_length: Option<usize>) -> Self {
        self.min_length = min_length;
        self.max_length = max_length;
        self
    }

    /// Whether `key` is listed in `required`
    pub fn is_required(&self, key: &str) -> bool {
        self.required.iter().any(|r| r == key)
    }

    /// Whether this node is a `type: object` node
    pub fn is_object(&self) -> bool {
        self.schema_type == Some(SchemaType::Object)
    }
}

/// Location of an OAS parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Query,
    Header,
    Path,
    Cookie,
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterLocation::Query => write!(f, "query"),
            ParameterLocation::Header => write!(f, "header"),
            ParameterLocation::Path => write!(f, "path"),
            ParameterLocation::Cookie => write!(f, "cookie"),
        }
    }
}

/// An entry of an OAS `parameters` list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name (header name for header parameters)
    pub name: String,

    /// Where the parameter travels
    #[serde(rename = "in")]
    pub location: ParameterLocation,

    /// Whether the parameter must be sent
    #[serde(default)]
    pub required: bool,

    /// Value schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

impl Parameter {
    /// Create a parameter with no schema
    pub fn new(name: impl Into<String>, location: ParameterLocation) -> Self {
        Self {
            name: name.into(),
            location,
            required: false,
            schema: None,
        }
    }

    /// Set the required flag
    pub fn set_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Set the value schema
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Load a parameter from its JSON form
    pub fn from_value(value: &Value) -> Result<Self> {
        serde_json::from_value(value.clone()).map_err(|e| CoreError::invalid_parameter(e.to_string()))
    }

    /// Whether the parameter travels in a request header
    pub fn is_header(&self) -> bool {
        self.location == ParameterLocation::Header
    }

    /// Build an object schema describing the full header set of a request.
    ///
    /// Each header parameter becomes a property; required headers become
    /// required keys. Non-header parameters are skipped.
    pub fn headers_schema(parameters: &[Parameter]) -> Schema {
        let mut schema = Schema::of_type(SchemaType::Object);
        schema.properties = Some(BTreeMap::new());
        for parameter in parameters.iter().filter(|p| p.is_header()) {
            schema = schema.with_property(
                parameter.name.clone(),
                parameter.schema.clone().unwrap_or_default(),
            );
            if parameter.required {
                schema = schema.with_required(parameter.name.clone());
            }
        }
        schema
    }
}

/// Whether a JSON number has no fractional part
pub(crate) fn is_whole_number(n: &serde_json::Number) -> bool {
    if n.is_i64() || n.is_u64() {
        return true;
    }
    n.as_f64().map(|f| f.is_finite() && f.fract() == 0.0).unwrap_or(false)
}

const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

pub(crate) fn fits_i64(x: f64) -> bool {
    (-TWO_POW_63..TWO_POW_63).contains(&x)
}

pub(crate) fn fits_u64(x: f64) -> bool {
    (0.0..TWO_POW_64).contains(&x)
}

/// JSON form of a whole-valued float: `i64`, else `u64`, else the float itself
pub(crate) fn whole_number_value(x: f64) -> Value {
    if fits_i64(x) {
        Value::from(x as i64)
    } else if fits_u64(x) {
        Value::from(x as u64)
    } else {
        Value::from(x)
    }
}

/// Human-readable JSON kind of a value, used in messages
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if is_whole_number(n) => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_type_round_trip_names() {
        for name in ["boolean", "integer", "number", "string", "array", "object"] {
            let schema_type = SchemaType::from(name.to_string());
            assert!(schema_type.is_supported());
            assert_eq!(schema_type.as_str(), name);
        }
        let other = SchemaType::from("file".to_string());
        assert_eq!(other, SchemaType::Other("file".to_string()));
        assert!(!other.is_supported());
    }

    #[test]
    fn test_schema_type_accepts() {
        assert!(SchemaType::Integer.accepts(&json!(3)));
        assert!(SchemaType::Integer.accepts(&json!(3.0)));
        assert!(!SchemaType::Integer.accepts(&json!(3.5)));
        assert!(SchemaType::Number.accepts(&json!(3)));
        assert!(SchemaType::Array.accepts(&json!([])));
        assert!(!SchemaType::Object.accepts(&json!([])));
        assert!(!SchemaType::Boolean.accepts(&json!("true")));
        assert!(!SchemaType::Other("file".into()).accepts(&json!("x")));
    }

    #[test]
    fn test_schema_deserialization() {
        let schema = Schema::from_value(&json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": { "type": "string", "minLength": 2, "maxLength": 8 },
                "tags": { "type": "array", "items": { "type": "string", "format": "uuid" } },
                "age": { "type": "integer", "minimum": 0, "maximum": 130 }
            },
            "x-internal": true
        }))
        .unwrap();

        assert_eq!(schema.schema_type, Some(SchemaType::Object));
        assert!(schema.is_required("name"));
        assert!(!schema.is_required("age"));

        let properties = schema.properties.as_ref().unwrap();
        assert_eq!(properties["name"].min_length, Some(2));
        assert_eq!(properties["age"].minimum, Some(0.0));
        let items = properties["tags"].items.as_ref().unwrap();
        assert_eq!(items.format, Some(StringFormat::Uuid));
    }

    #[test]
    fn test_unknown_type_and_format_are_kept() {
        let schema = Schema::from_value(&json!({ "type": "file", "format": "binary" })).unwrap();
        assert_eq!(schema.schema_type, Some(SchemaType::Other("file".to_string())));
        assert_eq!(schema.format, Some(StringFormat::Other("binary".to_string())));
    }

    #[test]
    fn test_from_value_rejects_non_objects() {
        assert!(matches!(
            Schema::from_value(&json!("string")),
            Err(CoreError::InvalidSchema(_))
        ));
        assert!(matches!(
            Schema::from_json_str("{"),
            Err(CoreError::ParseError(_))
        ));
    }

    #[test]
    fn test_parameter_deserialization() {
        let parameter = Parameter::from_value(&json!({
            "name": "X-Request-Id",
            "in": "header",
            "required": true,
            "schema": { "type": "string", "format": "uuid" }
        }))
        .unwrap();
        assert!(parameter.is_header());
        assert!(parameter.required);
        assert_eq!(parameter.location.to_string(), "header");
    }

    #[test]
    fn test_headers_schema_skips_other_locations() {
        let parameters = vec![
            Parameter::new("X-Trace", ParameterLocation::Header)
                .set_required(true)
                .with_schema(Schema::of_type(SchemaType::String)),
            Parameter::new("X-Debug", ParameterLocation::Header)
                .with_schema(Schema::of_type(SchemaType::Boolean)),
            Parameter::new("limit", ParameterLocation::Query)
                .with_schema(Schema::of_type(SchemaType::Integer)),
        ];

        let schema = Parameter::headers_schema(&parameters);
        let properties = schema.properties.as_ref().unwrap();
        assert_eq!(properties.len(), 2);
        assert!(schema.is_required("X-Trace"));
        assert!(!schema.is_required("X-Debug"));
        assert!(!properties.contains_key("limit"));
    }

    #[test]
    fn test_json_kind() {
        assert_eq!(json_kind(&json!(null)), "null");
        assert_eq!(json_kind(&json!(1)), "integer");
        assert_eq!(json_kind(&json!(1.5)), "number");
        assert_eq!(json_kind(&json!({})), "object");
    }
}
