//! Conformant value generation
//!
//! [`ConformantGenerator`] walks a schema and produces a value the
//! validator accepts. Malformed or unsupported schema parts are logged and
//! degrade to empty values; generation never fails.

pub mod pattern;

use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{error, warn};

use crate::format;
use crate::path::JsonPath;
use crate::schema::{fits_i64, fits_u64, whole_number_value, Parameter, Schema, SchemaType};

/// Literal values pinned at specific paths, keyed by path string
pub type Overrides = BTreeMap<String, Value>;

/// Largest magnitude used when a numeric bound is absent (2^53 - 1)
pub const SAFE_NUMBER_LIMIT: f64 = 9_007_199_254_740_991.0;

/// Element count range for generated arrays
pub const ARRAY_ITEMS_MIN: usize = 1;
pub const ARRAY_ITEMS_MAX: usize = 10;

/// Extra characters allowed above `minLength` when `maxLength` is absent
const DEFAULT_LENGTH_SPAN: usize = 10;

/// Produces values that satisfy a schema
#[derive(Debug, Clone, Copy, Default)]
pub struct ConformantGenerator<'a> {
    overrides: Option<&'a Overrides>,
}

impl<'a> ConformantGenerator<'a> {
    /// Create a generator without overrides
    pub fn new() -> Self {
        Self { overrides: None }
    }

    /// Create a generator that returns `overrides[path]` verbatim wherever
    /// a path is pinned
    pub fn with_overrides(overrides: &'a Overrides) -> Self {
        Self {
            overrides: Some(overrides),
        }
    }

    /// The pinned values, if any
    pub fn overrides(&self) -> Option<&'a Overrides> {
        self.overrides
    }

    /// Generate a value for `schema` at `path`.
    ///
    /// Returns `None` when there is no schema, or when the schema has no
    /// usable `type`.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        schema: Option<&Schema>,
        path: &JsonPath,
        rng: &mut R,
    ) -> Option<Value> {
        if let Some(pinned) = self.overrides.and_then(|o| o.get(path.as_str())) {
            return Some(pinned.clone());
        }
        let schema = schema?;

        if let Some(alternatives) = &schema.one_of {
            let Some(choice) = alternatives.choose(rng) else {
                error!(path = %path, "Schema error: oneOf has no alternatives");
                return None;
            };
            return self.generate(Some(choice), path, rng);
        }

        if let Some(values) = &schema.enum_values {
            return pick_enum_member(schema, values, path, rng);
        }

        match &schema.schema_type {
            Some(SchemaType::Boolean) => Some(Value::Bool(rng.gen())),
            Some(SchemaType::Integer) => Some(integer(schema, path, rng)),
            Some(SchemaType::Number) => Some(number(schema, path, rng)),
            Some(SchemaType::String) => Some(Value::String(string(schema, path, rng))),
            Some(SchemaType::Array) => Some(self.array(schema, path, rng)),
            Some(SchemaType::Object) => Some(self.object(schema, path, rng)),
            Some(SchemaType::Other(name)) => {
                error!(path = %path, schema_type = %name, "Limited support: unsupported schema type");
                None
            }
            None => {
                error!(path = %path, "Schema error: schema declares no type");
                None
            }
        }
    }

    /// Generate a value for every header parameter, keyed by header name.
    ///
    /// Query, path, and cookie parameters are ignored. Headers whose schema
    /// yields no value are left out.
    pub fn generate_headers<R: Rng + ?Sized>(
        &self,
        parameters: &[Parameter],
        path: &JsonPath,
        rng: &mut R,
    ) -> Map<String, Value> {
        let mut headers = Map::new();
        for parameter in parameters.iter().filter(|p| p.is_header()) {
            let header_path = path.key(&parameter.name);
            if let Some(value) = self.generate(parameter.schema.as_ref(), &header_path, rng) {
                headers.insert(parameter.name.clone(), value);
            }
        }
        headers
    }

    fn array<R: Rng + ?Sized>(&self, schema: &Schema, path: &JsonPath, rng: &mut R) -> Value {
        let Some(items) = schema.items.as_deref() else {
            error!(path = %path, "Schema error: array schema has no items");
            return Value::Array(Vec::new());
        };
        let item_path = path.items();
        let count = rng.gen_range(ARRAY_ITEMS_MIN..=ARRAY_ITEMS_MAX);
        let elements = (0..count)
            .filter_map(|_| self.generate(Some(items), &item_path, rng))
            .collect();
        Value::Array(elements)
    }

    fn object<R: Rng + ?Sized>(&self, schema: &Schema, path: &JsonPath, rng: &mut R) -> Value {
        let Some(properties) = &schema.properties else {
            error!(path = %path, "Schema error: object schema has no properties");
            return Value::Object(Map::new());
        };
        let mut object = Map::new();
        for (key, property) in properties {
            if let Some(value) = self.generate(Some(property), &path.key(key), rng) {
                object.insert(key.clone(), value);
            }
        }
        Value::Object(object)
    }
}

/// Generate a conformant value without overrides
pub fn generate_conformant<R: Rng + ?Sized>(
    schema: &Schema,
    path: &JsonPath,
    rng: &mut R,
) -> Option<Value> {
    ConformantGenerator::new().generate(Some(schema), path, rng)
}

/// Generate the header map for a parameter list without overrides
pub fn generate_headers<R: Rng + ?Sized>(
    parameters: &[Parameter],
    path: &JsonPath,
    rng: &mut R,
) -> Map<String, Value> {
    ConformantGenerator::new().generate_headers(parameters, path, rng)
}

fn pick_enum_member<R: Rng + ?Sized>(
    schema: &Schema,
    values: &[Value],
    path: &JsonPath,
    rng: &mut R,
) -> Option<Value> {
    let candidates: Vec<&Value> = match &schema.schema_type {
        Some(declared) if declared.is_supported() => {
            values.iter().filter(|v| declared.accepts(v)).collect()
        }
        _ => values.iter().collect(),
    };
    match candidates.choose(rng) {
        Some(value) => Some((*value).clone()),
        None => {
            error!(path = %path, "Schema error: enum has no member of the declared type");
            None
        }
    }
}

/// Resolve the sampling interval for a numeric schema.
///
/// Absent bounds fall back to the safe limits. When the interval is empty
/// the nearest defined bound is returned as a degenerate interval.
fn numeric_interval(schema: &Schema, low: f64, high: f64, path: &JsonPath) -> (f64, f64) {
    if low <= high {
        return (low, high);
    }
    match (schema.minimum, schema.maximum) {
        (Some(_), Some(_)) => {
            error!(path = %path, low, high, "Schema error: numeric range is empty");
            (low, low)
        }
        (Some(_), None) => (low, low),
        _ => (high, high),
    }
}

fn integer<R: Rng + ?Sized>(schema: &Schema, path: &JsonPath, rng: &mut R) -> Value {
    let low = schema.minimum.unwrap_or(-SAFE_NUMBER_LIMIT).ceil();
    let high = schema.maximum.unwrap_or(SAFE_NUMBER_LIMIT).floor();
    let (low, high) = numeric_interval(schema, low, high, path);
    if fits_i64(low) && fits_i64(high) {
        Value::from(rng.gen_range(low as i64..=high as i64))
    } else if fits_u64(low) && fits_u64(high) {
        Value::from(rng.gen_range(low as u64..=high as u64))
    } else {
        // Beyond 64-bit integers: a whole float inside the interval
        let sample = rng.gen_range(low..=high).trunc().clamp(low, high);
        whole_number_value(sample)
    }
}

fn number<R: Rng + ?Sized>(schema: &Schema, path: &JsonPath, rng: &mut R) -> Value {
    let low = schema.minimum.unwrap_or(-SAFE_NUMBER_LIMIT);
    let high = schema.maximum.unwrap_or(SAFE_NUMBER_LIMIT);
    let (low, high) = numeric_interval(schema, low, high, path);
    Value::from(rng.gen_range(low..=high))
}

fn string<R: Rng + ?Sized>(schema: &Schema, path: &JsonPath, rng: &mut R) -> String {
    if let Some(string_format) = &schema.format {
        return format::generate(string_format, rng).unwrap_or_else(|| {
            warn!(path = %path, format = %string_format, "Limited support: unsupported string format");
            String::new()
        });
    }

    if let Some(regex) = &schema.pattern {
        return match pattern::generate_matching(regex, rng) {
            Ok(value) => value,
            Err(e) => {
                warn!(path = %path, error = %e, "Could not generate a string for pattern");
                String::new()
            }
        };
    }

    let min = schema
        .min_length
        .unwrap_or_else(|| schema.max_length.map_or(1, |max| max.min(1)));
    let max = match schema.max_length {
        Some(max) if max < min => {
            error!(path = %path, min, max, "Schema error: minLength exceeds maxLength");
            min
        }
        Some(max) => max,
        None => min + DEFAULT_LENGTH_SPAN,
    };
    let len = rng.gen_range(min..=max);
    format::alphanumeric(rng, len)
}
