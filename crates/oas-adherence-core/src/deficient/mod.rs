//! Deficient value generation
//!
//! For a schema, each [`DeficiencyKind`] yields the set of values that
//! break exactly one constraint of that kind at exactly one location. The
//! categories share one walk over the schema:
//!
//! - `oneOf`: the union of walking every alternative at the same path
//! - `array`: walk `items` at `path[]`, then wrap each value into a
//!   one-element array
//! - `object`: walk every property at `path.key`, then wrap each value
//!   into a conformant object with only that key replaced
//!
//! Category modules only decide what faulty values a single node yields.

mod data_type;
mod enum_values;
mod headers;
mod keys;
mod number_range;
mod string_length;

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::generator::{ConformantGenerator, Overrides};
use crate::path::JsonPath;
use crate::report::{ErrorDetails, ErrorKind};
use crate::schema::{Schema, SchemaType};

/// Deficiency categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeficiencyKind {
    DataType,
    Enum,
    NumberRange,
    OptionalKeyMissing,
    RequiredKeyMissing,
    StringLength,
}

impl DeficiencyKind {
    /// Every category, in generation order
    pub const ALL: [DeficiencyKind; 6] = [
        DeficiencyKind::DataType,
        DeficiencyKind::Enum,
        DeficiencyKind::NumberRange,
        DeficiencyKind::OptionalKeyMissing,
        DeficiencyKind::RequiredKeyMissing,
        DeficiencyKind::StringLength,
    ];

    /// Stable tag for this category
    pub fn as_str(&self) -> &'static str {
        match self {
            DeficiencyKind::DataType => "data_type",
            DeficiencyKind::Enum => "enum",
            DeficiencyKind::NumberRange => "number_range",
            DeficiencyKind::OptionalKeyMissing => "optional_key_missing",
            DeficiencyKind::RequiredKeyMissing => "required_key_missing",
            DeficiencyKind::StringLength => "string_length",
        }
    }

    /// What a value of this category does wrong
    pub fn description(&self) -> &'static str {
        match self {
            DeficiencyKind::DataType => "Value of a different shape than the declared type",
            DeficiencyKind::Enum => "Value of the right shape outside the enum",
            DeficiencyKind::NumberRange => "Number one below minimum or one above maximum",
            DeficiencyKind::OptionalKeyMissing => "Object without one optional key",
            DeficiencyKind::RequiredKeyMissing => "Object without one required key",
            DeficiencyKind::StringLength => "String one character outside the length bounds",
        }
    }

    /// The error the validator reports for a value of this category.
    ///
    /// `None` for optional-key-missing values, which remain valid.
    pub fn expected_error(&self) -> Option<ErrorKind> {
        match self {
            DeficiencyKind::DataType => Some(ErrorKind::DataTypeMismatch),
            DeficiencyKind::Enum => Some(ErrorKind::Enum),
            DeficiencyKind::NumberRange | DeficiencyKind::StringLength => Some(ErrorKind::OutOfRange),
            DeficiencyKind::RequiredKeyMissing => Some(ErrorKind::RequiredKeyMissing),
            DeficiencyKind::OptionalKeyMissing => None,
        }
    }
}

impl fmt::Display for DeficiencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which part of a request a deficiency belongs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Body,
    Headers,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Body => write!(f, "body"),
            Target::Headers => write!(f, "headers"),
        }
    }
}

/// A faulty value and where its fault lies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deficiency {
    /// Category of the fault
    pub kind: DeficiencyKind,
    /// Location of the fault, in schema steps (`[]` for elements)
    pub path: JsonPath,
    /// The complete faulty value, rooted where generation started
    pub value: Value,
    /// Category-specific description of the fault
    pub details: ErrorDetails,
    /// Request part the value is meant for
    pub target: Target,
    /// Header under test, for header deficiencies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
}

impl Deficiency {
    pub(crate) fn new(kind: DeficiencyKind, path: JsonPath, value: Value, details: ErrorDetails) -> Self {
        Self {
            kind,
            path,
            value,
            details,
            target: Target::Body,
            header: None,
        }
    }

    /// The error the validator reports for this value, if any
    pub fn expected_error(&self) -> Option<ErrorKind> {
        self.kind.expected_error()
    }

    /// Whether a server should reject this value
    pub fn expects_rejection(&self) -> bool {
        self.expected_error().is_some()
    }

    fn rewrapped(mut self, value: Value) -> Self {
        self.value = value;
        self
    }
}

/// Per-category switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeficiencyOptions {
    /// Produce `minimum - 1`
    pub check_minimum: bool,
    /// Produce `maximum + 1`
    pub check_maximum: bool,
    /// Produce strings one shorter than `minLength`
    pub check_minimum_length: bool,
    /// Produce strings one longer than `maxLength`
    pub check_maximum_length: bool,
    /// Treat numeric or boolean content in string fields, and arrays in
    /// object fields, as type faults too
    pub strict_types: bool,
}

impl Default for DeficiencyOptions {
    fn default() -> Self {
        Self {
            check_minimum: true,
            check_maximum: true,
            check_minimum_length: true,
            check_maximum_length: true,
            strict_types: false,
        }
    }
}

impl DeficiencyOptions {
    /// Set both numeric bound switches
    pub fn with_range_checks(mut self, minimum: bool, maximum: bool) -> Self {
        self.check_minimum = minimum;
        self.check_maximum = maximum;
        self
    }

    /// Set both length bound switches
    pub fn with_length_checks(mut self, minimum: bool, maximum: bool) -> Self {
        self.check_minimum_length = minimum;
        self.check_maximum_length = maximum;
        self
    }

    /// Set strict type faults
    pub fn with_strict_types(mut self, strict: bool) -> Self {
        self.strict_types = strict;
        self
    }
}

/// Produces single-fault values for a schema
#[derive(Debug, Clone, Copy, Default)]
pub struct DeficientGenerator<'a> {
    options: DeficiencyOptions,
    conformant: ConformantGenerator<'a>,
}

impl<'a> DeficientGenerator<'a> {
    /// Create a generator with the given options
    pub fn new(options: DeficiencyOptions) -> Self {
        Self {
            options,
            conformant: ConformantGenerator::new(),
        }
    }

    /// Build the conformant surroundings of each fault with pinned values
    pub fn with_overrides(mut self, overrides: &'a Overrides) -> Self {
        self.conformant = ConformantGenerator::with_overrides(overrides);
        self
    }

    /// The options in effect
    pub fn options(&self) -> &DeficiencyOptions {
        &self.options
    }

    /// Generate every deficiency of one category
    pub fn generate<R: Rng + ?Sized>(
        &self,
        kind: DeficiencyKind,
        schema: &Schema,
        path: &JsonPath,
        rng: &mut R,
    ) -> Vec<Deficiency> {
        self.walk(kind, schema, path, rng)
    }

    /// Generate the deficiencies of every category
    pub fn generate_all<R: Rng + ?Sized>(
        &self,
        schema: &Schema,
        path: &JsonPath,
        rng: &mut R,
    ) -> Vec<Deficiency> {
        DeficiencyKind::ALL
            .iter()
            .flat_map(|kind| self.walk(*kind, schema, path, rng))
            .collect()
    }

    fn walk<R: Rng + ?Sized>(
        &self,
        kind: DeficiencyKind,
        schema: &Schema,
        path: &JsonPath,
        rng: &mut R,
    ) -> Vec<Deficiency> {
        if let Some(alternatives) = &schema.one_of {
            return alternatives
                .iter()
                .flat_map(|alternative| self.walk(kind, alternative, path, rng))
                .collect();
        }

        let mut found = self.leaf(kind, schema, path, rng);
        if schema.enum_values.is_some() {
            return found;
        }

        match &schema.schema_type {
            Some(SchemaType::Array) => {
                if let Some(items) = schema.items.as_deref() {
                    for deficiency in self.walk(kind, items, &path.items(), rng) {
                        let element = deficiency.value.clone();
                        found.push(deficiency.rewrapped(Value::Array(vec![element])));
                    }
                }
            }
            Some(SchemaType::Object) => {
                if let Some(properties) = &schema.properties {
                    for (key, property) in properties {
                        for deficiency in self.walk(kind, property, &path.key(key), rng) {
                            let mut object = self.base_object(schema, path, rng);
                            object.insert(key.clone(), deficiency.value.clone());
                            found.push(deficiency.rewrapped(Value::Object(object)));
                        }
                    }
                }
            }
            _ => {}
        }
        found
    }

    fn leaf<R: Rng + ?Sized>(
        &self,
        kind: DeficiencyKind,
        schema: &Schema,
        path: &JsonPath,
        rng: &mut R,
    ) -> Vec<Deficiency> {
        match kind {
            DeficiencyKind::DataType => data_type::deficiencies(schema, path, &self.options),
            DeficiencyKind::Enum => enum_values::deficiencies(schema, path),
            DeficiencyKind::NumberRange => number_range::deficiencies(schema, path, &self.options),
            DeficiencyKind::StringLength => {
                string_length::deficiencies(schema, path, &self.options, rng)
            }
            DeficiencyKind::OptionalKeyMissing | DeficiencyKind::RequiredKeyMissing => {
                keys::deficiencies(kind, schema, path, |s, p| self.base_object(s, p, rng))
            }
        }
    }

    /// A fresh conformant object for `schema`
    fn base_object<R: Rng + ?Sized>(
        &self,
        schema: &Schema,
        path: &JsonPath,
        rng: &mut R,
    ) -> Map<String, Value> {
        match self.conformant.generate(Some(schema), path, rng) {
            Some(Value::Object(object)) => object,
            _ => Map::new(),
        }
    }
}

/// Generate every deficiency of one category with the given options
pub fn generate_deficient<R: Rng + ?Sized>(
    kind: DeficiencyKind,
    schema: &Schema,
    path: &JsonPath,
    options: DeficiencyOptions,
    rng: &mut R,
) -> Vec<Deficiency> {
    DeficientGenerator::new(options).generate(kind, schema, path, rng)
}
