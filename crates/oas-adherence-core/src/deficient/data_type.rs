//! Values of the wrong shape

use serde_json::{json, Value};

use super::{Deficiency, DeficiencyKind, DeficiencyOptions};
use crate::path::JsonPath;
use crate::report::ErrorDetails;
use crate::schema::{Schema, SchemaType};

/// A fixed stand-in value of the given shape
pub(super) fn dummy_value(shape: &SchemaType) -> Value {
    match shape {
        SchemaType::Integer => json!(7),
        SchemaType::Number => json!(7.5),
        SchemaType::String => json!("dummy"),
        SchemaType::Object => json!({ "dummy": "dummy" }),
        SchemaType::Array => json!(["dummy"]),
        SchemaType::Boolean => json!(true),
        SchemaType::Other(_) => Value::Null,
    }
}

/// Whether a `candidate` value in a `declared` slot does not count as a
/// type fault
fn tolerated(declared: &SchemaType, candidate: &SchemaType, strict_types: bool) -> bool {
    use SchemaType::*;

    match (declared, candidate) {
        (Integer, Number) | (Number, Integer) => true,
        (String, Integer | Number | Boolean) | (Object, Array) => !strict_types,
        _ => declared == candidate,
    }
}

pub(super) fn deficiencies(
    schema: &Schema,
    path: &JsonPath,
    options: &DeficiencyOptions,
) -> Vec<Deficiency> {
    let Some(declared) = schema.schema_type.as_ref().filter(|t| t.is_supported()) else {
        return Vec::new();
    };

    SchemaType::SHAPES
        .iter()
        .filter(|candidate| !tolerated(declared, candidate, options.strict_types))
        .map(|candidate| {
            Deficiency::new(
                DeficiencyKind::DataType,
                path.clone(),
                dummy_value(candidate),
                ErrorDetails::TypeMismatch {
                    expected: declared.to_string(),
                    actual: candidate.to_string(),
                },
            )
        })
        .collect()
}
