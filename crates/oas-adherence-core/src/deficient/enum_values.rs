//! Values of the right shape outside the enum

use serde_json::{json, Value};

use super::{Deficiency, DeficiencyKind};
use crate::path::JsonPath;
use crate::report::ErrorDetails;
use crate::schema::{Schema, SchemaType};
use crate::validator::values_equal;

pub(super) fn deficiencies(schema: &Schema, path: &JsonPath) -> Vec<Deficiency> {
    let Some(allowed) = schema.enum_values.as_ref().filter(|values| !values.is_empty()) else {
        return Vec::new();
    };

    shapes(schema, allowed)
        .iter()
        .filter_map(|shape| outside(shape, allowed))
        .map(|value| {
            Deficiency::new(
                DeficiencyKind::Enum,
                path.clone(),
                value,
                ErrorDetails::Enum {
                    allowed: allowed.clone(),
                },
            )
        })
        .collect()
}

/// The declared type, or the shapes of the members when there is none
fn shapes(schema: &Schema, allowed: &[Value]) -> Vec<SchemaType> {
    match &schema.schema_type {
        Some(declared) if declared.is_supported() => vec![declared.clone()],
        Some(_) => Vec::new(),
        None => SchemaType::SHAPES
            .iter()
            .filter(|shape| allowed.iter().any(|v| SchemaType::of_value(v).as_ref() == Some(*shape)))
            .cloned()
            .collect(),
    }
}

/// A value of `shape` that no member equals
fn outside(shape: &SchemaType, allowed: &[Value]) -> Option<Value> {
    let taken = |candidate: &Value| allowed.iter().any(|member| values_equal(member, candidate));
    let attempts = 0..=allowed.len();

    match shape {
        SchemaType::Boolean => [json!(true), json!(false)].into_iter().find(|c| !taken(c)),
        SchemaType::Integer => attempts.map(|i| json!(i)).find(|c| !taken(c)),
        SchemaType::Number => attempts.map(|i| json!(i as f64 + 0.5)).find(|c| !taken(c)),
        SchemaType::String => attempts
            .map(|i| match i {
                0 => json!("dummy"),
                i => json!(format!("dummy_{}", i)),
            })
            .find(|c| !taken(c)),
        SchemaType::Array => attempts.map(|i| json!([i])).find(|c| !taken(c)),
        SchemaType::Object => attempts.map(|i| json!({ "dummy": i })).find(|c| !taken(c)),
        SchemaType::Other(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_enum() {
        let schema = Schema::of_type(SchemaType::String).with_enum(vec![json!("Dingo"), json!("Husky")]);
        let found = deficiencies(&schema, &JsonPath::root().key("breed"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value, json!("dummy"));
        assert_eq!(found[0].path.as_str(), "$.breed");
    }

    #[test]
    fn test_dummy_avoids_members() {
        let schema = Schema::of_type(SchemaType::String)
            .with_enum(vec![json!("dummy"), json!("dummy_1")]);
        let found = deficiencies(&schema, &JsonPath::root());
        assert_eq!(found[0].value, json!("dummy_2"));

        let schema = Schema::of_type(SchemaType::Integer).with_enum(vec![json!(0), json!(1.0)]);
        let found = deficiencies(&schema, &JsonPath::root());
        assert_eq!(found[0].value, json!(2));
    }

    #[test]
    fn test_untyped_enum_uses_member_shapes() {
        let schema = Schema::default().with_enum(vec![json!("a"), json!(3), json!(null)]);
        let values: Vec<Value> = deficiencies(&schema, &JsonPath::root())
            .into_iter()
            .map(|d| d.value)
            .collect();
        assert_eq!(values, vec![json!(0), json!("dummy")]);
    }

    #[test]
    fn test_exhausted_boolean_enum() {
        let schema = Schema::of_type(SchemaType::Boolean).with_enum(vec![json!(true), json!(false)]);
        assert!(deficiencies(&schema, &JsonPath::root()).is_empty());
    }

    #[test]
    fn test_no_enum() {
        assert!(deficiencies(&Schema::of_type(SchemaType::String), &JsonPath::root()).is_empty());
    }
}
