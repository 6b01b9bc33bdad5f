//! Objects with one key removed

use serde_json::{Map, Value};

use super::{Deficiency, DeficiencyKind};
use crate::path::JsonPath;
use crate::report::ErrorDetails;
use crate::schema::Schema;

/// Remove one property at a time from a conformant object.
///
/// `kind` selects required or optional properties; `base` builds the
/// conformant object for the node.
pub(super) fn deficiencies<F>(
    kind: DeficiencyKind,
    schema: &Schema,
    path: &JsonPath,
    mut base: F,
) -> Vec<Deficiency>
where
    F: FnMut(&Schema, &JsonPath) -> Map<String, Value>,
{
    if !schema.is_object() || schema.enum_values.is_some() {
        return Vec::new();
    }
    let Some(properties) = &schema.properties else {
        return Vec::new();
    };
    let want_required = kind == DeficiencyKind::RequiredKeyMissing;

    properties
        .keys()
        .filter(|key| schema.is_required(key) == want_required)
        .map(|key| {
            let mut object = base(schema, path);
            object.remove(key);
            Deficiency::new(
                kind,
                path.key(key),
                Value::Object(object),
                ErrorDetails::MissingKey { key: key.clone() },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaType;
    use serde_json::json;

    fn owner_schema() -> Schema {
        Schema::of_type(SchemaType::Object)
            .with_required("id")
            .with_required("name")
            .with_property("id", Schema::of_type(SchemaType::Integer))
            .with_property("name", Schema::of_type(SchemaType::String))
            .with_property("nick", Schema::of_type(SchemaType::String))
    }

    fn fixed_base(_: &Schema, _: &JsonPath) -> Map<String, Value> {
        match json!({"id": 1, "name": "Ada", "nick": "A"}) {
            Value::Object(object) => object,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_required_keys() {
        let found = deficiencies(
            DeficiencyKind::RequiredKeyMissing,
            &owner_schema(),
            &JsonPath::root(),
            fixed_base,
        );
        let paths: Vec<&str> = found.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["$.id", "$.name"]);
        assert_eq!(found[0].value, json!({"name": "Ada", "nick": "A"}));
        assert_eq!(
            found[1].details,
            ErrorDetails::MissingKey {
                key: "name".to_string()
            }
        );
    }

    #[test]
    fn test_optional_keys() {
        let found = deficiencies(
            DeficiencyKind::OptionalKeyMissing,
            &owner_schema(),
            &JsonPath::root().key("owner"),
            fixed_base,
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path.as_str(), "$.owner.nick");
        assert_eq!(found[0].value, json!({"id": 1, "name": "Ada"}));
    }

    #[test]
    fn test_non_objects_yield_nothing() {
        let found = deficiencies(
            DeficiencyKind::RequiredKeyMissing,
            &Schema::of_type(SchemaType::String),
            &JsonPath::root(),
            fixed_base,
        );
        assert!(found.is_empty());
    }
}
