//! Property tests over generated schemas
//!
//! - conformant values always validate against their own schema
//! - every deficiency validates to exactly the error its category names

use oas_adherence_core::{
    ConformantGenerator, DeficientGenerator, JsonPath, Schema, SchemaType, StringFormat, Validator,
};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;

const PATTERNS: &[&str] = &["^[a-z]{2,5}$", r"^[A-Z][a-z]+-\d{2}$", "^(red|green|blue)$"];

fn bounds() -> impl Strategy<Value = (Option<f64>, Option<f64>)> {
    (proptest::option::of(-1000i32..1000), proptest::option::of(0i32..500)).prop_map(|(low, span)| {
        let low = low.map(f64::from);
        let high = span.map(|span| low.unwrap_or(0.0) + f64::from(span));
        (low, high)
    })
}

fn string_schema() -> impl Strategy<Value = Schema> {
    prop_oneof![
        (proptest::option::of(0usize..6), proptest::option::of(0usize..6)).prop_map(|(min, extra)| {
            let max = extra.map(|extra| min.unwrap_or(0) + extra);
            Schema::of_type(SchemaType::String).with_length(min, max)
        }),
        prop::sample::select(vec![
            StringFormat::Email,
            StringFormat::Uuid,
            StringFormat::Uri,
            StringFormat::Ipv4,
            StringFormat::Ipv6,
        ])
        .prop_map(|format| {
            let mut schema = Schema::of_type(SchemaType::String);
            schema.format = Some(format);
            schema
        }),
        prop::sample::select(PATTERNS).prop_map(|pattern| {
            let mut schema = Schema::of_type(SchemaType::String);
            schema.pattern = Some(pattern.to_string());
            schema
        }),
        prop::collection::btree_set("[a-z]{1,6}", 1..4).prop_map(|members| {
            Schema::of_type(SchemaType::String)
                .with_enum(members.into_iter().map(|m| json!(m)).collect())
        }),
    ]
}

fn leaf_schema() -> impl Strategy<Value = Schema> {
    prop_oneof![
        Just(Schema::of_type(SchemaType::Boolean)),
        bounds().prop_map(|(low, high)| Schema::of_type(SchemaType::Integer).with_range(low, high)),
        bounds().prop_map(|(low, high)| Schema::of_type(SchemaType::Number).with_range(low, high)),
        string_schema(),
    ]
}

fn schema_tree(with_one_of: bool) -> impl Strategy<Value = Schema> {
    leaf_schema().prop_recursive(3, 24, 4, move |inner| {
        let object = prop::collection::btree_map("[a-z]{1,6}", inner.clone(), 0..4)
            .prop_flat_map(|properties| {
                let keys: Vec<String> = properties.keys().cloned().collect();
                let count = keys.len();
                (Just(properties), Just(keys), prop::collection::vec(any::<bool>(), count))
            })
            .prop_map(|(properties, keys, required)| {
                let mut schema = Schema::of_type(SchemaType::Object);
                schema.properties = Some(properties);
                schema.required = keys
                    .into_iter()
                    .zip(required)
                    .filter_map(|(key, required)| required.then_some(key))
                    .collect();
                schema
            });
        let array = inner
            .clone()
            .prop_map(|items| Schema::of_type(SchemaType::Array).with_items(items));
        let one_of = prop::collection::vec(inner, 1..3).prop_map(move |alternatives| {
            if with_one_of {
                Schema {
                    one_of: Some(alternatives),
                    ..Default::default()
                }
            } else {
                Schema::of_type(SchemaType::Array)
                    .with_items(alternatives.into_iter().next().unwrap_or_default())
            }
        });
        prop_oneof![object, array, one_of]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    #[test]
    fn conformant_values_validate(schema in schema_tree(true), seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let root = JsonPath::root();
        let value = ConformantGenerator::new().generate(Some(&schema), &root, &mut rng);
        prop_assert!(value.is_some());
        let errors = Validator::default().validate(value.as_ref(), Some(&schema), &root);
        prop_assert!(errors.is_empty(), "{:?} produced {:?}", value, errors);
    }

    #[test]
    fn deficiencies_carry_exactly_one_fault(schema in schema_tree(false), seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let root = JsonPath::root();
        let validator = Validator::default();

        for deficiency in DeficientGenerator::default().generate_all(&schema, &root, &mut rng) {
            let errors = validator.validate_value(&deficiency.value, &schema, &root);
            match deficiency.expected_error() {
                Some(kind) => {
                    prop_assert_eq!(errors.len(), 1, "{:?} produced {:?}", deficiency, errors);
                    prop_assert_eq!(errors[0].kind, kind);
                    prop_assert_eq!(errors[0].path.normalized(), deficiency.path.clone());
                }
                None => prop_assert!(errors.is_empty(), "{:?} produced {:?}", deficiency, errors),
            }
        }
    }
}
