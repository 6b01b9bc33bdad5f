//! Deficiencies in request headers
//!
//! Each faulty header value is merged into an otherwise conformant header
//! set. Key-missing categories treat the header set as one object whose
//! properties are the header parameters.

use rand::Rng;
use serde_json::Value;

use super::{Deficiency, DeficiencyKind, DeficientGenerator, Target};
use crate::path::JsonPath;
use crate::report::ErrorDetails;
use crate::schema::Parameter;

impl<'a> DeficientGenerator<'a> {
    /// Generate every header deficiency of one category.
    ///
    /// Values are complete header maps tagged with [`Target::Headers`] and
    /// the name of the header under test.
    pub fn generate_headers<R: Rng + ?Sized>(
        &self,
        kind: DeficiencyKind,
        parameters: &[Parameter],
        path: &JsonPath,
        rng: &mut R,
    ) -> Vec<Deficiency> {
        match kind {
            DeficiencyKind::OptionalKeyMissing | DeficiencyKind::RequiredKeyMissing => {
                let schema = Parameter::headers_schema(parameters);
                self.walk(kind, &schema, path, rng)
                    .into_iter()
                    .map(|deficiency| {
                        let header = missing_key(&deficiency);
                        tag(deficiency, header)
                    })
                    .collect()
            }
            _ => self.header_values(kind, parameters, path, rng),
        }
    }

    /// Generate the header deficiencies of every category
    pub fn generate_all_headers<R: Rng + ?Sized>(
        &self,
        parameters: &[Parameter],
        path: &JsonPath,
        rng: &mut R,
    ) -> Vec<Deficiency> {
        DeficiencyKind::ALL
            .iter()
            .flat_map(|kind| self.generate_headers(*kind, parameters, path, rng))
            .collect()
    }

    fn header_values<R: Rng + ?Sized>(
        &self,
        kind: DeficiencyKind,
        parameters: &[Parameter],
        path: &JsonPath,
        rng: &mut R,
    ) -> Vec<Deficiency> {
        let mut found = Vec::new();
        for parameter in parameters.iter().filter(|p| p.is_header()) {
            let Some(schema) = &parameter.schema else {
                continue;
            };
            for deficiency in self.walk(kind, schema, &path.key(&parameter.name), rng) {
                let mut headers = self.conformant.generate_headers(parameters, path, rng);
                headers.insert(parameter.name.clone(), deficiency.value.clone());
                let deficiency = Deficiency {
                    value: Value::Object(headers),
                    ..deficiency
                };
                found.push(tag(deficiency, Some(parameter.name.clone())));
            }
        }
        found
    }
}

fn missing_key(deficiency: &Deficiency) -> Option<String> {
    match &deficiency.details {
        ErrorDetails::MissingKey { key } => Some(key.clone()),
        _ => None,
    }
}

fn tag(mut deficiency: Deficiency, header: Option<String>) -> Deficiency {
    deficiency.target = Target::Headers;
    deficiency.header = header;
    deficiency
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ParameterLocation, Schema, SchemaType};
    use crate::validator::Validator;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn parameters() -> Vec<Parameter> {
        vec![
            Parameter::new("X-Api-Version", ParameterLocation::Header)
                .set_required(true)
                .with_schema(Schema::of_type(SchemaType::Integer).with_range(Some(1.0), Some(3.0))),
            Parameter::new("X-Locale", ParameterLocation::Header)
                .with_schema(Schema::of_type(SchemaType::String).with_length(Some(2), Some(5))),
            Parameter::new("page", ParameterLocation::Query)
                .with_schema(Schema::of_type(SchemaType::Integer).with_range(Some(1.0), None)),
        ]
    }

    #[test]
    fn test_value_faults_keep_other_headers_conformant() {
        let mut rng = StdRng::seed_from_u64(42);
        let found = DeficientGenerator::default().generate_headers(
            DeficiencyKind::NumberRange,
            &parameters(),
            &JsonPath::root(),
            &mut rng,
        );
        assert_eq!(found.len(), 2);
        for deficiency in &found {
            assert_eq!(deficiency.target, Target::Headers);
            assert_eq!(deficiency.header.as_deref(), Some("X-Api-Version"));
            assert_eq!(deficiency.path.as_str(), "$.X-Api-Version");
            let headers = deficiency.value.as_object().unwrap();
            assert_eq!(headers.len(), 2);
            assert!(!headers.contains_key("page"));
        }
    }

    #[test]
    fn test_missing_headers() {
        let mut rng = StdRng::seed_from_u64(42);
        let generator = DeficientGenerator::default();
        let required = generator.generate_headers(
            DeficiencyKind::RequiredKeyMissing,
            &parameters(),
            &JsonPath::root(),
            &mut rng,
        );
        assert_eq!(required.len(), 1);
        assert_eq!(required[0].header.as_deref(), Some("X-Api-Version"));
        assert!(required[0].value.get("X-Api-Version").is_none());

        let optional = generator.generate_headers(
            DeficiencyKind::OptionalKeyMissing,
            &parameters(),
            &JsonPath::root(),
            &mut rng,
        );
        assert_eq!(optional.len(), 1);
        assert_eq!(optional[0].header.as_deref(), Some("X-Locale"));
    }

    #[test]
    fn test_header_faults_validate_against_the_header_set() {
        let mut rng = StdRng::seed_from_u64(8);
        let parameters = parameters();
        let schema = Parameter::headers_schema(&parameters);
        let validator = Validator::default();

        let found = DeficientGenerator::default().generate_all_headers(
            &parameters,
            &JsonPath::root(),
            &mut rng,
        );
        assert!(!found.is_empty());
        for deficiency in &found {
            let errors = validator.validate_value(&deficiency.value, &schema, &JsonPath::root());
            match deficiency.expected_error() {
                Some(kind) => {
                    assert_eq!(errors.len(), 1, "{:?}", deficiency);
                    assert_eq!(errors[0].kind, kind);
                }
                None => assert!(errors.is_empty()),
            }
        }
    }
}
