//! Test suite construction
//!
//! Turns endpoints into concrete request cases: one conformant request
//! and one request per body or header deficiency, each with the status
//! class the server is expected to answer with.

use oas_adherence_core::{
    ConformantGenerator, Deficiency, DeficiencyKind, DeficiencyOptions, DeficientGenerator,
    JsonPath, Overrides, ParameterLocation, Target,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, info, warn};

use crate::oas::{Endpoint, HttpMethod};

/// Status class a case is expected to receive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expectation {
    /// Any 2xx status
    Success,
    /// Any 4xx status
    Rejection,
}

impl Expectation {
    /// Whether a response status satisfies the expectation
    pub fn is_met_by(&self, status: u16) -> bool {
        match self {
            Expectation::Success => (200..300).contains(&status),
            Expectation::Rejection => (400..500).contains(&status),
        }
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Success => write!(f, "2xx"),
            Expectation::Rejection => write!(f, "4xx"),
        }
    }
}

/// One request to send and the outcome it should produce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub method: HttpMethod,
    /// Path with every `{param}` substituted
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Deficiency category, absent for the conformant case
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<DeficiencyKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
    /// Header under test
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    /// Location of the injected fault
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault_path: Option<JsonPath>,
    pub expectation: Expectation,
}

impl TestCase {
    /// Whether this is the conformant case
    pub fn is_conformant(&self) -> bool {
        self.category.is_none()
    }

    /// Header values as sent on the wire
    pub fn header_pairs(&self) -> Vec<(String, String)> {
        self.headers
            .iter()
            .map(|(name, value)| (name.clone(), wire_text(value)))
            .collect()
    }
}

/// Every case built for one endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointSuite {
    pub endpoint: Endpoint,
    pub cases: Vec<TestCase>,
}

impl EndpointSuite {
    /// Number of deficient cases
    pub fn deficient_count(&self) -> usize {
        self.cases.iter().filter(|c| !c.is_conformant()).count()
    }
}

/// Path and query values shared by every case of an endpoint
struct RequestBase {
    path: String,
    query: Vec<(String, String)>,
    headers: Map<String, Value>,
    body: Option<Value>,
}

/// Builds endpoint suites from generator settings
#[derive(Debug, Clone, Default)]
pub struct SuiteBuilder {
    options: DeficiencyOptions,
    overrides: Overrides,
}

impl SuiteBuilder {
    /// Create a builder with the given deficiency switches
    pub fn new(options: DeficiencyOptions) -> Self {
        Self {
            options,
            overrides: Overrides::new(),
        }
    }

    /// Pin generated values at the given paths
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Build the suites of every endpoint.
    ///
    /// Each endpoint draws from its own generator seeded from a master
    /// generator, so one endpoint's cases do not depend on another's.
    pub fn build_all(&self, endpoints: &[Endpoint], seed: Option<u64>) -> Vec<EndpointSuite> {
        let mut master = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let suites: Vec<EndpointSuite> = endpoints
            .iter()
            .map(|endpoint| {
                let mut rng = StdRng::seed_from_u64(master.gen());
                self.build(endpoint, &mut rng)
            })
            .collect();

        info!(
            endpoints = suites.len(),
            cases = suites.iter().map(|s| s.cases.len()).sum::<usize>(),
            "Built test suites"
        );
        suites
    }

    /// Build the suite of one endpoint
    pub fn build<R: Rng + ?Sized>(&self, endpoint: &Endpoint, rng: &mut R) -> EndpointSuite {
        let conformant = ConformantGenerator::with_overrides(&self.overrides);
        let deficient = DeficientGenerator::new(self.options).with_overrides(&self.overrides);
        let root = JsonPath::root();

        let base = self.request_base(&conformant, endpoint, rng);
        let mut cases = vec![TestCase {
            name: "conformant".to_string(),
            method: endpoint.method,
            path: base.path.clone(),
            query: base.query.clone(),
            headers: base.headers.clone(),
            body: base.body.clone(),
            category: None,
            target: None,
            header: None,
            fault_path: None,
            expectation: Expectation::Success,
        }];

        let header_root = override_root(ParameterLocation::Header);
        for kind in DeficiencyKind::ALL {
            if let Some(schema) = &endpoint.request_body {
                for deficiency in deficient.generate(kind, schema, &root, rng) {
                    cases.push(deficient_case(endpoint, &base, deficiency));
                }
            }
            for deficiency in deficient.generate_headers(kind, &endpoint.parameters, &header_root, rng) {
                cases.push(deficient_case(endpoint, &base, deficiency));
            }
        }

        debug!(endpoint = %endpoint.name(), cases = cases.len(), "Built endpoint suite");
        EndpointSuite {
            endpoint: endpoint.clone(),
            cases,
        }
    }

    fn request_base<R: Rng + ?Sized>(
        &self,
        conformant: &ConformantGenerator<'_>,
        endpoint: &Endpoint,
        rng: &mut R,
    ) -> RequestBase {
        let path_root = override_root(ParameterLocation::Path);
        let mut path = endpoint.path.clone();
        for parameter in endpoint.parameters_in(ParameterLocation::Path) {
            let value = conformant
                .generate(parameter.schema.as_ref(), &path_root.key(&parameter.name), rng)
                .unwrap_or_else(|| {
                    warn!(endpoint = %endpoint.name(), parameter = %parameter.name, "Path parameter has no schema; sending a placeholder");
                    Value::String("dummy".to_string())
                });
            let segment: String = url::form_urlencoded::byte_serialize(wire_text(&value).as_bytes()).collect();
            path = path.replace(&format!("{{{}}}", parameter.name), &segment);
        }

        let query_root = override_root(ParameterLocation::Query);
        let mut query = Vec::new();
        for parameter in endpoint.parameters_in(ParameterLocation::Query) {
            if let Some(value) = conformant.generate(parameter.schema.as_ref(), &query_root.key(&parameter.name), rng) {
                query.push((parameter.name.clone(), wire_text(&value)));
            }
        }

        RequestBase {
            path,
            query,
            headers: conformant.generate_headers(
                &endpoint.parameters,
                &override_root(ParameterLocation::Header),
                rng,
            ),
            body: endpoint
                .request_body
                .as_ref()
                .and_then(|schema| conformant.generate(Some(schema), &JsonPath::root(), rng)),
        }
    }
}

/// Path under which a parameter location's values are generated and
/// overridden: `$path.petId`, `$query.limit`, `$header.X-Trace`.
/// Request bodies use `$`.
pub fn override_root(location: ParameterLocation) -> JsonPath {
    JsonPath::from(format!("${}", location))
}

fn deficient_case(endpoint: &Endpoint, base: &RequestBase, deficiency: Deficiency) -> TestCase {
    let expectation = if deficiency.expects_rejection() {
        Expectation::Rejection
    } else {
        Expectation::Success
    };

    let (headers, body, name) = match deficiency.target {
        Target::Body => (
            base.headers.clone(),
            Some(deficiency.value),
            format!("{} body {}", deficiency.kind, deficiency.path),
        ),
        Target::Headers => {
            let headers = match deficiency.value {
                Value::Object(headers) => headers,
                _ => base.headers.clone(),
            };
            let name = format!(
                "{} header {}",
                deficiency.kind,
                deficiency.header.as_deref().unwrap_or("?")
            );
            (headers, base.body.clone(), name)
        }
    };

    TestCase {
        name,
        method: endpoint.method,
        path: base.path.clone(),
        query: base.query.clone(),
        headers,
        body,
        category: Some(deficiency.kind),
        target: Some(deficiency.target),
        header: deficiency.header,
        fault_path: Some(deficiency.path),
        expectation,
    }
}

/// Text form of a parameter value: strings as-is, everything else as JSON
pub fn wire_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oas::OasDocument;
    use serde_json::json;

    fn endpoint() -> Endpoint {
        let document = OasDocument::from_value(json!({
            "openapi": "3.0.0",
            "paths": {
                "/owners/{ownerId}/pets": {
                    "post": {
                        "parameters": [
                            { "name": "ownerId", "in": "path", "required": true, "schema": { "type": "integer", "minimum": 1, "maximum": 9 } },
                            { "name": "dryRun", "in": "query", "schema": { "type": "boolean" } },
                            { "name": "X-Api-Version", "in": "header", "required": true, "schema": { "type": "string", "enum": ["1", "2"] } }
                        ],
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "required": ["name"],
                                        "properties": {
                                            "name": { "type": "string", "minLength": 2, "maxLength": 8 },
                                            "age": { "type": "integer", "minimum": 0, "maximum": 30 }
                                        }
                                    }
                                }
                            }
                        },
                        "responses": { "201": { "description": "created" } }
                    }
                }
            }
        }))
        .unwrap();
        document.endpoints().unwrap().remove(0)
    }

    #[test]
    fn test_expectation_status_classes() {
        assert!(Expectation::Success.is_met_by(204));
        assert!(!Expectation::Success.is_met_by(400));
        assert!(Expectation::Rejection.is_met_by(422));
        assert!(!Expectation::Rejection.is_met_by(500));
    }

    #[test]
    fn test_conformant_case_comes_first() {
        let mut rng = StdRng::seed_from_u64(1);
        let suite = SuiteBuilder::default().build(&endpoint(), &mut rng);
        let first = &suite.cases[0];
        assert!(first.is_conformant());
        assert_eq!(first.expectation, Expectation::Success);
        assert!(!first.path.contains('{'));
        assert!(first.path.starts_with("/owners/"));
        assert!(first.headers.contains_key("X-Api-Version"));
        assert!(first.body.as_ref().unwrap().get("name").is_some());
        assert_eq!(first.query.len(), 1);
    }

    #[test]
    fn test_deficient_cases_carry_expectations() {
        let mut rng = StdRng::seed_from_u64(2);
        let suite = SuiteBuilder::default().build(&endpoint(), &mut rng);
        assert!(suite.deficient_count() > 0);

        for case in suite.cases.iter().filter(|c| !c.is_conformant()) {
            let expected = match case.category {
                Some(DeficiencyKind::OptionalKeyMissing) => Expectation::Success,
                _ => Expectation::Rejection,
            };
            assert_eq!(case.expectation, expected, "{}", case.name);
        }

        let header_case = suite
            .cases
            .iter()
            .find(|c| c.target == Some(Target::Headers) && c.category == Some(DeficiencyKind::RequiredKeyMissing))
            .unwrap();
        assert_eq!(header_case.header.as_deref(), Some("X-Api-Version"));
        assert!(!header_case.headers.contains_key("X-Api-Version"));
        assert!(header_case.body.is_some());

        assert!(suite.cases.iter().any(|c| {
            c.target == Some(Target::Body)
                && c.category == Some(DeficiencyKind::StringLength)
                && c.fault_path.as_ref().map(JsonPath::as_str) == Some("$.name")
        }));
    }

    #[test]
    fn test_overrides_reach_every_case() {
        let overrides: Overrides = [("$.name".to_string(), json!("Rex"))].into_iter().collect();
        let builder = SuiteBuilder::default().with_overrides(overrides);
        let mut rng = StdRng::seed_from_u64(3);
        let suite = builder.build(&endpoint(), &mut rng);
        assert_eq!(suite.cases[0].body.as_ref().unwrap()["name"], json!("Rex"));
        assert!(suite
            .cases
            .iter()
            .filter(|c| c.target == Some(Target::Headers))
            .all(|c| c.body.as_ref().unwrap()["name"] == json!("Rex")));
    }

    #[test]
    fn test_parameter_overrides_are_namespaced() {
        let overrides: Overrides = [
            ("$.name".to_string(), json!("Rex")),
            ("$path.ownerId".to_string(), json!(4)),
            ("$query.dryRun".to_string(), json!(true)),
            ("$header.X-Api-Version".to_string(), json!("2")),
            ("$.dryRun".to_string(), json!(false)),
            ("$.X-Api-Version".to_string(), json!("1")),
        ]
        .into_iter()
        .collect();
        let builder = SuiteBuilder::default().with_overrides(overrides);
        let mut rng = StdRng::seed_from_u64(4);
        let suite = builder.build(&endpoint(), &mut rng);

        let first = &suite.cases[0];
        assert_eq!(first.path, "/owners/4/pets");
        assert_eq!(first.query, vec![("dryRun".to_string(), "true".to_string())]);
        assert_eq!(first.headers["X-Api-Version"], json!("2"));
        let body = first.body.as_ref().unwrap();
        assert_eq!(body["name"], json!("Rex"));
        assert!(body.get("dryRun").is_none());
        assert!(body.get("X-Api-Version").is_none());

        let header_case = suite
            .cases
            .iter()
            .find(|c| c.target == Some(Target::Headers) && c.category == Some(DeficiencyKind::RequiredKeyMissing))
            .unwrap();
        assert_eq!(
            header_case.fault_path.as_ref().map(JsonPath::as_str),
            Some("$header.X-Api-Version")
        );
    }

    #[test]
    fn test_seeded_builds_are_reproducible() {
        let endpoints = vec![endpoint()];
        let builder = SuiteBuilder::default();
        assert_eq!(builder.build_all(&endpoints, Some(9)), builder.build_all(&endpoints, Some(9)));
    }

    #[test]
    fn test_wire_text() {
        assert_eq!(wire_text(&json!("abc")), "abc");
        assert_eq!(wire_text(&json!(7)), "7");
        assert_eq!(wire_text(&json!(true)), "true");
    }
}
