//! OpenAPI document loading
//!
//! Loads an OAS 3.0 document and lists the endpoints a suite is built for.
//! Local `$ref`s are resolved when an endpoint is built, so components no
//! endpoint reaches are never followed.

use oas_adherence_core::{Parameter, ParameterLocation, Schema};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{AppError, Result};

const JSON_MEDIA_TYPE: &str = "application/json";

/// HTTP methods an OAS path item can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    /// Every method, in path-item key order
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Post,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Patch,
        HttpMethod::Trace,
    ];

    /// The lowercase key used in path items
    pub fn key(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
            HttpMethod::Trace => "trace",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key().to_uppercase())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Options => reqwest::Method::OPTIONS,
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Trace => reqwest::Method::TRACE,
        }
    }
}

/// One operation of the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub method: HttpMethod,
    /// Path template, e.g. `/pets/{petId}`
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Path-level and operation-level parameters, operation entries first
    pub parameters: Vec<Parameter>,
    /// `application/json` request body schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Schema>,
    /// `application/json` response schemas keyed by status (`200`, `2XX`, `default`)
    pub responses: BTreeMap<String, Schema>,
}

impl Endpoint {
    /// Human-readable name such as `POST /pets`
    pub fn name(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    /// Parameters travelling in one location
    pub fn parameters_in(&self, location: ParameterLocation) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(move |p| p.location == location)
    }

    /// The response schema for a status code: exact code, then its range
    /// (`2XX`), then `default`
    pub fn response_schema(&self, status: u16) -> Option<&Schema> {
        let exact = status.to_string();
        let range = format!("{}XX", status / 100);
        self.responses
            .get(&exact)
            .or_else(|| {
                self.responses
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(&range))
                    .map(|(_, schema)| schema)
            })
            .or_else(|| self.responses.get("default"))
    }
}

/// A loaded OAS document
#[derive(Debug, Clone)]
pub struct OasDocument {
    root: Value,
}

impl OasDocument {
    /// Load a document from `.json`, `.yaml` or `.yml`
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::file_error(format!(
                "Failed to read document '{}': {}",
                path.display(),
                e
            ))
        })?;
        let raw = parse_structured(path, &content)?;
        Self::from_value(raw)
    }

    /// Build a document from its parsed form
    pub fn from_value(raw: Value) -> Result<Self> {
        if raw.get("paths").and_then(Value::as_object).is_none() {
            return Err(AppError::schema_error("document has no 'paths' object"));
        }
        if let Some(version) = raw.get("openapi").and_then(Value::as_str) {
            if !version.starts_with("3.") {
                warn!(version, "Document is not OpenAPI 3.x; continuing anyway");
            }
        }
        Ok(Self { root: raw })
    }

    /// The document as loaded, `$ref`s intact
    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// URL of the first entry in `servers`
    pub fn server_url(&self) -> Option<&str> {
        self.root
            .get("servers")?
            .as_array()?
            .first()?
            .get("url")?
            .as_str()
    }

    /// Every operation, ordered by path then method
    ///
    /// Fails with a schema error when an endpoint reaches a cyclic,
    /// unresolved or non-local `$ref`.
    pub fn endpoints(&self) -> Result<Vec<Endpoint>> {
        let Some(paths) = self.root.get("paths").and_then(Value::as_object) else {
            return Ok(Vec::new());
        };

        let mut resolver = RefResolver::new(&self.root);
        let mut endpoints = Vec::new();
        for (path, item) in paths {
            let shared = parameters_of(&resolver.field(item, "parameters")?)?;
            for method in HttpMethod::ALL {
                let Some(operation) = item.get(method.key()) else {
                    continue;
                };
                let endpoint = build_endpoint(method, path, operation, &shared, &mut resolver)?;
                debug!(endpoint = %endpoint.name(), parameters = endpoint.parameters.len(), "Found endpoint");
                endpoints.push(endpoint);
            }
        }
        Ok(endpoints)
    }
}

fn build_endpoint(
    method: HttpMethod,
    path: &str,
    operation: &Value,
    shared: &[Parameter],
    resolver: &mut RefResolver<'_>,
) -> Result<Endpoint> {
    let mut parameters = parameters_of(&resolver.field(operation, "parameters")?)?;
    for parameter in shared {
        let overridden = parameters
            .iter()
            .any(|p| p.name == parameter.name && p.location == parameter.location);
        if !overridden {
            parameters.push(parameter.clone());
        }
    }

    let request_body = resolver
        .field(operation, "requestBody")?
        .as_ref()
        .and_then(json_schema_of)
        .map(Schema::from_value)
        .transpose()?;

    let mut responses = BTreeMap::new();
    if let Some(Value::Object(entries)) = resolver.field(operation, "responses")? {
        for (status, response) in &entries {
            if let Some(schema) = json_schema_of(response) {
                responses.insert(status.clone(), Schema::from_value(schema)?);
            }
        }
    }

    Ok(Endpoint {
        method,
        path: path.to_string(),
        operation_id: operation
            .get("operationId")
            .and_then(Value::as_str)
            .map(str::to_string),
        parameters,
        request_body,
        responses,
    })
}

fn parameters_of(parameters: &Option<Value>) -> Result<Vec<Parameter>> {
    match parameters.as_ref().and_then(Value::as_array) {
        Some(entries) => entries
            .iter()
            .map(|entry| Parameter::from_value(entry).map_err(AppError::from))
            .collect(),
        None => Ok(Vec::new()),
    }
}

/// The `content["application/json"].schema` of a request body or response
fn json_schema_of(holder: &Value) -> Option<&Value> {
    holder.get("content")?.get(JSON_MEDIA_TYPE)?.get("schema")
}

/// Follows local `$ref`s on demand
///
/// Each reference is resolved once per document; a reference met again
/// while its own target is still being resolved is a cycle.
struct RefResolver<'a> {
    root: &'a Value,
    resolved: HashMap<String, Value>,
    chain: Vec<String>,
}

impl<'a> RefResolver<'a> {
    fn new(root: &'a Value) -> Self {
        Self {
            root,
            resolved: HashMap::new(),
            chain: Vec::new(),
        }
    }

    /// `holder[key]` with every reference inside it resolved
    fn field(&mut self, holder: &Value, key: &str) -> Result<Option<Value>> {
        holder.get(key).map(|value| self.resolve(value)).transpose()
    }

    fn resolve(&mut self, value: &Value) -> Result<Value> {
        match value {
            Value::Object(object) => {
                if let Some(reference) = object.get("$ref").and_then(Value::as_str) {
                    return self.follow(reference);
                }
                let mut resolved = Map::with_capacity(object.len());
                for (key, child) in object {
                    resolved.insert(key.clone(), self.resolve(child)?);
                }
                Ok(Value::Object(resolved))
            }
            Value::Array(items) => items
                .iter()
                .map(|child| self.resolve(child))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        }
    }

    fn follow(&mut self, reference: &str) -> Result<Value> {
        if let Some(done) = self.resolved.get(reference) {
            return Ok(done.clone());
        }
        if self.chain.iter().any(|r| r == reference) {
            return Err(AppError::schema_error(format!(
                "cyclic $ref '{}' (via {})",
                reference,
                self.chain.join(" -> ")
            )));
        }

        let target = lookup_ref(reference, self.root)?;
        self.chain.push(reference.to_string());
        let outcome = self.resolve(target);
        self.chain.pop();

        let value = outcome?;
        self.resolved.insert(reference.to_string(), value.clone());
        Ok(value)
    }
}

fn lookup_ref<'a>(reference: &str, root: &'a Value) -> Result<&'a Value> {
    let Some(pointer) = reference.strip_prefix('#') else {
        return Err(AppError::schema_error(format!(
            "only local references are supported, found '{}'",
            reference
        )));
    };
    root.pointer(pointer)
        .ok_or_else(|| AppError::schema_error(format!("unresolved reference '{}'", reference)))
}

/// Parse a JSON or YAML file by its extension
pub fn parse_structured(path: &Path, content: &str) -> Result<Value> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "json" => Ok(serde_json::from_str(content)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(content)?),
        _ => Err(AppError::invalid_input(format!(
            "Unsupported file extension '{}': expected .json, .yaml or .yml",
            extension
        ))),
    }
}
