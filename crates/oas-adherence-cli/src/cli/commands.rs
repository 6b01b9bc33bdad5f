//! CLI command definitions for the adherence tester
//!
//! Clap-based commands for running suites against a live API, printing
//! generated suites, and validating a single value against a schema.

use clap::{Parser, Subcommand};
use oas_adherence_core::{JsonPath, Schema, ValidationOptions, Validator};
use std::path::{Path, PathBuf};

use super::output::{OutputFormat, Render, SuiteOutput, ValidationReport};
use super::ExitCode;
use crate::config::RunnerConfig;
use crate::error::{AppError, Result};
use crate::oas::{parse_structured, Endpoint, OasDocument};
use crate::runner::Runner;
use crate::suite::{EndpointSuite, SuiteBuilder};

/// OpenAPI adherence tester
///
/// Sends conformant and deliberately deficient requests to an API and
/// checks that it accepts the former, rejects the latter, and answers
/// with bodies matching its documented response schemas.
#[derive(Parser, Debug)]
#[command(name = "adherence")]
#[command(about = "OpenAPI adherence tester - exercise an API with conformant and deficient requests", long_about = None)]
#[command(version)]
pub struct AdherenceCli {
    /// Output verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: AdherenceCommands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum AdherenceCommands {
    /// Build the test suite and run it against a live API
    Run {
        /// Path to the OpenAPI document (.json, .yaml, .yml)
        #[arg(short, long)]
        spec: PathBuf,

        /// Path to a TOML runner configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Base URL of the API; defaults to the document's first server
        #[arg(long)]
        base_url: Option<String>,

        /// Report undeclared response fields and unsupported formats
        #[arg(long)]
        strict: bool,

        /// Seed for reproducible value generation
        #[arg(long)]
        seed: Option<u64>,

        /// Endpoints tested at the same time
        #[arg(long)]
        concurrency: Option<usize>,

        /// Output format for the results
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Print the generated test suite without sending anything
    Generate {
        /// Path to the OpenAPI document (.json, .yaml, .yml)
        #[arg(short, long)]
        spec: PathBuf,

        /// Path to a TOML runner configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seed for reproducible value generation
        #[arg(long)]
        seed: Option<u64>,

        /// Output format for the suite
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Validate a JSON or YAML value against a schema file
    Validate {
        /// Path to the schema (.json, .yaml, .yml)
        #[arg(long)]
        schema: PathBuf,

        /// Path to the value (.json, .yaml, .yml)
        #[arg(long)]
        value: PathBuf,

        /// Report undeclared fields and unsupported formats
        #[arg(long)]
        strict: bool,

        /// Output format for the error records
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

/// Settings for the run command
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub spec: PathBuf,
    pub config: Option<PathBuf>,
    pub base_url: Option<String>,
    pub strict: bool,
    pub seed: Option<u64>,
    pub concurrency: Option<usize>,
    pub format: OutputFormat,
}

/// Execute the run command
pub fn execute_run(args: RunArgs) -> Result<ExitCode> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(url) = args.base_url {
        config = config.with_base_url(url);
    }
    if args.strict {
        config = config.with_strict_validation(true);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(concurrency) = args.concurrency {
        config = config.with_concurrency(concurrency);
    }

    let document = OasDocument::load(&args.spec)?;
    let endpoints = require_endpoints(&document)?;
    let base_url = match config.base_url.clone().or_else(|| document.server_url().map(str::to_string)) {
        Some(url) => url,
        None => {
            return Err(AppError::invalid_input(
                "no base URL: pass --base-url or declare a server in the document",
            ))
        }
    };

    let suites = build_suites(&config, &endpoints);
    let runner = Runner::new(config, &base_url)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::InternalError(format!("failed to start async runtime: {}", e)))?;
    let summary = runtime.block_on(runner.run(suites))?;

    summary.render(args.format)?;

    if summary.is_success() {
        Ok(ExitCode::Success)
    } else {
        Ok(ExitCode::Failures)
    }
}

/// Execute the generate command
pub fn execute_generate(
    spec: PathBuf,
    config: Option<PathBuf>,
    seed: Option<u64>,
    format: OutputFormat,
) -> Result<ExitCode> {
    let mut config = load_config(config.as_deref())?;
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }

    let document = OasDocument::load(&spec)?;
    let endpoints = require_endpoints(&document)?;
    let suites = build_suites(&config, &endpoints);

    SuiteOutput::new(&suites, config.seed).render(format)?;
    Ok(ExitCode::Success)
}

/// Execute the validate command
pub fn execute_validate(
    schema: PathBuf,
    value: PathBuf,
    strict: bool,
    format: OutputFormat,
) -> Result<ExitCode> {
    let schema = Schema::from_value(&load_structured_file(&schema, "schema")?)?;
    let value = load_structured_file(&value, "value")?;

    let validator = Validator::new(ValidationOptions::new().with_strict_validation(strict));
    let report = ValidationReport::from_errors(validator.validate_value(&value, &schema, &JsonPath::root()));
    report.render(format)?;

    if report.valid {
        Ok(ExitCode::Success)
    } else {
        Ok(ExitCode::Failures)
    }
}

/// Defaults, then the TOML file, then the environment
fn load_config(path: Option<&Path>) -> Result<RunnerConfig> {
    let config = match path {
        Some(path) => RunnerConfig::from_file(path)?,
        None => RunnerConfig::default(),
    };
    Ok(config.apply_env())
}

fn require_endpoints(document: &OasDocument) -> Result<Vec<Endpoint>> {
    let endpoints = document.endpoints()?;
    if endpoints.is_empty() {
        return Err(AppError::invalid_input("the document declares no operations"));
    }
    Ok(endpoints)
}

fn build_suites(config: &RunnerConfig, endpoints: &[Endpoint]) -> Vec<EndpointSuite> {
    SuiteBuilder::new(config.deficiency)
        .with_overrides(config.overrides.clone())
        .build_all(endpoints, config.seed)
}

/// Read and parse a JSON or YAML file
fn load_structured_file(path: &Path, what: &str) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AppError::file_error(format!(
            "Failed to read {} file '{}': {}",
            what,
            path.display(),
            e
        ))
    })?;
    parse_structured(path, &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        AdherenceCli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = AdherenceCli::parse_from([
            "adherence",
            "-vv",
            "run",
            "--spec",
            "petstore.yaml",
            "--seed",
            "7",
            "--format",
            "json",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            AdherenceCommands::Run { spec, seed, format, strict, .. } => {
                assert_eq!(spec, PathBuf::from("petstore.yaml"));
                assert_eq!(seed, Some(7));
                assert_eq!(format, OutputFormat::Json);
                assert!(!strict);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_validate_command_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("schema.json");
        std::fs::write(
            &schema,
            r#"{"type": "object", "required": ["id"], "properties": {"id": {"type": "integer"}}}"#,
        )
        .unwrap();
        let good = dir.path().join("good.yaml");
        std::fs::write(&good, "id: 4\n").unwrap();
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"id": "four"}"#).unwrap();

        let code = execute_validate(schema.clone(), good, false, OutputFormat::Json).unwrap();
        assert_eq!(code, ExitCode::Success);
        let code = execute_validate(schema.clone(), bad, false, OutputFormat::Json).unwrap();
        assert_eq!(code, ExitCode::Failures);

        let err = execute_validate(schema, dir.path().join("missing.json"), false, OutputFormat::Json)
            .unwrap_err();
        assert!(matches!(err, AppError::FileError(_)));
    }

    #[test]
    fn test_generate_rejects_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let spec = dir.path().join("empty.yaml");
        std::fs::write(&spec, "openapi: 3.0.0\npaths: {}\n").unwrap();
        let err = execute_generate(spec, None, Some(1), OutputFormat::Json).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
