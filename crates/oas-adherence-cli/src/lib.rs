//! # OAS Adherence CLI
//!
//! Checks that a live API adheres to its OpenAPI 3.0 document.
//!
//! For every operation in the document the tester builds a suite of
//! requests:
//!
//! - one conformant request, generated from the request body, header,
//!   path and query parameter schemas, which the API must accept (2xx)
//! - one request per deficiency: a value with exactly one fault (wrong
//!   type, out-of-enum, out-of-range, wrong length, missing key) in the
//!   body or in a header, which the API must reject (4xx)
//!
//! Successful responses are validated against the documented response
//! schema, and every error found is reported with its JSON path.
//!
//! ## Usage
//!
//! ```bash
//! # Run against the first server declared in the document
//! adherence run --spec petstore.yaml
//!
//! # Run against a local instance with a fixed seed and JSON output
//! adherence run --spec petstore.yaml --base-url http://localhost:8080 --seed 42 --format json
//!
//! # Print the generated suite without sending it
//! adherence generate --spec petstore.yaml --seed 42
//!
//! # Validate a stored response against a schema
//! adherence validate --schema pet.json --value response.json --strict
//! ```
//!
//! ## Configuration
//!
//! Settings are layered: defaults, an optional TOML file (`--config`),
//! `OAS_ADHERENCE_*` environment variables, then command-line flags.
//!
//! ```toml
//! base_url = "http://localhost:8080"
//! strict_validation = false
//! max_retries = 3
//! timeout_ms = 5000
//! concurrency = 4
//!
//! [deficiency]
//! check_maximum_length = false
//!
//! [overrides]
//! "$.owner.id" = 1
//! "$path.petId" = 7
//! "$query.limit" = 10
//! "$header.X-Api-Version" = "2"
//! ```
//!
//! Override keys name the request body from `$`; path, query and header
//! parameters live under `$path`, `$query` and `$header`.
//!
//! ## Exit codes
//!
//! - 0: every case passed
//! - 1: at least one case failed
//! - 3: invalid input, arguments or configuration
//! - 4: file not found or inaccessible
//! - 5: unusable document or schema
//! - 10: internal error

pub mod cli;
pub mod config;
pub mod error;
pub mod oas;
pub mod runner;
pub mod suite;

pub use cli::{AdherenceCli, AdherenceCommands, ExitCode, OutputFormat};
pub use config::RunnerConfig;
pub use error::{AppError, Result};
pub use oas::{Endpoint, HttpMethod, OasDocument};
pub use runner::{CaseOutcome, EndpointTally, RunSummary, Runner};
pub use suite::{EndpointSuite, Expectation, SuiteBuilder, TestCase};

/// Run the CLI and map the outcome to an exit code
///
/// # Example
///
/// ```no_run
/// use clap::Parser;
/// use oas_adherence_cli::{run_cli, AdherenceCli};
///
/// fn main() {
///     let cli = AdherenceCli::parse();
///     let exit_code = run_cli(cli);
///     std::process::exit(exit_code.into());
/// }
/// ```
pub fn run_cli(cli: AdherenceCli) -> ExitCode {
    match cli::run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from_error(&e)
        }
    }
}
