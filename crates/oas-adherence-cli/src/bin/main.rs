//! OAS adherence tester
//!
//! # Usage
//!
//! ```bash
//! adherence run --spec petstore.yaml --base-url http://localhost:8080
//! adherence generate --spec petstore.yaml --seed 42 --format yaml
//! adherence validate --schema pet.json --value response.json
//! ```
//!
//! Logs go to stderr; `RUST_LOG` takes precedence over `-v`/`--quiet`.
//! Set `OAS_ADHERENCE_LOG_FORMAT=json` for JSON log lines.

use clap::Parser;
use oas_adherence_cli::cli::log_level;
use oas_adherence_cli::{run_cli, AdherenceCli};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = AdherenceCli::parse();

    let level = log_level(cli.verbose, cli.quiet);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));
    let json_logs = std::env::var("OAS_ADHERENCE_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    let exit_code = run_cli(cli);
    std::process::exit(exit_code.into());
}
