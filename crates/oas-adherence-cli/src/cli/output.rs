//! Output formatting for the adherence CLI
//!
//! JSON and YAML for machines, colored tables for people.

use clap::ValueEnum;
use colored::Colorize;
use oas_adherence_core::ErrorRecord;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

use crate::error::{AppError, Result};
use crate::runner::{CaseOutcome, RunSummary};
use crate::suite::{EndpointSuite, Expectation, TestCase};

/// Output format options for CLI results
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum OutputFormat {
    /// Human-readable table format with colors
    #[default]
    Table,
    /// JSON format for machine processing
    Json,
    /// YAML format
    Yaml,
}

/// Something the CLI can print in every [`OutputFormat`]
pub trait Render: Serialize {
    /// Write the table form
    fn render_table(&self, out: &mut dyn Write) -> Result<()>;

    /// Print to stdout in the given format
    fn render(&self, format: OutputFormat) -> Result<()> {
        let mut stdout = io::stdout();
        self.render_to(format, &mut stdout)?;
        stdout.flush().ok();
        Ok(())
    }

    /// Write in the given format
    fn render_to(&self, format: OutputFormat, out: &mut dyn Write) -> Result<()> {
        match format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(self)
                    .map_err(|e| AppError::SerializationError(e.to_string()))?;
                writeln!(out, "{}", json).ok();
                Ok(())
            }
            OutputFormat::Yaml => {
                let yaml = serde_yaml::to_string(self)
                    .map_err(|e| AppError::SerializationError(e.to_string()))?;
                writeln!(out, "{}", yaml).ok();
                Ok(())
            }
            OutputFormat::Table => self.render_table(out),
        }
    }
}

/// Generated suites, printed by `generate`
#[derive(Debug, Clone, Serialize)]
pub struct SuiteOutput<'a> {
    pub seed: Option<u64>,
    pub suites: &'a [EndpointSuite],
}

impl<'a> SuiteOutput<'a> {
    pub fn new(suites: &'a [EndpointSuite], seed: Option<u64>) -> Self {
        Self { seed, suites }
    }
}

impl Render for SuiteOutput<'_> {
    fn render_table(&self, out: &mut dyn Write) -> Result<()> {
        writeln!(out).ok();
        writeln!(out, "{}", "Generated Test Suites".cyan().bold()).ok();
        writeln!(out, "{}", "=".repeat(60)).ok();

        for suite in self.suites {
            writeln!(out).ok();
            writeln!(
                out,
                "{} {}",
                suite.endpoint.name().bold(),
                format!("({} cases, {} deficient)", suite.cases.len(), suite.deficient_count()).dimmed()
            )
            .ok();
            writeln!(out, "{}", "-".repeat(60)).ok();
            for case in &suite.cases {
                case_row(out, case);
            }
        }

        if let Some(seed) = self.seed {
            writeln!(out).ok();
            writeln!(out, "Seed: {}", seed.to_string().dimmed()).ok();
        }
        Ok(())
    }
}

fn case_row(out: &mut dyn Write, case: &TestCase) {
    let expectation = match case.expectation {
        Expectation::Success => "2xx".green(),
        Expectation::Rejection => "4xx".yellow(),
    };
    writeln!(out, "  [{}] {}", expectation, case.name).ok();
    if let Some(body) = &case.body {
        writeln!(out, "      {} {}", "body:".dimmed(), body).ok();
    }
    if !case.headers.is_empty() {
        writeln!(
            out,
            "      {} {}",
            "headers:".dimmed(),
            serde_json::Value::Object(case.headers.clone())
        )
        .ok();
    }
}

impl Render for RunSummary {
    fn render_table(&self, out: &mut dyn Write) -> Result<()> {
        writeln!(out).ok();
        writeln!(out, "{}", "Adherence Results".cyan().bold()).ok();
        writeln!(out, "{}", "=".repeat(60)).ok();
        writeln!(out).ok();

        for (endpoint, tally) in &self.endpoints {
            let icon = if tally.failed == 0 { "+".green() } else { "x".red() };
            writeln!(
                out,
                "{} {:<40} {} passed, {} failed",
                icon,
                endpoint,
                tally.passed.to_string().green(),
                tally.failed.to_string().red()
            )
            .ok();
        }

        let failures: Vec<&CaseOutcome> = self.failures().collect();
        if !failures.is_empty() {
            writeln!(out).ok();
            writeln!(out, "{}", "Failures:".cyan().bold()).ok();
            writeln!(out, "{}", "-".repeat(60)).ok();
            for outcome in failures {
                failure_row(out, outcome);
            }
        }

        writeln!(out).ok();
        let summary = format!(
            "{} of {} cases passed",
            self.passed,
            self.total()
        );
        if self.is_success() {
            writeln!(out, "{} {}", "+".green(), summary).ok();
        } else {
            writeln!(out, "{} {}", "x".red(), summary).ok();
        }
        let elapsed = self.finished_at - self.started_at;
        writeln!(
            out,
            "Run {} completed in {} ms",
            self.run_id.to_string().dimmed(),
            elapsed.num_milliseconds().to_string().dimmed()
        )
        .ok();
        Ok(())
    }
}

fn failure_row(out: &mut dyn Write, outcome: &CaseOutcome) {
    writeln!(out).ok();
    writeln!(
        out,
        "{} {} {}",
        "x".red(),
        outcome.endpoint.bold(),
        outcome.case
    )
    .ok();
    if let Some(failure) = &outcome.failure {
        writeln!(out, "  {} {}", "Reason:".dimmed(), failure).ok();
    }
    if outcome.attempts > 1 {
        writeln!(out, "  {} {}", "Attempts:".dimmed(), outcome.attempts).ok();
    }
    for error in &outcome.errors {
        error_row(out, error);
    }
}

fn error_row(out: &mut dyn Write, error: &ErrorRecord) {
    writeln!(
        out,
        "  {} [{}] {} {}",
        "-".red(),
        error.kind.as_str().dimmed(),
        error.path.as_str().cyan(),
        error.message
    )
    .ok();
}

/// Validation errors of a single value, printed by `validate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub error_count: usize,
    pub errors: Vec<ErrorRecord>,
}

impl ValidationReport {
    pub fn from_errors(errors: Vec<ErrorRecord>) -> Self {
        Self {
            valid: errors.is_empty(),
            error_count: errors.len(),
            errors,
        }
    }
}

impl Render for ValidationReport {
    fn render_table(&self, out: &mut dyn Write) -> Result<()> {
        writeln!(out).ok();
        writeln!(out, "{}", "Validation Results".cyan().bold()).ok();
        writeln!(out, "{}", "=".repeat(60)).ok();
        writeln!(out).ok();

        if self.valid {
            writeln!(out, "{} Value conforms to the schema", "+".green()).ok();
            return Ok(());
        }

        writeln!(out, "{} {} error(s)", "x".red(), self.error_count).ok();
        for error in &self.errors {
            error_row(out, error);
        }
        Ok(())
    }
}
