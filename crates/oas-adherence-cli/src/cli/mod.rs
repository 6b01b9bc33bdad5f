//! CLI module for the adherence tester
//!
//! Command definitions, output rendering, and the mapping from results
//! to process exit codes.

pub mod commands;
pub mod output;

pub use commands::{AdherenceCli, AdherenceCommands, RunArgs};
pub use output::{OutputFormat, Render};

use tracing::Level;

use crate::error::{AppError, Result};

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Every case passed, or the value is valid
    Success = 0,
    /// At least one case failed, or the value has errors
    Failures = 1,
    /// Invalid input, arguments or configuration
    InvalidInput = 3,
    /// File not found or inaccessible
    FileError = 4,
    /// Unusable document or schema
    SchemaError = 5,
    /// Internal error
    InternalError = 10,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    /// Exit code for a command that failed outright
    pub fn from_error(err: &AppError) -> Self {
        match err {
            AppError::FileError(_) => ExitCode::FileError,
            AppError::SchemaError(_) => ExitCode::SchemaError,
            e if e.is_user_error() => ExitCode::InvalidInput,
            _ => ExitCode::InternalError,
        }
    }
}

/// Log level selected by `-v` flags, or errors only under `--quiet`
pub fn log_level(verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::ERROR;
    }
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Run the CLI with the given arguments and return the exit code
pub fn run(cli: AdherenceCli) -> Result<ExitCode> {
    match cli.command {
        AdherenceCommands::Run {
            spec,
            config,
            base_url,
            strict,
            seed,
            concurrency,
            format,
        } => commands::execute_run(RunArgs {
            spec,
            config,
            base_url,
            strict,
            seed,
            concurrency,
            format,
        }),
        AdherenceCommands::Generate {
            spec,
            config,
            seed,
            format,
        } => commands::execute_generate(spec, config, seed, format),
        AdherenceCommands::Validate {
            schema,
            value,
            strict,
            format,
        } => commands::execute_validate(schema, value, strict, format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_conversion() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::Failures), 1);
        assert_eq!(i32::from(ExitCode::InternalError), 10);
    }

    #[test]
    fn test_exit_code_from_error() {
        assert_eq!(ExitCode::from_error(&AppError::file_error("gone")), ExitCode::FileError);
        assert_eq!(ExitCode::from_error(&AppError::schema_error("cyclic")), ExitCode::SchemaError);
        assert_eq!(ExitCode::from_error(&AppError::config_error("port")), ExitCode::InvalidInput);
        assert_eq!(
            ExitCode::from_error(&AppError::ParseError("eof".to_string())),
            ExitCode::InvalidInput
        );
        assert_eq!(
            ExitCode::from_error(&AppError::HttpError("tls".to_string())),
            ExitCode::InternalError
        );
    }

    #[test]
    fn test_log_level() {
        assert_eq!(log_level(0, false), Level::WARN);
        assert_eq!(log_level(2, false), Level::DEBUG);
        assert_eq!(log_level(5, false), Level::TRACE);
        assert_eq!(log_level(3, true), Level::ERROR);
    }
}
