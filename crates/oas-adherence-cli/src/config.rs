//! Runner configuration
//!
//! Layers, lowest precedence first: built-in defaults, an optional TOML
//! file, `OAS_ADHERENCE_*` environment variables, then command-line flags.

use oas_adherence_core::{DeficiencyOptions, Overrides};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::error::{AppError, Result};

/// Prefix of every environment variable read by [`RunnerConfig::apply_env`]
pub const ENV_PREFIX: &str = "OAS_ADHERENCE_";

/// Settings for building and running a suite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Base URL requests are sent to; falls back to the document's first server
    pub base_url: Option<String>,

    /// Report undeclared response fields and unsupported formats as errors
    pub strict_validation: bool,

    /// Attempts per request when the request times out
    pub max_retries: u32,

    /// Delay before the first retry, doubled for each further retry
    pub retry_backoff_ms: u64,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// Endpoints tested at the same time
    pub concurrency: usize,

    /// Seed for value generation; random when absent
    pub seed: Option<u64>,

    /// Deficiency category switches
    pub deficiency: DeficiencyOptions,

    /// Literal values pinned at body paths such as `$.owner.name`
    pub overrides: Overrides,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            strict_validation: false,
            max_retries: 3,
            retry_backoff_ms: 100,
            timeout_ms: 5000,
            concurrency: 4,
            seed: None,
            deficiency: DeficiencyOptions::default(),
            overrides: Overrides::new(),
        }
    }
}

impl RunnerConfig {
    /// Load a configuration file over the defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::file_error(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse a TOML configuration over the defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `OAS_ADHERENCE_*` variables from the process environment
    pub fn apply_env(self) -> Self {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply `OAS_ADHERENCE_*` variables from a lookup function.
    ///
    /// Unparsable values are logged and ignored.
    pub fn apply_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(url) = var("BASE_URL") {
            self.base_url = Some(url);
        }
        parse_into(&var, "STRICT", &mut self.strict_validation);
        parse_into(&var, "MAX_RETRIES", &mut self.max_retries);
        parse_into(&var, "RETRY_BACKOFF_MS", &mut self.retry_backoff_ms);
        parse_into(&var, "TIMEOUT_MS", &mut self.timeout_ms);
        parse_into(&var, "CONCURRENCY", &mut self.concurrency);
        if let Some(raw) = var("SEED") {
            match raw.parse() {
                Ok(seed) => self.seed = Some(seed),
                Err(_) => warn!(variable = "SEED", value = %raw, "Ignoring invalid environment value"),
            }
        }
        self
    }

    /// Set the base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set strict validation
    pub fn with_strict_validation(mut self, strict: bool) -> Self {
        self.strict_validation = strict;
        self
    }

    /// Set the retry budget
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the number of endpoints tested at once
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the generation seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Check values that cannot be fixed up later
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(AppError::config_error("concurrency must be at least 1"));
        }
        if self.max_retries == 0 {
            return Err(AppError::config_error("max_retries must be at least 1"));
        }
        if self.timeout_ms == 0 {
            return Err(AppError::config_error("timeout_ms must be at least 1"));
        }
        if let Some(url) = &self.base_url {
            url::Url::parse(url)
                .map_err(|e| AppError::config_error(format!("invalid base_url '{}': {}", url, e)))?;
        }
        Ok(())
    }
}

fn parse_into<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    name: &str,
    slot: &mut T,
) {
    if let Some(raw) = var(name) {
        match raw.parse() {
            Ok(value) => *slot = value,
            Err(_) => warn!(variable = name, value = %raw, "Ignoring invalid environment value"),
        }
    }
}
