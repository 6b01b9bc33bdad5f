//! Concurrent suite execution
//!
//! Endpoints run as separate tokio tasks, bounded by a semaphore and
//! sharing one HTTP client. Each task reports its case outcomes over a
//! channel; the coordinator folds them into a [`RunSummary`] once every
//! task has finished.

use chrono::{DateTime, Utc};
use oas_adherence_core::{
    DeficiencyKind, ErrorRecord, JsonPath, Target, ValidationOptions, Validator,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::sleep;
use uuid::Uuid;

use crate::config::RunnerConfig;
use crate::error::{AppError, Result};
use crate::oas::{Endpoint, HttpMethod};
use crate::suite::{EndpointSuite, Expectation, TestCase};

const OUTCOME_CHANNEL_CAPACITY: usize = 64;

/// Result of sending one test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseOutcome {
    /// Endpoint name, e.g. `POST /pets`
    pub endpoint: String,
    pub case: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<DeficiencyKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
    pub expectation: Expectation,
    /// Response status, absent when no response arrived
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Requests sent for this case, retries included
    pub attempts: u32,
    pub passed: bool,
    /// Validation errors found in a successful response body
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorRecord>,
    /// Why the case failed, when it did
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

/// Pass and fail counts of one endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointTally {
    pub passed: usize,
    pub failed: usize,
}

/// Aggregated result of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub endpoints: BTreeMap<String, EndpointTally>,
    pub passed: usize,
    pub failed: usize,
    pub outcomes: Vec<CaseOutcome>,
}

impl RunSummary {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            finished_at: started_at,
            endpoints: BTreeMap::new(),
            passed: 0,
            failed: 0,
            outcomes: Vec::new(),
        }
    }

    fn record(&mut self, outcome: CaseOutcome) {
        let tally = self.endpoints.entry(outcome.endpoint.clone()).or_default();
        if outcome.passed {
            tally.passed += 1;
            self.passed += 1;
        } else {
            tally.failed += 1;
            self.failed += 1;
        }
        self.outcomes.push(outcome);
    }

    /// Total cases executed
    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    /// Whether every case passed
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Outcomes of failed cases
    pub fn failures(&self) -> impl Iterator<Item = &CaseOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }
}

/// Sends suites to a live API and checks the answers
#[derive(Debug, Clone)]
pub struct Runner {
    client: reqwest::Client,
    config: Arc<RunnerConfig>,
    base_url: Arc<str>,
}

impl Runner {
    /// Create a runner sending requests to `base_url`
    pub fn new(config: RunnerConfig, base_url: &str) -> Result<Self> {
        config.validate()?;
        url::Url::parse(base_url)
            .map_err(|e| AppError::config_error(format!("invalid base URL '{}': {}", base_url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            config: Arc::new(config),
            base_url: Arc::from(base_url.trim_end_matches('/')),
        })
    }

    /// The configuration in effect
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Execute every suite and aggregate the outcomes
    pub async fn run(&self, suites: Vec<EndpointSuite>) -> Result<RunSummary> {
        let mut summary = RunSummary::new(Utc::now());
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let (tx, mut rx) = mpsc::channel(OUTCOME_CHANNEL_CAPACITY);

        tracing::info!(
            run_id = %summary.run_id,
            endpoints = suites.len(),
            concurrency = self.config.concurrency,
            "Starting adherence run"
        );

        let mut handles = Vec::with_capacity(suites.len());
        for suite in suites {
            let runner = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let tx = tx.clone();
            handles.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| AppError::InternalError(format!("worker pool closed: {}", e)))?;
                runner.run_endpoint(suite, tx).await;
                Ok::<(), AppError>(())
            }));
        }
        drop(tx);

        while let Some(outcome) = rx.recv().await {
            summary.record(outcome);
        }
        for handle in handles {
            handle
                .await
                .map_err(|e| AppError::InternalError(format!("endpoint worker failed: {}", e)))??;
        }

        summary.finished_at = Utc::now();
        tracing::info!(
            run_id = %summary.run_id,
            passed = summary.passed,
            failed = summary.failed,
            "Adherence run finished"
        );
        Ok(summary)
    }

    async fn run_endpoint(&self, suite: EndpointSuite, tx: mpsc::Sender<CaseOutcome>) {
        let endpoint = suite.endpoint;
        for case in suite.cases {
            let outcome = self.run_case(&endpoint, case).await;
            if tx.send(outcome).await.is_err() {
                tracing::warn!(endpoint = %endpoint.name(), "Outcome receiver dropped; stopping endpoint");
                return;
            }
        }
    }

    /// Send one case and judge the answer
    pub async fn run_case(&self, endpoint: &Endpoint, case: TestCase) -> CaseOutcome {
        let mut outcome = CaseOutcome {
            endpoint: endpoint.name(),
            case: case.name.clone(),
            category: case.category,
            target: case.target,
            expectation: case.expectation,
            status: None,
            attempts: 0,
            passed: false,
            errors: Vec::new(),
            failure: None,
        };

        let response = match self.send_with_retry(&case, &mut outcome.attempts).await {
            Ok(response) => response,
            Err(e) => {
                outcome.failure = Some(format!("request failed: {}", e));
                return outcome;
            }
        };

        let status = response.status().as_u16();
        outcome.status = Some(status);

        if (200..300).contains(&status) && case.method != HttpMethod::Head {
            if let Some(schema) = endpoint.response_schema(status) {
                match response.bytes().await {
                    Ok(bytes) => {
                        let body: Option<serde_json::Value> = if bytes.is_empty() {
                            None
                        } else {
                            match serde_json::from_slice(&bytes) {
                                Ok(value) => Some(value),
                                Err(e) => {
                                    outcome.failure =
                                        Some(format!("response body is not JSON: {}", e));
                                    return outcome;
                                }
                            }
                        };
                        outcome.errors =
                            self.validator().validate(body.as_ref(), Some(schema), &JsonPath::root());
                    }
                    Err(e) => {
                        outcome.failure = Some(format!("failed to read response body: {}", e));
                        return outcome;
                    }
                }
            }
        }

        if !case.expectation.is_met_by(status) {
            outcome.failure = Some(format!("expected {}, got {}", case.expectation, status));
        } else if !outcome.errors.is_empty() {
            outcome.failure = Some(format!(
                "response body has {} validation error(s)",
                outcome.errors.len()
            ));
        }
        outcome.passed = outcome.failure.is_none();

        tracing::debug!(
            endpoint = %outcome.endpoint,
            case = %outcome.case,
            status = status,
            passed = outcome.passed,
            "Case finished"
        );
        outcome
    }

    /// Send a case, retrying only when the request times out
    async fn send_with_retry(
        &self,
        case: &TestCase,
        attempts: &mut u32,
    ) -> std::result::Result<reqwest::Response, reqwest::Error> {
        let mut backoff_ms = self.config.retry_backoff_ms;

        loop {
            if *attempts > 0 {
                tracing::debug!(
                    attempt = *attempts + 1,
                    backoff_ms = backoff_ms,
                    case = %case.name,
                    "Retrying timed out request"
                );
                sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms = backoff_ms.saturating_mul(2);
            }
            *attempts += 1;

            match self.request(case).send().await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_timeout() && *attempts < self.config.max_retries => {
                    tracing::warn!(
                        attempt = *attempts,
                        error = %e,
                        case = %case.name,
                        "Request timed out"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn request(&self, case: &TestCase) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, case.path);
        let mut request = self
            .client
            .request(case.method.into(), url)
            .query(&case.query);
        for (name, value) in case.header_pairs() {
            request = request.header(name, value);
        }
        if let Some(body) = &case.body {
            request = request.json(body);
        }
        request
    }

    fn validator(&self) -> Validator {
        Validator::new(ValidationOptions::new().with_strict_validation(self.config.strict_validation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(endpoint: &str, passed: bool) -> CaseOutcome {
        CaseOutcome {
            endpoint: endpoint.to_string(),
            case: "conformant".to_string(),
            category: None,
            target: None,
            expectation: Expectation::Success,
            status: Some(200),
            attempts: 1,
            passed,
            errors: Vec::new(),
            failure: None,
        }
    }

    #[test]
    fn test_summary_tallies() {
        let mut summary = RunSummary::new(Utc::now());
        summary.record(outcome("GET /pets", true));
        summary.record(outcome("GET /pets", false));
        summary.record(outcome("POST /pets", true));

        assert_eq!(summary.total(), 3);
        assert_eq!(summary.passed, 2);
        assert!(!summary.is_success());
        assert_eq!(summary.endpoints["GET /pets"], EndpointTally { passed: 1, failed: 1 });
        assert_eq!(summary.endpoints["POST /pets"].failed, 0);
        assert_eq!(summary.failures().count(), 1);
    }

    #[test]
    fn test_runner_rejects_bad_settings() {
        assert!(Runner::new(RunnerConfig::default(), "not a url").is_err());
        assert!(Runner::new(RunnerConfig::default().with_concurrency(0), "http://localhost").is_err());
        assert!(Runner::new(RunnerConfig::default(), "http://localhost:8080/").is_ok());
    }
}
