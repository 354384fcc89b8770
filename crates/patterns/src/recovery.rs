//! Recovery — retry with backoff, fall back, apologize gracefully.
//!
//! A flaky primary service is simulated with a seeded RNG so runs are
//! reproducible. Strategies layered over it: bounded retry with exponential
//! backoff, a fallback service, and when both paths fail, an LLM-written
//! user-facing apology.

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

/// A service that fails a configurable fraction of the time.
pub struct FlakyService {
    name: String,
    success_rate: f64,
    rng: Mutex<StdRng>,
}

impl FlakyService {
    pub fn new(name: impl Into<String>, success_rate: f64, seed: u64) -> Self {
        Self {
            name: name.into(),
            success_rate: success_rate.clamp(0.0, 1.0),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Attempt a fetch. Fails randomly per the configured rate.
    pub fn get_data(&self, query: &str) -> std::result::Result<String, String> {
        let roll: f64 = self.rng.lock().unwrap().gen();
        if roll > self.success_rate {
            Err(format!("{} failed for query: {query}", self.name))
        } else {
            Ok(format!("{} result for: {query}", self.name))
        }
    }
}

/// What happened across one recovery attempt.
#[derive(Debug, Clone)]
pub struct RecoveryOutcome {
    pub query: String,
    /// Attempt-by-attempt log lines.
    pub attempts: Vec<String>,
    /// The data finally produced, or the apology text.
    pub result: String,
    pub recovered_via_fallback: bool,
    pub succeeded: bool,
}

/// Retry/backoff/fallback orchestrator.
pub struct RecoveryHandler {
    llm: LlmClient,
    max_retries: usize,
    backoff_base: Duration,
}

impl RecoveryHandler {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            max_retries: 3,
            backoff_base: Duration::from_millis(500),
        }
    }

    /// Set the retry cap.
    pub fn with_max_retries(mut self, max: usize) -> Self {
        self.max_retries = max.max(1);
        self
    }

    /// Set the base backoff delay (doubles per attempt).
    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    /// Retry the primary service with exponential backoff.
    pub async fn with_retry(
        &self,
        service: &FlakyService,
        query: &str,
    ) -> (std::result::Result<String, String>, Vec<String>) {
        let mut log = Vec::new();
        let mut last_err = String::new();

        for attempt in 0..self.max_retries {
            match service.get_data(query) {
                Ok(data) => {
                    if attempt > 0 {
                        log.push(format!("success on attempt {}", attempt + 1));
                    }
                    return (Ok(data), log);
                }
                Err(e) => {
                    warn!(attempt = attempt + 1, error = %e, "attempt failed");
                    log.push(format!("attempt {} failed: {e}", attempt + 1));
                    last_err = e;
                    if attempt + 1 < self.max_retries {
                        let wait = self.backoff_base * 2u32.pow(attempt as u32);
                        log.push(format!("waiting {}ms before retry", wait.as_millis()));
                        tokio::time::sleep(wait).await;
                    }
                }
            }
        }
        (Err(last_err), log)
    }

    /// Retry the primary, then try the fallback, then apologize via LLM.
    pub async fn with_fallback(
        &self,
        primary: &FlakyService,
        fallback: &FlakyService,
        query: &str,
    ) -> Result<RecoveryOutcome> {
        let (primary_result, mut attempts) = self.with_retry(primary, query).await;

        let primary_err = match primary_result {
            Ok(data) => {
                return Ok(RecoveryOutcome {
                    query: query.to_string(),
                    attempts,
                    result: data,
                    recovered_via_fallback: false,
                    succeeded: true,
                });
            }
            Err(e) => e,
        };

        debug!("primary exhausted, trying fallback");
        attempts.push("primary exhausted, trying fallback".into());

        match fallback.get_data(query) {
            Ok(data) => {
                attempts.push("fallback succeeded".into());
                Ok(RecoveryOutcome {
                    query: query.to_string(),
                    attempts,
                    result: data,
                    recovered_via_fallback: true,
                    succeeded: true,
                })
            }
            Err(fallback_err) => {
                attempts.push(format!("fallback failed: {fallback_err}"));
                let prompt = format!(
                    "Primary service failed with: {primary_err}\n\
                     Fallback service failed with: {fallback_err}\n\n\
                     Write a short, friendly error message for the user that \
                     acknowledges the issue, explains it simply, and suggests \
                     what they can try instead."
                );
                let apology = self.llm.generate(&prompt).await?;
                Ok(RecoveryOutcome {
                    query: query.to_string(),
                    attempts,
                    result: apology,
                    recovered_via_fallback: false,
                    succeeded: false,
                })
            }
        }
    }
}

/// Demo: four queries against a 70%-reliable primary with a solid fallback.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let primary = FlakyService::new("primary", 0.7, 7);
    let fallback = FlakyService::new("fallback", 1.0, 11);
    let handler = RecoveryHandler::new(llm.clone())
        .with_max_retries(3)
        .with_backoff_base(Duration::from_millis(10));

    let queries = [
        "Get weather information",
        "Fetch user profile data",
        "Retrieve product information",
        "Load configuration settings",
    ];

    let mut report = DemoReport::new("recovery");
    for query in queries {
        let outcome = handler.with_fallback(&primary, &fallback, query).await?;
        let mut body = outcome.attempts.join("\n");
        if body.is_empty() {
            body = "succeeded on first attempt".into();
        }
        body.push_str(&format!("\nResult: {}", outcome.result));
        report.push(format!("Query: {query}"), body);
    }
    Ok(report)
}
