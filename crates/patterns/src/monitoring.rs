//! Monitoring — latency and error metrics with threshold alerts.
//!
//! A metrics recorder wraps the LLM call path: per-call latency, success and
//! error counts, rolling averages, and alerts when the average latency or
//! error rate crosses its threshold. The health summary folds the alert
//! state into a single status.

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use std::time::Instant;
use tracing::warn;

/// Alert kinds the monitor can raise.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    SlowResponses { avg_ms: f64, threshold_ms: f64 },
    HighErrorRate { rate: f64, threshold: f64 },
}

impl std::fmt::Display for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Alert::SlowResponses { avg_ms, threshold_ms } => {
                write!(f, "slow responses: avg {avg_ms:.0}ms > {threshold_ms:.0}ms")
            }
            Alert::HighErrorRate { rate, threshold } => {
                write!(f, "high error rate: {:.0}% > {:.0}%", rate * 100.0, threshold * 100.0)
            }
        }
    }
}

/// Overall health derived from the alert state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Healthy,
    Degraded,
    Unhealthy,
}

/// The metrics recorder.
#[derive(Debug)]
pub struct Metrics {
    latencies_ms: Vec<f64>,
    successes: usize,
    errors: usize,
    latency_threshold_ms: f64,
    error_rate_threshold: f64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            latencies_ms: Vec::new(),
            successes: 0,
            errors: 0,
            latency_threshold_ms: 5_000.0,
            error_rate_threshold: 0.25,
        }
    }

    /// Override the alert thresholds.
    pub fn with_thresholds(mut self, latency_ms: f64, error_rate: f64) -> Self {
        self.latency_threshold_ms = latency_ms;
        self.error_rate_threshold = error_rate.clamp(0.0, 1.0);
        self
    }

    /// Record one call.
    pub fn record(&mut self, latency_ms: f64, success: bool) {
        self.latencies_ms.push(latency_ms);
        if success {
            self.successes += 1;
        } else {
            self.errors += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.successes + self.errors
    }

    pub fn avg_latency_ms(&self) -> f64 {
        if self.latencies_ms.is_empty() {
            return 0.0;
        }
        self.latencies_ms.iter().sum::<f64>() / self.latencies_ms.len() as f64
    }

    pub fn error_rate(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        self.errors as f64 / self.total() as f64
    }

    /// Active alerts given the current numbers.
    pub fn check_alerts(&self) -> Vec<Alert> {
        let mut alerts = Vec::new();
        if self.total() >= 3 {
            let avg = self.avg_latency_ms();
            if avg > self.latency_threshold_ms {
                alerts.push(Alert::SlowResponses {
                    avg_ms: avg,
                    threshold_ms: self.latency_threshold_ms,
                });
            }
            let rate = self.error_rate();
            if rate > self.error_rate_threshold {
                alerts.push(Alert::HighErrorRate {
                    rate,
                    threshold: self.error_rate_threshold,
                });
            }
        }
        alerts
    }

    /// Health status derived from alerts.
    pub fn health(&self) -> Health {
        let alerts = self.check_alerts();
        match alerts.len() {
            0 => Health::Healthy,
            1 => Health::Degraded,
            _ => Health::Unhealthy,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// An LLM wrapper that records metrics for every query.
pub struct MonitoredAgent {
    llm: LlmClient,
    metrics: Metrics,
}

impl MonitoredAgent {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            metrics: Metrics::new(),
        }
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Run a query, recording latency and outcome. Provider errors are
    /// recorded and surfaced as the error text rather than aborting the
    /// monitoring session.
    pub async fn query(&mut self, prompt: &str) -> String {
        let start = Instant::now();
        match self.llm.generate(prompt).await {
            Ok(response) => {
                self.metrics.record(start.elapsed().as_secs_f64() * 1000.0, true);
                response
            }
            Err(e) => {
                warn!(error = %e, "monitored call failed");
                self.metrics.record(start.elapsed().as_secs_f64() * 1000.0, false);
                format!("[error] {e}")
            }
        }
    }
}

/// Demo: a few monitored queries, then the performance report.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let mut agent = MonitoredAgent::new(llm.clone());

    let queries = [
        "What is Rust's ownership model?",
        "Name three sorting algorithms.",
        "What does HTTP 429 mean?",
    ];

    let mut report = DemoReport::new("monitoring");
    for query in queries {
        let response = agent.query(query).await;
        report.push(format!("Query: {query}"), response);
    }

    let metrics = agent.metrics();
    let alerts = metrics.check_alerts();
    let alert_text = if alerts.is_empty() {
        "(none)".to_string()
    } else {
        alerts
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    };
    report.push(
        "Performance report",
        format!(
            "calls: {}  errors: {}  avg latency: {:.0}ms  error rate: {:.0}%\n\
             alerts: {alert_text}\nhealth: {:?}",
            metrics.total(),
            metrics.total() - metrics.successes,
            metrics.avg_latency_ms(),
            metrics.error_rate() * 100.0,
            metrics.health()
        ),
    );
    Ok(report)
}
