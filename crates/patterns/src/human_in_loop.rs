//! Human-in-the-loop — confidence-gated escalation to a review queue.
//!
//! The agent answers and self-reports a confidence score. Answers below the
//! threshold land in a review queue, where a (simulated) human approves or
//! revises them. Review statistics are tracked across the session.

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use tracing::{debug, info};

/// How a request was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Confidence met the bar; answer went straight out.
    AutoApproved,
    /// Escalated and the reviewer accepted the AI answer.
    HumanApproved,
    /// Escalated and the reviewer replaced the answer.
    HumanRevised,
}

/// One processed request.
#[derive(Debug, Clone)]
pub struct ReviewedRequest {
    pub request: String,
    pub ai_response: String,
    pub confidence: f32,
    pub resolution: Resolution,
    pub final_response: String,
}

/// Running statistics.
#[derive(Debug, Clone, Default)]
pub struct ReviewStats {
    pub total: usize,
    pub auto_approved: usize,
    pub escalated: usize,
    pub revised: usize,
}

/// The simulated human reviewer: approves unless the AI flagged uncertainty.
pub trait Reviewer: Send + Sync {
    fn review(&self, request: &str, ai_response: &str) -> (bool, Option<String>);
}

/// Default reviewer used by the demo: revises responses that hedge.
pub struct HedgeReviewer;

impl Reviewer for HedgeReviewer {
    fn review(&self, request: &str, ai_response: &str) -> (bool, Option<String>) {
        let hedging = ["i'm not sure", "i am not sure", "unclear", "cannot determine"];
        let lower = ai_response.to_lowercase();
        if hedging.iter().any(|h| lower.contains(h)) {
            (
                false,
                Some(format!(
                    "Reviewed response for '{request}': please consult the documentation \
                     or rephrase your question."
                )),
            )
        } else {
            (true, None)
        }
    }
}

/// The gated pipeline.
pub struct HumanInLoop<R: Reviewer> {
    llm: LlmClient,
    reviewer: R,
    confidence_threshold: f32,
    stats: ReviewStats,
}

impl<R: Reviewer> HumanInLoop<R> {
    pub fn new(llm: LlmClient, reviewer: R) -> Self {
        Self {
            llm,
            reviewer,
            confidence_threshold: 0.7,
            stats: ReviewStats::default(),
        }
    }

    /// Set the escalation threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn stats(&self) -> &ReviewStats {
        &self.stats
    }

    /// Ask the model to answer and self-report confidence.
    async fn answer_with_confidence(&self, request: &str) -> Result<(String, f32)> {
        let prompt = format!(
            "Answer this request: {request}\n\n\
             End your reply with a line of the form:\n\
             CONFIDENCE: 0.0-1.0"
        );
        let response = self.llm.generate(&prompt).await?;
        let confidence = parse_confidence(&response).unwrap_or(0.5);
        let answer = strip_confidence_line(&response);
        Ok((answer, confidence))
    }

    /// Process one request through the gate.
    pub async fn process(&mut self, request: &str) -> Result<ReviewedRequest> {
        let (ai_response, confidence) = self.answer_with_confidence(request).await?;
        self.stats.total += 1;

        if confidence >= self.confidence_threshold {
            debug!(confidence, "auto-approved");
            self.stats.auto_approved += 1;
            return Ok(ReviewedRequest {
                request: request.to_string(),
                final_response: ai_response.clone(),
                ai_response,
                confidence,
                resolution: Resolution::AutoApproved,
            });
        }

        info!(confidence, threshold = self.confidence_threshold, "escalating to human");
        self.stats.escalated += 1;
        let (approved, replacement) = self.reviewer.review(request, &ai_response);

        if approved {
            Ok(ReviewedRequest {
                request: request.to_string(),
                final_response: ai_response.clone(),
                ai_response,
                confidence,
                resolution: Resolution::HumanApproved,
            })
        } else {
            self.stats.revised += 1;
            let final_response =
                replacement.unwrap_or_else(|| "Escalated for manual follow-up.".into());
            Ok(ReviewedRequest {
                request: request.to_string(),
                ai_response,
                confidence,
                resolution: Resolution::HumanRevised,
                final_response,
            })
        }
    }
}

/// Parse a trailing `CONFIDENCE: x` line.
pub fn parse_confidence(response: &str) -> Option<f32> {
    for line in response.lines().rev() {
        if let Some(rest) = line.trim().strip_prefix("CONFIDENCE:") {
            return rest.trim().parse::<f32>().ok().map(|c| c.clamp(0.0, 1.0));
        }
    }
    None
}

fn strip_confidence_line(response: &str) -> String {
    response
        .lines()
        .filter(|line| !line.trim().starts_with("CONFIDENCE:"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Demo: three requests, one of which escalates.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let mut pipeline = HumanInLoop::new(llm.clone(), HedgeReviewer).with_threshold(0.7);

    let requests = [
        "What's the capital of France?",
        "Should I refactor this legacy module before the release?",
        "Summarize the benefits of unit testing.",
    ];

    let mut report = DemoReport::new("human-in-loop");
    for request in requests {
        let reviewed = pipeline.process(request).await?;
        report.push(
            format!("Request: {request}"),
            format!(
                "Confidence: {:.2}\nResolution: {:?}\nFinal: {}",
                reviewed.confidence, reviewed.resolution, reviewed.final_response
            ),
        );
    }

    let stats = pipeline.stats();
    report.push(
        "Review statistics",
        format!(
            "Total: {}\nAuto-approved: {}\nEscalated: {}\nRevised: {}",
            stats.total, stats.auto_approved, stats.escalated, stats.revised
        ),
    );
    Ok(report)
}
