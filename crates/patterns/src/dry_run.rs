//! Dry-run harness — simulate and review actions before live execution.
//!
//! Proposed actions flow through three gates: a safety checker with
//! category rules, a simulator predicting consequences and success
//! probability, and a reviewer that auto-approves above a threshold,
//! rejects destructive categories outright, and queues everything else for
//! manual review. Only approved actions "execute".

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use tracing::{info, warn};

/// Action categories the harness knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionCategory {
    Database,
    Api,
    File,
    Email,
    Other,
}

/// A proposed action.
#[derive(Debug, Clone)]
pub struct ProposedAction {
    pub description: String,
    pub category: ActionCategory,
    /// True for actions that delete or overwrite state.
    pub destructive: bool,
}

/// The simulator's prediction.
#[derive(Debug, Clone)]
pub struct DryRunPrediction {
    pub predicted_effect: String,
    pub consequences: Vec<String>,
    pub success_probability: f32,
}

/// The reviewer's decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDecision {
    AutoApproved,
    Rejected(String),
    NeedsManualReview,
}

/// Full record for one action through the harness.
#[derive(Debug, Clone)]
pub struct HarnessRecord {
    pub action: ProposedAction,
    pub prediction: Option<DryRunPrediction>,
    pub decision: ReviewDecision,
    pub execution: Option<String>,
}

/// The dry-run harness.
pub struct DryRunHarness {
    llm: LlmClient,
    auto_approve_threshold: f32,
    manual_queue: Vec<ProposedAction>,
}

impl DryRunHarness {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            auto_approve_threshold: 0.8,
            manual_queue: Vec::new(),
        }
    }

    /// Predictions at or above this probability auto-approve.
    pub fn with_auto_approve_threshold(mut self, threshold: f32) -> Self {
        self.auto_approve_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn manual_queue(&self) -> &[ProposedAction] {
        &self.manual_queue
    }

    /// Category-rule safety check; destructive database/file actions are
    /// refused before simulation.
    pub fn safety_check(action: &ProposedAction) -> std::result::Result<(), String> {
        if action.destructive
            && matches!(action.category, ActionCategory::Database | ActionCategory::File)
        {
            return Err(format!(
                "destructive {:?} actions are not allowed through the harness",
                action.category
            ));
        }
        Ok(())
    }

    /// Simulate the action.
    pub async fn simulate(&self, action: &ProposedAction) -> Result<DryRunPrediction> {
        let response = self
            .llm
            .generate(&format!(
                "Dry-run this proposed action without executing it.\n\
                 Action ({:?}): {}\n\n\
                 Reply in exactly this format:\n\
                 EFFECT: <predicted effect>\n\
                 CONSEQUENCES: <one>; <two>\n\
                 SUCCESS: 0.0-1.0",
                action.category, action.description
            ))
            .await?;

        let field = |prefix: &str| -> Option<String> {
            response
                .lines()
                .find_map(|l| l.trim().strip_prefix(prefix))
                .map(|s| s.trim().to_string())
        };

        Ok(DryRunPrediction {
            predicted_effect: field("EFFECT:").unwrap_or_else(|| "unknown".into()),
            consequences: field("CONSEQUENCES:")
                .map(|s| {
                    s.split(';')
                        .map(|c| c.trim().to_string())
                        .filter(|c| !c.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            success_probability: field("SUCCESS:")
                .and_then(|s| s.parse::<f32>().ok())
                .unwrap_or(0.5)
                .clamp(0.0, 1.0),
        })
    }

    /// Run one action through check → simulate → review → maybe execute.
    pub async fn process(&mut self, action: ProposedAction) -> Result<HarnessRecord> {
        if let Err(reason) = Self::safety_check(&action) {
            warn!(%reason, "action rejected by safety check");
            return Ok(HarnessRecord {
                action,
                prediction: None,
                decision: ReviewDecision::Rejected(reason),
                execution: None,
            });
        }

        let prediction = self.simulate(&action).await?;

        let decision = if prediction.success_probability >= self.auto_approve_threshold {
            ReviewDecision::AutoApproved
        } else {
            self.manual_queue.push(action.clone());
            ReviewDecision::NeedsManualReview
        };

        let execution = if decision == ReviewDecision::AutoApproved {
            info!(action = %action.description, "executing approved action");
            let report = self
                .llm
                .generate(&format!(
                    "The action was approved and is now executed (simulated):\n{}\n\
                     Report the result in one sentence.",
                    action.description
                ))
                .await?;
            Some(report)
        } else {
            None
        };

        Ok(HarnessRecord {
            action,
            prediction: Some(prediction),
            decision,
            execution,
        })
    }
}

/// Demo: three actions — approved, queued, and rejected.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let mut harness = DryRunHarness::new(llm.clone()).with_auto_approve_threshold(0.8);

    let actions = [
        ProposedAction {
            description: "Send the weekly metrics digest email to the team".into(),
            category: ActionCategory::Email,
            destructive: false,
        },
        ProposedAction {
            description: "Call the billing API to regenerate last month's invoices".into(),
            category: ActionCategory::Api,
            destructive: false,
        },
        ProposedAction {
            description: "Drop the staging database and recreate it from seed data".into(),
            category: ActionCategory::Database,
            destructive: true,
        },
    ];

    let mut report = DemoReport::new("dry-run");
    for action in actions {
        let description = action.description.clone();
        let record = harness.process(action).await?;
        let mut body = format!("decision: {:?}", record.decision);
        if let Some(prediction) = &record.prediction {
            body.push_str(&format!(
                "\npredicted effect: {}\nconsequences: {}\nsuccess p: {:.2}",
                prediction.predicted_effect,
                prediction.consequences.join("; "),
                prediction.success_probability
            ));
        }
        if let Some(execution) = &record.execution {
            body.push_str(&format!("\nexecuted: {execution}"));
        }
        report.push(format!("Action: {description}"), body);
    }

    report.push(
        "Manual review queue",
        format!("{} action(s) waiting", harness.manual_queue().len()),
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::scripted;

    fn email_action() -> ProposedAction {
        ProposedAction {
            description: "send digest".into(),
            category: ActionCategory::Email,
            destructive: false,
        }
    }

    #[test]
    fn destructive_database_action_refused() {
        let action = ProposedAction {
            description: "drop table".into(),
            category: ActionCategory::Database,
            destructive: true,
        };
        assert!(DryRunHarness::safety_check(&action).is_err());
        // Non-destructive database action is fine
        let read_only = ProposedAction {
            destructive: false,
            ..action
        };
        assert!(DryRunHarness::safety_check(&read_only).is_ok());
    }

    #[tokio::test]
    async fn high_probability_auto_approves_and_executes() {
        let llm = scripted(&[
            "EFFECT: digest sent\nCONSEQUENCES: inboxes get mail\nSUCCESS: 0.95",
            "The digest went out to 14 recipients.",
        ]);
        let mut harness = DryRunHarness::new(llm);
        let record = harness.process(email_action()).await.unwrap();
        assert_eq!(record.decision, ReviewDecision::AutoApproved);
        assert!(record.execution.unwrap().contains("14"));
        assert!(harness.manual_queue().is_empty());
    }

    #[tokio::test]
    async fn low_probability_queues_for_manual_review() {
        let llm = scripted(&["EFFECT: risky\nCONSEQUENCES: may duplicate invoices\nSUCCESS: 0.4"]);
        let mut harness = DryRunHarness::new(llm);
        let record = harness.process(email_action()).await.unwrap();
        assert_eq!(record.decision, ReviewDecision::NeedsManualReview);
        assert!(record.execution.is_none());
        assert_eq!(harness.manual_queue().len(), 1);
    }

    #[tokio::test]
    async fn rejected_action_never_simulates() {
        // No scripted responses: simulating would panic.
        let llm = scripted(&[]);
        let mut harness = DryRunHarness::new(llm);
        let record = harness
            .process(ProposedAction {
                description: "rm -rf data/".into(),
                category: ActionCategory::File,
                destructive: true,
            })
            .await
            .unwrap();
        assert!(matches!(record.decision, ReviewDecision::Rejected(_)));
        assert!(record.prediction.is_none());
    }
}
