//! Reflection — generate, critique, revise until the critic approves.
//!
//! The generator produces a draft, a reviewer critiques it, and the draft is
//! revised with the feedback folded in. The loop stops early when the
//! reviewer emits the approval token, and always within the iteration cap.

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use tracing::{debug, info};

const APPROVAL_TOKEN: &str = "LOOKS_GOOD";

/// One generate/critique round.
#[derive(Debug, Clone)]
pub struct Round {
    pub iteration: usize,
    pub draft: String,
    pub feedback: String,
    pub approved: bool,
}

/// Result of a reflection run.
#[derive(Debug, Clone)]
pub struct ReflectionResult {
    pub rounds: Vec<Round>,
    pub final_output: String,
    /// True if the critic approved before the cap was hit.
    pub approved: bool,
}

/// The reflective generator.
pub struct Reflector {
    llm: LlmClient,
    max_iterations: usize,
}

impl Reflector {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            max_iterations: 3,
        }
    }

    /// Set the iteration cap.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    async fn generate(&self, task: &str) -> Result<String> {
        let prompt = format!(
            "Write a solution for this task:\n{task}\n\n\
             Requirements: handle edge cases, document the approach, keep it clear."
        );
        Ok(self.llm.generate(&prompt).await?)
    }

    async fn critique(&self, task: &str, draft: &str) -> Result<String> {
        let prompt = format!(
            "You are a senior reviewer. Task:\n{task}\n\nCurrent solution:\n{draft}\n\n\
             Point out bugs, unhandled edge cases and unclear parts.\n\
             If the solution needs no changes, respond with exactly \"{APPROVAL_TOKEN}\"."
        );
        Ok(self.llm.generate(&prompt).await?)
    }

    async fn revise(&self, task: &str, draft: &str, feedback: &str) -> Result<String> {
        let prompt = format!(
            "Original task:\n{task}\n\nCurrent solution:\n{draft}\n\n\
             Review feedback:\n{feedback}\n\n\
             Improve the solution based on the feedback. Keep the same interface."
        );
        Ok(self.llm.generate(&prompt).await?)
    }

    /// Run the generate → critique → revise loop.
    pub async fn run(&self, task: &str) -> Result<ReflectionResult> {
        let mut rounds = Vec::new();
        let mut draft = self.generate(task).await?;

        for iteration in 1..=self.max_iterations {
            let feedback = self.critique(task, &draft).await?;
            let approved = feedback.contains(APPROVAL_TOKEN);
            debug!(iteration, approved, "reflection round");

            rounds.push(Round {
                iteration,
                draft: draft.clone(),
                feedback: feedback.clone(),
                approved,
            });

            if approved {
                info!(iteration, "critic approved");
                return Ok(ReflectionResult {
                    rounds,
                    final_output: draft,
                    approved: true,
                });
            }

            if iteration < self.max_iterations {
                draft = self.revise(task, &draft, &feedback).await?;
            }
        }

        info!(iterations = self.max_iterations, "iteration cap reached");
        Ok(ReflectionResult {
            rounds,
            final_output: draft,
            approved: false,
        })
    }
}

/// Demo: iteratively improve a factorial function.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let task = "Write a function `factorial(n)` that returns n!, treats 0! as 1, \
                and rejects negative input with an error.";

    let reflector = Reflector::new(llm.clone());
    let result = reflector.run(task).await?;

    let mut report = DemoReport::new("reflection");
    report.push("Task", task);
    for round in &result.rounds {
        report.push(
            format!("Iteration {}", round.iteration),
            format!("Draft:\n{}\n\nFeedback:\n{}", round.draft, round.feedback),
        );
    }
    report.push(
        if result.approved {
            "Final (approved)"
        } else {
            "Final (cap reached)"
        },
        &result.final_output,
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::scripted;

    #[tokio::test]
    async fn stops_when_approved() {
        let llm = scripted(&["draft v1", "LOOKS_GOOD"]);
        let result = Reflector::new(llm).run("task").await.unwrap();
        assert!(result.approved);
        assert_eq!(result.rounds.len(), 1);
        assert_eq!(result.final_output, "draft v1");
    }

    #[tokio::test]
    async fn revises_until_approved() {
        let llm = scripted(&[
            "draft v1",
            "missing edge case",
            "draft v2",
            "LOOKS_GOOD",
        ]);
        let result = Reflector::new(llm).run("task").await.unwrap();
        assert!(result.approved);
        assert_eq!(result.rounds.len(), 2);
        assert_eq!(result.final_output, "draft v2");
        assert!(!result.rounds[0].approved);
    }

    #[tokio::test]
    async fn cap_bounds_the_loop() {
        // Critic never approves: generate + (critique, revise) x2 + final critique
        let llm = scripted(&[
            "draft v1",
            "bad",
            "draft v2",
            "still bad",
            "draft v3",
            "nope",
        ]);
        let result = Reflector::new(llm)
            .with_max_iterations(3)
            .run("task")
            .await
            .unwrap();
        assert!(!result.approved);
        assert_eq!(result.rounds.len(), 3);
        assert_eq!(result.final_output, "draft v3");
    }

    #[tokio::test]
    async fn demo_renders_rounds() {
        let llm = scripted(&["fn factorial...", "LOOKS_GOOD"]);
        let report = demo(&llm).await.unwrap();
        assert!(report.render().contains("Iteration 1"));
        assert!(report.render().contains("approved"));
    }
}
