//! Plan executor — parse a structured plan, run it, adapt on failure.
//!
//! Plans use `step <id>: <description> [depends: a,b]` lines. Validation
//! checks dependency references before anything runs; execution walks the
//! steps in listed order, skipping steps whose dependencies failed. After a
//! failed run the plan is handed back to the model for adaptation.

use crate::report::DemoReport;
use agentry_core::error::PatternError;
use agentry_core::{LlmClient, Result};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// One parsed plan step.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanStep {
    pub id: String,
    pub description: String,
    pub dependencies: Vec<String>,
}

/// Status of a step after execution.
#[derive(Debug, Clone, PartialEq)]
pub enum StepStatus {
    Completed(String),
    Failed(String),
    Skipped(String),
}

/// Result of executing a plan.
#[derive(Debug, Clone)]
pub struct PlanRun {
    pub statuses: BTreeMap<String, StepStatus>,
    pub succeeded: bool,
}

/// Parse `step <id>: <description> [depends: a,b]` lines.
pub fn parse_plan(text: &str) -> Vec<PlanStep> {
    let mut steps = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        let lower = trimmed.to_lowercase();
        if !lower.starts_with("step ") {
            continue;
        }
        let Some(colon) = trimmed.find(':') else {
            continue;
        };
        let id = trimmed[5..colon].trim().to_string();
        if id.is_empty() {
            continue;
        }
        let rest = trimmed[colon + 1..].trim();

        let (description, dependencies) = match rest.rfind("[depends:") {
            Some(open) if rest.ends_with(']') => {
                let deps = rest[open + 9..rest.len() - 1]
                    .split(',')
                    .map(|d| d.trim().to_string())
                    .filter(|d| !d.is_empty())
                    .collect();
                (rest[..open].trim().to_string(), deps)
            }
            _ => (rest.to_string(), Vec::new()),
        };

        steps.push(PlanStep {
            id,
            description,
            dependencies,
        });
    }
    steps
}

/// Check dependency references and id uniqueness.
pub fn validate_plan(steps: &[PlanStep]) -> std::result::Result<(), String> {
    let ids: Vec<&str> = steps.iter().map(|s| s.id.as_str()).collect();
    let mut deduped = ids.clone();
    deduped.sort();
    deduped.dedup();
    if deduped.len() != ids.len() {
        return Err("duplicate step ids".into());
    }
    for step in steps {
        for dep in &step.dependencies {
            if !ids.contains(&dep.as_str()) {
                return Err(format!("step '{}' depends on unknown step '{dep}'", step.id));
            }
        }
    }
    Ok(())
}

/// The plan executor.
pub struct PlanExecutor {
    llm: LlmClient,
}

impl PlanExecutor {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    /// Ask the model for a plan in the expected line format.
    pub async fn draft_plan(&self, goal: &str) -> Result<String> {
        Ok(self
            .llm
            .generate(&format!(
                "Write an execution plan for this goal: {goal}\n\n\
                 Use one line per step, in this exact format:\n\
                 step <id>: <description> [depends: <id>,<id>]\n\
                 Omit the depends clause for independent steps. Use short ids \
                 like s1, s2."
            ))
            .await?)
    }

    /// Execute each step; a step whose execution output starts with
    /// `FAILED` is treated as failed and its dependents are skipped.
    pub async fn execute(&self, steps: &[PlanStep], goal: &str) -> Result<PlanRun> {
        validate_plan(steps)
            .map_err(|e| -> agentry_core::Error { PatternError::InvalidWorkflow(e).into() })?;

        let mut statuses: BTreeMap<String, StepStatus> = BTreeMap::new();
        let mut context = String::new();

        for step in steps {
            if let Some(unmet) = step.dependencies.iter().find(|dep| {
                !matches!(statuses.get(dep.as_str()), Some(StepStatus::Completed(_)))
            }) {
                warn!(step = %step.id, dep = %unmet, "skipping step");
                statuses.insert(
                    step.id.clone(),
                    StepStatus::Skipped(format!("dependency '{unmet}' unmet")),
                );
                continue;
            }

            debug!(step = %step.id, "executing");
            let output = self
                .llm
                .generate(&format!(
                    "Goal: {goal}\nProgress so far:\n{context}\n\n\
                     Execute this step and report the result: {}\n\
                     If the step cannot be completed, start your reply with FAILED.",
                    step.description
                ))
                .await?;

            if output.trim_start().starts_with("FAILED") {
                statuses.insert(step.id.clone(), StepStatus::Failed(output));
            } else {
                context.push_str(&format!("{}: {}\n", step.id, output));
                statuses.insert(step.id.clone(), StepStatus::Completed(output));
            }
        }

        let succeeded = statuses
            .values()
            .all(|s| matches!(s, StepStatus::Completed(_)));
        Ok(PlanRun {
            statuses,
            succeeded,
        })
    }

    /// Ask the model to adapt a plan after failures.
    pub async fn adapt(&self, original_plan: &str, run: &PlanRun) -> Result<String> {
        let failures = run
            .statuses
            .iter()
            .filter_map(|(id, status)| match status {
                StepStatus::Failed(reason) => Some(format!("{id}: {reason}")),
                StepStatus::Skipped(reason) => Some(format!("{id}: skipped ({reason})")),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        Ok(self
            .llm
            .generate(&format!(
                "This plan partially failed.\n\nPlan:\n{original_plan}\n\n\
                 Failures:\n{failures}\n\n\
                 Rewrite the plan (same line format) to work around the failures."
            ))
            .await?)
    }
}

/// Demo: draft, execute, and adapt after an injected failure.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let executor = PlanExecutor::new(llm.clone());
    let goal = "Ship the v2.0 release of the CLI";

    let plan_text = executor.draft_plan(goal).await?;
    let steps = parse_plan(&plan_text);
    if steps.is_empty() {
        return Err(PatternError::MalformedOutput {
            context: "plan draft".into(),
            detail: "no parseable step lines".into(),
        }
        .into());
    }

    let run = executor.execute(&steps, goal).await?;

    let mut report = DemoReport::new("plan-executor");
    report.push("Goal", goal);
    report.push("Plan", &plan_text);
    for (id, status) in &run.statuses {
        let line = match status {
            StepStatus::Completed(out) => format!("completed — {out}"),
            StepStatus::Failed(out) => format!("FAILED — {out}"),
            StepStatus::Skipped(reason) => format!("skipped — {reason}"),
        };
        report.push(format!("Step {id}"), line);
    }

    if !run.succeeded {
        let adapted = executor.adapt(&plan_text, &run).await?;
        report.push("Adapted plan", adapted);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::scripted;

    #[test]
    fn plan_lines_parse_with_deps() {
        let steps = parse_plan(
            "step s1: build the artifact\n\
             step s2: run the tests [depends: s1]\n\
             noise line\n\
             step s3: publish [depends: s1,s2]",
        );
        assert_eq!(steps.len(), 3);
        assert!(steps[0].dependencies.is_empty());
        assert_eq!(steps[2].dependencies, vec!["s1", "s2"]);
    }

    #[test]
    fn validation_catches_unknown_deps_and_dupes() {
        let steps = parse_plan("step s1: a [depends: ghost]");
        assert!(validate_plan(&steps).is_err());

        let dupes = parse_plan("step s1: a\nstep s1: b");
        assert!(validate_plan(&dupes).is_err());
    }

    #[tokio::test]
    async fn all_steps_complete() {
        let llm = scripted(&["artifact built", "tests green"]);
        let executor = PlanExecutor::new(llm);
        let steps = parse_plan("step s1: build\nstep s2: test [depends: s1]");
        let run = executor.execute(&steps, "ship").await.unwrap();
        assert!(run.succeeded);
        assert!(matches!(run.statuses["s2"], StepStatus::Completed(_)));
    }

    #[tokio::test]
    async fn failure_skips_dependents() {
        let llm = scripted(&["FAILED: compiler error"]);
        let executor = PlanExecutor::new(llm);
        let steps = parse_plan("step s1: build\nstep s2: test [depends: s1]");
        let run = executor.execute(&steps, "ship").await.unwrap();
        assert!(!run.succeeded);
        assert!(matches!(run.statuses["s1"], StepStatus::Failed(_)));
        assert!(matches!(run.statuses["s2"], StepStatus::Skipped(_)));
    }

    #[tokio::test]
    async fn adapt_reports_failures() {
        let llm = scripted(&[
            "FAILED: no disk space",
            "step s1: free disk space\nstep s2: build [depends: s1]",
        ]);
        let executor = PlanExecutor::new(llm);
        let steps = parse_plan("step s1: build");
        let run = executor.execute(&steps, "goal").await.unwrap();
        let adapted = executor.adapt("step s1: build", &run).await.unwrap();
        assert!(adapted.contains("free disk space"));
    }
}
