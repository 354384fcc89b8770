//! Planning — plan first, execute each step, synthesize the results.
//!
//! A plan prompt yields `Step N: ...` lines; each step is executed with the
//! task as context; a synthesis prompt merges the per-step results into the
//! final output.

use crate::report::DemoReport;
use agentry_core::error::PatternError;
use agentry_core::{LlmClient, Result};
use tracing::{debug, info};

/// One executed plan step.
#[derive(Debug, Clone)]
pub struct ExecutedStep {
    pub description: String,
    pub result: String,
}

/// Result of a plan-then-execute run.
#[derive(Debug, Clone)]
pub struct PlanResult {
    pub plan_text: String,
    pub steps: Vec<ExecutedStep>,
    pub final_output: String,
}

/// Extract `Step N: ...` lines from a plan.
pub fn parse_steps(plan_text: &str) -> Vec<String> {
    plan_text
        .lines()
        .map(str::trim)
        .filter(|line| {
            let lower = line.to_lowercase();
            lower.starts_with("step") && line.contains(':')
        })
        .map(String::from)
        .collect()
}

/// The planner.
pub struct Planner {
    llm: LlmClient,
}

impl Planner {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    /// Ask for a 3-5 step plan.
    pub async fn plan(&self, task: &str) -> Result<String> {
        let prompt = format!(
            "Create a detailed plan for this task: {task}\n\n\
             Break it down into 3-5 clear, actionable steps.\n\
             Format your response as:\n\
             Step 1: [Description]\n\
             Step 2: [Description]\n\
             etc."
        );
        Ok(self.llm.generate(&prompt).await?)
    }

    /// Execute one step with the task as context.
    pub async fn execute_step(&self, task: &str, step: &str) -> Result<String> {
        let prompt = format!(
            "Task context: {task}\n\n\
             Execute this step: {step}\n\n\
             Provide a clear, actionable result for this step."
        );
        Ok(self.llm.generate(&prompt).await?)
    }

    /// Plan, execute, synthesize.
    pub async fn run(&self, task: &str) -> Result<PlanResult> {
        let plan_text = self.plan(task).await?;
        let step_lines = parse_steps(&plan_text);

        if step_lines.is_empty() {
            return Err(PatternError::MalformedOutput {
                context: "plan".into(),
                detail: "no 'Step N:' lines found in plan".into(),
            }
            .into());
        }
        info!(steps = step_lines.len(), "plan parsed");

        let mut steps = Vec::with_capacity(step_lines.len());
        for step in &step_lines {
            debug!(step = %step, "executing step");
            let result = self.execute_step(task, step).await?;
            steps.push(ExecutedStep {
                description: step.clone(),
                result,
            });
        }

        let results_text = steps
            .iter()
            .enumerate()
            .map(|(i, s)| format!("Step {}: {}", i + 1, s.result))
            .collect::<Vec<_>>()
            .join("\n");

        let synthesis_prompt = format!(
            "Original task: {task}\n\nPlan:\n{plan_text}\n\nStep results:\n{results_text}\n\n\
             Combine all the step results into a comprehensive final output \
             that addresses the original task."
        );
        let final_output = self.llm.generate(&synthesis_prompt).await?;

        Ok(PlanResult {
            plan_text,
            steps,
            final_output,
        })
    }
}

/// Demo: plan and write a beginner's guide.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let task = "Write a comprehensive guide on how to learn Rust for beginners";

    let planner = Planner::new(llm.clone());
    let result = planner.run(task).await?;

    let mut report = DemoReport::new("planning");
    report.push("Task", task);
    report.push("Plan", &result.plan_text);
    for (i, step) in result.steps.iter().enumerate() {
        report.push(
            format!("Executing step {}", i + 1),
            format!("{}\n→ {}", step.description, step.result),
        );
    }
    report.push("Final output", &result.final_output);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::scripted;

    #[test]
    fn parses_step_lines() {
        let plan = "Intro text\nStep 1: Learn syntax\nStep 2: Build a project\nOutro";
        let steps = parse_steps(plan);
        assert_eq!(steps.len(), 2);
        assert!(steps[0].contains("Learn syntax"));
    }

    #[test]
    fn ignores_non_step_lines() {
        assert!(parse_steps("Just some prose without structure").is_empty());
        // "Step" without a colon doesn't count
        assert!(parse_steps("Step one is to begin").is_empty());
    }

    #[tokio::test]
    async fn plan_execute_synthesize() {
        let llm = scripted(&[
            "Step 1: Research\nStep 2: Write",
            "research done",
            "writing done",
            "final combined guide",
        ]);
        let result = Planner::new(llm).run("write a guide").await.unwrap();
        assert_eq!(result.steps.len(), 2);
        assert_eq!(result.steps[0].result, "research done");
        assert_eq!(result.final_output, "final combined guide");
    }

    #[tokio::test]
    async fn unparseable_plan_is_an_error() {
        let llm = scripted(&["I cannot plan this."]);
        let err = Planner::new(llm).run("task").await.unwrap_err();
        assert!(err.to_string().contains("could not be parsed"));
    }
}
