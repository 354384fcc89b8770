//! Plan-Execute-Verify — plan steps, run them, verify each, retry failures.
//!
//! The plan is requested as a JSON array of `{tool, input, goal}` steps.
//! Each executed step is verified by a judge prompt (`PASS`/`FAIL: reason`);
//! failed steps are retried up to the cap, and a step that still fails
//! aborts the run with diagnostics. Verified results feed the synthesis.

use crate::report::DemoReport;
use agentry_core::error::PatternError;
use agentry_core::tool::ToolRegistry;
use agentry_core::{LlmClient, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// One planned step.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PlannedStep {
    /// Registry tool to call.
    pub tool: String,
    /// Argument passed to the tool.
    pub input: String,
    /// What this step is trying to establish.
    pub goal: String,
}

/// Verification verdict for one step.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Pass,
    Fail(String),
}

/// One executed-and-verified step.
#[derive(Debug, Clone)]
pub struct VerifiedStep {
    pub step: PlannedStep,
    pub observation: String,
    pub verdict: Verdict,
    pub attempts: usize,
}

/// Result of a PEV run.
#[derive(Debug, Clone)]
pub struct PevResult {
    pub goal: String,
    pub steps: Vec<VerifiedStep>,
    pub answer: String,
}

/// The PEV agent.
pub struct PevAgent {
    llm: LlmClient,
    tools: ToolRegistry,
    max_step_attempts: usize,
}

impl PevAgent {
    pub fn new(llm: LlmClient, tools: ToolRegistry) -> Self {
        Self {
            llm,
            tools,
            max_step_attempts: 2,
        }
    }

    /// Attempts allowed per step (execution + verification).
    pub fn with_max_step_attempts(mut self, max: usize) -> Self {
        self.max_step_attempts = max.max(1);
        self
    }

    /// Ask for a plan as JSON steps.
    pub async fn plan(&self, goal: &str) -> Result<Vec<PlannedStep>> {
        let response = self
            .llm
            .generate(&format!(
                "Plan how to achieve this goal using the available tools.\n\n\
                 Tools:\n{}\n\n\
                 Goal: {goal}\n\n\
                 Reply with a JSON array only, where each element is\n\
                 {{\"tool\": \"<name>\", \"input\": \"<argument>\", \"goal\": \"<what this step establishes>\"}}",
                self.tools.prompt_listing()
            ))
            .await?;

        let json = extract_json_array(&response).ok_or_else(|| PatternError::MalformedOutput {
            context: "PEV plan".into(),
            detail: "no JSON array in reply".into(),
        })?;
        let steps: Vec<PlannedStep> =
            serde_json::from_str(json).map_err(|e| PatternError::MalformedOutput {
                context: "PEV plan".into(),
                detail: e.to_string(),
            })?;
        if steps.is_empty() {
            return Err(PatternError::MalformedOutput {
                context: "PEV plan".into(),
                detail: "plan is empty".into(),
            }
            .into());
        }
        Ok(steps)
    }

    fn argument_key(tool: &str) -> &'static str {
        match tool {
            "calculator" => "expression",
            "weather" => "city",
            "search" => "query",
            "knowledge_base" => "topic",
            "stock" => "symbol",
            _ => "input",
        }
    }

    /// Execute one step against the registry.
    async fn execute(&self, step: &PlannedStep) -> String {
        let arguments = serde_json::json!({ Self::argument_key(&step.tool): step.input });
        match self.tools.execute(&step.tool, arguments).await {
            Ok(outcome) => outcome.output,
            Err(e) => format!("Error: {e}"),
        }
    }

    /// Verify a step's observation against its goal.
    async fn verify(&self, step: &PlannedStep, observation: &str) -> Result<Verdict> {
        let response = self
            .llm
            .generate(&format!(
                "Step goal: {}\nTool used: {}[{}]\nObservation: {observation}\n\n\
                 Did the observation satisfy the step goal?\n\
                 Reply with exactly PASS, or FAIL: <reason>.",
                step.goal, step.tool, step.input
            ))
            .await?;

        let trimmed = response.trim();
        if trimmed.to_uppercase().starts_with("PASS") {
            Ok(Verdict::Pass)
        } else {
            let reason = trimmed
                .strip_prefix("FAIL:")
                .or_else(|| trimmed.strip_prefix("FAIL"))
                .unwrap_or(trimmed)
                .trim()
                .to_string();
            Ok(Verdict::Fail(reason))
        }
    }

    /// Run plan → execute/verify each step → synthesize.
    pub async fn solve(&self, goal: &str) -> Result<PevResult> {
        let plan = self.plan(goal).await?;
        info!(steps = plan.len(), "PEV plan ready");

        let mut verified = Vec::with_capacity(plan.len());
        for step in plan {
            let mut attempts = 0;
            let outcome = loop {
                attempts += 1;
                debug!(tool = %step.tool, attempts, "executing step");
                let observation = self.execute(&step).await;
                let verdict = self.verify(&step, &observation).await?;

                match verdict {
                    Verdict::Pass => {
                        break VerifiedStep {
                            step: step.clone(),
                            observation,
                            verdict: Verdict::Pass,
                            attempts,
                        }
                    }
                    Verdict::Fail(reason) => {
                        if attempts >= self.max_step_attempts {
                            warn!(tool = %step.tool, %reason, "step failed after retries");
                            return Err(PatternError::StepFailed {
                                step: format!("{}[{}]", step.tool, step.input),
                                reason,
                            }
                            .into());
                        }
                        warn!(tool = %step.tool, %reason, "step failed, retrying");
                    }
                }
            };
            verified.push(outcome);
        }

        let evidence = verified
            .iter()
            .map(|v| format!("- {} → {}", v.step.goal, v.observation))
            .collect::<Vec<_>>()
            .join("\n");
        let answer = self
            .llm
            .generate(&format!(
                "Goal: {goal}\n\nVerified evidence:\n{evidence}\n\n\
                 Write the final answer to the goal using only this evidence."
            ))
            .await?;

        Ok(PevResult {
            goal: goal.to_string(),
            steps: verified,
            answer,
        })
    }
}

fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

/// Demo: compare weather and a stock quote through the verified pipeline.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let agent = PevAgent::new(llm.clone(), agentry_tools::default_registry());
    let goal = "Report the current weather in Tokyo and the ACME stock price.";
    let result = agent.solve(goal).await?;

    let mut report = DemoReport::new("plan-execute-verify");
    report.push("Goal", goal);
    for (i, step) in result.steps.iter().enumerate() {
        report.push(
            format!(
                "Step {} — {}[{}] ({} attempt{})",
                i + 1,
                step.step.tool,
                step.step.input,
                step.attempts,
                if step.attempts == 1 { "" } else { "s" }
            ),
            format!("goal: {}\nobservation: {}", step.step.goal, step.observation),
        );
    }
    report.push("Answer", &result.answer);
    Ok(report)
}
