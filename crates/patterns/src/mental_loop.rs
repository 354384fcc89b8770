//! Mental loop — simulate candidate actions before committing to one.
//!
//! The agent proposes candidate actions for a situation, runs each through
//! a mental simulation (predicted outcome, risks, benefits, success
//! probability), picks the highest expected-value candidate, and only then
//! "executes" it. Execution is simulated too; the pattern is the loop.

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use tracing::{debug, info};

/// A candidate action.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateAction {
    pub description: String,
}

/// Simulation output for one candidate.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub action: CandidateAction,
    pub predicted_outcome: String,
    pub risks: Vec<String>,
    pub benefits: Vec<String>,
    pub success_probability: f32,
}

/// Result of one decide-and-act cycle.
#[derive(Debug, Clone)]
pub struct MentalLoopResult {
    pub situation: String,
    pub simulations: Vec<Simulation>,
    pub chosen: Simulation,
    pub execution_report: String,
}

/// The mental-loop agent.
pub struct MentalLoopAgent {
    llm: LlmClient,
    max_candidates: usize,
}

impl MentalLoopAgent {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            max_candidates: 3,
        }
    }

    pub fn with_max_candidates(mut self, max: usize) -> Self {
        self.max_candidates = max.max(1);
        self
    }

    /// Propose candidate actions (numbered-list protocol).
    pub async fn propose(&self, situation: &str, goal: &str) -> Result<Vec<CandidateAction>> {
        let response = self
            .llm
            .generate(&format!(
                "Situation: {situation}\nGoal: {goal}\n\n\
                 Propose {} distinct candidate actions. Reply with a numbered \
                 list only.",
                self.max_candidates
            ))
            .await?;

        Ok(response
            .lines()
            .filter_map(|line| {
                let trimmed = line.trim();
                trimmed
                    .split_once('.')
                    .filter(|(n, _)| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
                    .map(|(_, rest)| CandidateAction {
                        description: rest.trim().to_string(),
                    })
                    .filter(|a| !a.description.is_empty())
            })
            .take(self.max_candidates)
            .collect())
    }

    /// Simulate one candidate in the mental model.
    pub async fn simulate(
        &self,
        situation: &str,
        action: &CandidateAction,
    ) -> Result<Simulation> {
        let response = self
            .llm
            .generate(&format!(
                "Mentally simulate taking this action.\n\
                 Situation: {situation}\nAction: {}\n\n\
                 Reply in exactly this format:\n\
                 OUTCOME: <predicted outcome>\n\
                 RISKS: <risk>; <risk>\n\
                 BENEFITS: <benefit>; <benefit>\n\
                 SUCCESS: 0.0-1.0",
                action.description
            ))
            .await?;

        let field = |prefix: &str| -> Option<String> {
            response
                .lines()
                .find_map(|l| l.trim().strip_prefix(prefix))
                .map(|s| s.trim().to_string())
        };
        let list = |prefix: &str| -> Vec<String> {
            field(prefix)
                .map(|s| {
                    s.split(';')
                        .map(|p| p.trim().to_string())
                        .filter(|p| !p.is_empty())
                        .collect()
                })
                .unwrap_or_default()
        };

        let success_probability = field("SUCCESS:")
            .and_then(|s| s.parse::<f32>().ok())
            .unwrap_or(0.5)
            .clamp(0.0, 1.0);

        debug!(action = %action.description, success_probability, "simulated");
        Ok(Simulation {
            action: action.clone(),
            predicted_outcome: field("OUTCOME:").unwrap_or_else(|| "unknown".into()),
            risks: list("RISKS:"),
            benefits: list("BENEFITS:"),
            success_probability,
        })
    }

    /// Expected value used to rank simulations: success probability minus a
    /// penalty per identified risk.
    pub fn expected_value(sim: &Simulation) -> f32 {
        sim.success_probability - 0.05 * sim.risks.len() as f32
            + 0.02 * sim.benefits.len() as f32
    }

    /// Full cycle: propose → simulate all → choose → execute.
    pub async fn decide_and_act(&self, situation: &str, goal: &str) -> Result<MentalLoopResult> {
        let candidates = self.propose(situation, goal).await?;
        if candidates.is_empty() {
            return Err(agentry_core::error::PatternError::MalformedOutput {
                context: "mental loop proposals".into(),
                detail: "no candidate actions parsed".into(),
            }
            .into());
        }

        let mut simulations = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            simulations.push(self.simulate(situation, candidate).await?);
        }

        let chosen = simulations
            .iter()
            .max_by(|a, b| {
                Self::expected_value(a)
                    .partial_cmp(&Self::expected_value(b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .cloned()
            .expect("non-empty simulations");

        info!(action = %chosen.action.description, "executing chosen action");
        let execution_report = self
            .llm
            .generate(&format!(
                "The agent now takes this action for real:\n{}\n\
                 Situation: {situation}\n\n\
                 Report what happens, in one short paragraph.",
                chosen.action.description
            ))
            .await?;

        Ok(MentalLoopResult {
            situation: situation.to_string(),
            simulations,
            chosen,
            execution_report,
        })
    }
}

/// Demo: choose a migration strategy by simulation.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let agent = MentalLoopAgent::new(llm.clone()).with_max_candidates(3);
    let situation = "The primary database is at 85% disk capacity and growing 5% weekly.";
    let goal = "Avoid an outage without losing data.";

    let result = agent.decide_and_act(situation, goal).await?;

    let mut report = DemoReport::new("mental-loop");
    report.push("Situation", situation);
    for sim in &result.simulations {
        report.push(
            format!(
                "Simulated: {} (p={:.2}, EV={:.2})",
                sim.action.description,
                sim.success_probability,
                MentalLoopAgent::expected_value(sim)
            ),
            format!(
                "outcome: {}\nrisks: {}\nbenefits: {}",
                sim.predicted_outcome,
                sim.risks.join("; "),
                sim.benefits.join("; ")
            ),
        );
    }
    report.push(
        format!("Chosen: {}", result.chosen.action.description),
        &result.execution_report,
    );
    Ok(report)
}
