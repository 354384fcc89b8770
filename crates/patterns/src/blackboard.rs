//! Blackboard — specialists contribute opportunistically to a shared board.
//!
//! The board holds findings and partial solutions with confidence scores.
//! Each round the controller asks every source whether it can contribute
//! given the board's current state, picks the first eligible one, and lets
//! it write. The loop ends when a solution is complete enough or the round
//! cap is hit, then the board is synthesized into a final answer.

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use async_trait::async_trait;
use tracing::{debug, info};

/// A finding posted to the board.
#[derive(Debug, Clone)]
pub struct Finding {
    pub source: String,
    pub content: String,
    pub confidence: f32,
}

/// A partial or complete solution on the board.
#[derive(Debug, Clone)]
pub struct Solution {
    pub source: String,
    pub content: String,
    /// 0.0-1.0; the controller stops at [`Blackboard::COMPLETENESS_BAR`].
    pub completeness: f32,
}

/// The shared board.
#[derive(Debug, Default)]
pub struct Blackboard {
    pub problem: String,
    pub findings: Vec<Finding>,
    pub solutions: Vec<Solution>,
}

impl Blackboard {
    pub const COMPLETENESS_BAR: f32 = 0.8;

    pub fn new(problem: impl Into<String>) -> Self {
        Self {
            problem: problem.into(),
            ..Default::default()
        }
    }

    pub fn add_finding(&mut self, source: &str, content: impl Into<String>, confidence: f32) {
        self.findings.push(Finding {
            source: source.to_string(),
            content: content.into(),
            confidence: confidence.clamp(0.0, 1.0),
        });
    }

    pub fn add_solution(&mut self, source: &str, content: impl Into<String>, completeness: f32) {
        self.solutions.push(Solution {
            source: source.to_string(),
            content: content.into(),
            completeness: completeness.clamp(0.0, 1.0),
        });
    }

    /// Does the board hold a complete-enough solution?
    pub fn is_solved(&self) -> bool {
        self.solutions
            .iter()
            .any(|s| s.completeness >= Self::COMPLETENESS_BAR)
    }

    /// Render the board state for prompts.
    pub fn summary(&self) -> String {
        let findings = if self.findings.is_empty() {
            "(no findings yet)".to_string()
        } else {
            self.findings
                .iter()
                .map(|f| format!("- [{} @{:.1}] {}", f.source, f.confidence, f.content))
                .collect::<Vec<_>>()
                .join("\n")
        };
        let solutions = if self.solutions.is_empty() {
            "(no solutions yet)".to_string()
        } else {
            self.solutions
                .iter()
                .map(|s| format!("- [{} @{:.1}] {}", s.source, s.completeness, s.content))
                .collect::<Vec<_>>()
                .join("\n")
        };
        format!(
            "Problem: {}\nFindings:\n{findings}\nPartial solutions:\n{solutions}",
            self.problem
        )
    }
}

/// A knowledge source that can contribute to the board.
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    fn name(&self) -> &str;

    /// Eligibility given the current board.
    fn can_contribute(&self, board: &Blackboard) -> bool;

    /// Write to the board.
    async fn contribute(&self, llm: &LlmClient, board: &mut Blackboard) -> Result<String>;
}

/// Posts initial research findings; eligible while the board has none.
pub struct ResearchSource;

#[async_trait]
impl KnowledgeSource for ResearchSource {
    fn name(&self) -> &str {
        "research"
    }

    fn can_contribute(&self, board: &Blackboard) -> bool {
        board.findings.is_empty()
    }

    async fn contribute(&self, llm: &LlmClient, board: &mut Blackboard) -> Result<String> {
        let content = llm
            .generate(&format!(
                "Research this problem and state the two most important facts \
                 or constraints:\n{}",
                board.problem
            ))
            .await?;
        board.add_finding(self.name(), &content, 0.8);
        Ok(content)
    }
}

/// Analyzes findings; eligible once findings exist but analysis doesn't.
pub struct AnalysisSource;

#[async_trait]
impl KnowledgeSource for AnalysisSource {
    fn name(&self) -> &str {
        "analysis"
    }

    fn can_contribute(&self, board: &Blackboard) -> bool {
        !board.findings.is_empty() && !board.findings.iter().any(|f| f.source == "analysis")
    }

    async fn contribute(&self, llm: &LlmClient, board: &mut Blackboard) -> Result<String> {
        let content = llm
            .generate(&format!(
                "{}\n\nAnalyze the findings above: what do they imply for \
                 solving the problem?",
                board.summary()
            ))
            .await?;
        board.add_finding(self.name(), &content, 0.7);
        Ok(content)
    }
}

/// Drafts solutions; eligible once analysis exists and nothing is solved.
pub struct SolutionSource;

#[async_trait]
impl KnowledgeSource for SolutionSource {
    fn name(&self) -> &str {
        "solution"
    }

    fn can_contribute(&self, board: &Blackboard) -> bool {
        board.findings.iter().any(|f| f.source == "analysis") && !board.is_solved()
    }

    async fn contribute(&self, llm: &LlmClient, board: &mut Blackboard) -> Result<String> {
        let content = llm
            .generate(&format!(
                "{}\n\nPropose a concrete solution to the problem based on the \
                 board.",
                board.summary()
            ))
            .await?;
        board.add_solution(self.name(), &content, 0.9);
        Ok(content)
    }
}

/// One controller round's record.
#[derive(Debug, Clone)]
pub struct RoundRecord {
    pub round: usize,
    pub source: String,
    pub contribution: String,
}

/// Result of a blackboard run.
#[derive(Debug, Clone)]
pub struct BlackboardResult {
    pub rounds: Vec<RoundRecord>,
    pub answer: String,
    pub solved: bool,
}

/// The controller that schedules sources.
pub struct BlackboardSystem {
    llm: LlmClient,
    sources: Vec<Box<dyn KnowledgeSource>>,
    max_rounds: usize,
}

impl BlackboardSystem {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            sources: Vec::new(),
            max_rounds: 6,
        }
    }

    pub fn add_source(mut self, source: Box<dyn KnowledgeSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Cap the controller rounds.
    pub fn with_max_rounds(mut self, max: usize) -> Self {
        self.max_rounds = max.max(1);
        self
    }

    /// The default three-source lineup.
    pub fn with_default_sources(self) -> Self {
        self.add_source(Box::new(ResearchSource))
            .add_source(Box::new(AnalysisSource))
            .add_source(Box::new(SolutionSource))
    }

    /// Run the opportunistic loop, then synthesize from the board.
    pub async fn solve(&self, problem: &str) -> Result<BlackboardResult> {
        let mut board = Blackboard::new(problem);
        let mut rounds = Vec::new();

        for round in 1..=self.max_rounds {
            if board.is_solved() {
                break;
            }
            let Some(source) = self.sources.iter().find(|s| s.can_contribute(&board)) else {
                debug!(round, "no eligible source, stopping");
                break;
            };

            info!(round, source = source.name(), "source contributing");
            let contribution = source.contribute(&self.llm, &mut board).await?;
            rounds.push(RoundRecord {
                round,
                source: source.name().to_string(),
                contribution,
            });
        }

        let answer = self
            .llm
            .generate(&format!(
                "{}\n\nSynthesize the board into a final, self-contained answer.",
                board.summary()
            ))
            .await?;

        Ok(BlackboardResult {
            rounds,
            answer,
            solved: board.is_solved(),
        })
    }
}

/// Demo: solve a capacity-planning question via the board.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let system = BlackboardSystem::new(llm.clone()).with_default_sources();
    let problem = "Our API latency doubles every Friday afternoon. Find the likely \
                   cause and a mitigation.";
    let result = system.solve(problem).await?;

    let mut report = DemoReport::new("blackboard");
    report.push("Problem", problem);
    for round in &result.rounds {
        report.push(
            format!("Round {} — {}", round.round, round.source),
            &round.contribution,
        );
    }
    report.push(
        format!("Synthesis (solved: {})", result.solved),
        &result.answer,
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::scripted;

    #[test]
    fn board_solved_at_bar() {
        let mut board = Blackboard::new("p");
        board.add_solution("s", "partial", 0.5);
        assert!(!board.is_solved());
        board.add_solution("s", "full", 0.9);
        assert!(board.is_solved());
    }

    #[test]
    fn eligibility_gates_order_sources() {
        let mut board = Blackboard::new("p");
        assert!(ResearchSource.can_contribute(&board));
        assert!(!AnalysisSource.can_contribute(&board));
        assert!(!SolutionSource.can_contribute(&board));

        board.add_finding("research", "fact", 0.8);
        assert!(!ResearchSource.can_contribute(&board));
        assert!(AnalysisSource.can_contribute(&board));

        board.add_finding("analysis", "implication", 0.7);
        assert!(SolutionSource.can_contribute(&board));
    }

    #[tokio::test]
    async fn full_run_contributes_in_order() {
        let llm = scripted(&[
            "Fact: traffic spikes Fridays; batch jobs run at 15:00.",
            "The spike coincides with the batch window.",
            "Stagger the batch jobs and add an autoscaling rule.",
            "Cause: batch jobs; mitigation: stagger and autoscale.",
        ]);
        let system = BlackboardSystem::new(llm).with_default_sources();
        let result = system.solve("latency doubles fridays").await.unwrap();

        let order: Vec<&str> = result.rounds.iter().map(|r| r.source.as_str()).collect();
        assert_eq!(order, vec!["research", "analysis", "solution"]);
        assert!(result.solved);
        assert!(result.answer.contains("mitigation"));
    }

    #[tokio::test]
    async fn round_cap_stops_loop() {
        let llm = scripted(&["a fact", "synthesis from partial board"]);
        let system = BlackboardSystem::new(llm)
            .with_default_sources()
            .with_max_rounds(1);
        let result = system.solve("p").await.unwrap();
        assert_eq!(result.rounds.len(), 1);
        assert!(!result.solved);
    }

    #[tokio::test]
    async fn no_sources_still_synthesizes() {
        let llm = scripted(&["best effort from empty board"]);
        let system = BlackboardSystem::new(llm);
        let result = system.solve("p").await.unwrap();
        assert!(result.rounds.is_empty());
        assert!(!result.solved);
    }
}
