//! Resource-aware optimization — route tasks to cheap or premium lanes.
//!
//! A local heuristic scores task complexity; the score picks a lane with its
//! own temperature and token budget. A usage ledger tallies simulated cost
//! per lane so the trade-off is visible at the end of a session.

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use tracing::debug;

/// Processing lanes, cheapest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    Simple,
    Balanced,
    Premium,
}

impl Lane {
    /// (temperature, max words requested, simulated cost per task)
    fn settings(self) -> (f32, usize, f32) {
        match self {
            Lane::Simple => (0.0, 50, 0.2),
            Lane::Balanced => (0.3, 150, 1.0),
            Lane::Premium => (0.7, 400, 5.0),
        }
    }
}

/// Heuristic complexity score in 0..=10.
pub fn complexity_score(task: &str) -> u32 {
    let mut score = 0u32;
    let words = task.split_whitespace().count();

    score += match words {
        0..=8 => 0,
        9..=20 => 2,
        21..=40 => 4,
        _ => 6,
    };

    let lower = task.to_lowercase();
    for marker in ["analyze", "compare", "design", "architecture", "trade-off", "comprehensive"] {
        if lower.contains(marker) {
            score += 2;
        }
    }
    for marker in ["step by step", "in depth", "detailed"] {
        if lower.contains(marker) {
            score += 1;
        }
    }
    score.min(10)
}

/// Pick a lane from a complexity score.
pub fn choose_lane(score: u32) -> Lane {
    match score {
        0..=2 => Lane::Simple,
        3..=6 => Lane::Balanced,
        _ => Lane::Premium,
    }
}

/// One processed task.
#[derive(Debug, Clone)]
pub struct ProcessedTask {
    pub task: String,
    pub score: u32,
    pub lane: Lane,
    pub response: String,
    pub cost: f32,
}

/// Per-lane usage counters.
#[derive(Debug, Clone, Default)]
pub struct UsageLedger {
    pub simple: u32,
    pub balanced: u32,
    pub premium: u32,
    pub total_cost: f32,
}

impl UsageLedger {
    fn record(&mut self, lane: Lane, cost: f32) {
        match lane {
            Lane::Simple => self.simple += 1,
            Lane::Balanced => self.balanced += 1,
            Lane::Premium => self.premium += 1,
        }
        self.total_cost += cost;
    }
}

/// The resource optimizer.
pub struct ResourceOptimizer {
    llm: LlmClient,
    ledger: UsageLedger,
}

impl ResourceOptimizer {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            ledger: UsageLedger::default(),
        }
    }

    pub fn ledger(&self) -> &UsageLedger {
        &self.ledger
    }

    /// Score, route and process one task.
    pub async fn process(&mut self, task: &str) -> Result<ProcessedTask> {
        let score = complexity_score(task);
        let lane = choose_lane(score);
        let (temperature, max_words, cost) = lane.settings();
        debug!(score, ?lane, "routed task");

        let prompt = match lane {
            Lane::Simple => format!("Answer briefly (under {max_words} words): {task}"),
            Lane::Balanced => format!("Answer clearly in up to {max_words} words: {task}"),
            Lane::Premium => format!(
                "Give a thorough, structured answer (up to {max_words} words), \
                 covering trade-offs where relevant: {task}"
            ),
        };

        let response = self.llm.generate_at(&prompt, temperature).await?;
        self.ledger.record(lane, cost);

        Ok(ProcessedTask {
            task: task.to_string(),
            score,
            lane,
            response,
            cost,
        })
    }
}

/// Demo: three tasks of increasing complexity.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let mut optimizer = ResourceOptimizer::new(llm.clone());

    let tasks = [
        "What is 2 + 2?",
        "Explain the difference between a vector and a linked list for a new developer.",
        "Design and analyze a comprehensive caching architecture for a read-heavy \
         web service, comparing the trade-offs of each layer in depth.",
    ];

    let mut report = DemoReport::new("resource-optimization");
    for task in tasks {
        let processed = optimizer.process(task).await?;
        report.push(
            format!("Task (score {}, {:?} lane)", processed.score, processed.lane),
            format!("{}\n→ {}", processed.task, processed.response),
        );
    }

    let ledger = optimizer.ledger();
    report.push(
        "Usage ledger",
        format!(
            "simple: {}  balanced: {}  premium: {}\nsimulated cost: {:.1} units",
            ledger.simple, ledger.balanced, ledger.premium, ledger.total_cost
        ),
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::scripted;

    #[test]
    fn short_questions_score_low() {
        assert!(complexity_score("What is 2 + 2?") <= 2);
    }

    #[test]
    fn analysis_keywords_raise_score() {
        let simple = complexity_score("tell me a fact");
        let complex = complexity_score(
            "Design and analyze a comprehensive architecture comparing trade-off choices",
        );
        assert!(complex > simple);
        assert!(complex >= 7);
    }

    #[test]
    fn score_is_capped() {
        let monster = "analyze compare design architecture trade-off comprehensive ".repeat(20);
        assert_eq!(complexity_score(&monster), 10);
    }

    #[test]
    fn lanes_cover_score_range() {
        assert_eq!(choose_lane(0), Lane::Simple);
        assert_eq!(choose_lane(4), Lane::Balanced);
        assert_eq!(choose_lane(9), Lane::Premium);
    }

    #[tokio::test]
    async fn ledger_accumulates() {
        let llm = scripted(&["4", "long answer"]);
        let mut optimizer = ResourceOptimizer::new(llm);
        optimizer.process("What is 2 + 2?").await.unwrap();
        optimizer
            .process("Design and analyze a comprehensive architecture comparing trade-off options in depth")
            .await
            .unwrap();

        let ledger = optimizer.ledger();
        assert_eq!(ledger.simple, 1);
        assert_eq!(ledger.premium, 1);
        assert!(ledger.total_cost > 5.0);
    }

    #[tokio::test]
    async fn premium_lane_uses_higher_temperature() {
        // generate_at receives lane temperature; verified via processed lane
        let llm = scripted(&["deep answer"]);
        let mut optimizer = ResourceOptimizer::new(llm);
        let processed = optimizer
            .process("Design a comprehensive architecture and analyze the trade-off space in depth")
            .await
            .unwrap();
        assert_eq!(processed.lane, Lane::Premium);
        assert!(processed.cost >= 5.0);
    }
}
