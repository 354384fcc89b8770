//! Self-improvement — critique drafts, revise, learn from accepted work.
//!
//! A critic scores each draft 1-10 with strengths and weaknesses. Scores
//! below the bar trigger one revision with the feedback folded in. Accepted
//! outputs become learning examples whose lessons seed the context of
//! future generations, so later rounds start from a better place.

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use tracing::{debug, info};

/// Critic feedback on one draft.
#[derive(Debug, Clone)]
pub struct Critique {
    pub score: u8,
    pub strengths: String,
    pub weaknesses: String,
}

/// A stored high-quality example.
#[derive(Debug, Clone)]
pub struct LearningExample {
    pub task: String,
    pub output: String,
    pub score: u8,
}

/// One task's journey through the loop.
#[derive(Debug, Clone)]
pub struct ImprovementRound {
    pub task: String,
    pub draft: String,
    pub first_critique: Critique,
    pub revised: Option<String>,
    pub final_critique: Critique,
    pub learned: bool,
}

/// The self-improving generator.
pub struct SelfImprovingAgent {
    llm: LlmClient,
    accept_bar: u8,
    learn_bar: u8,
    examples: Vec<LearningExample>,
}

impl SelfImprovingAgent {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            accept_bar: 7,
            learn_bar: 8,
            examples: Vec::new(),
        }
    }

    /// Score below which a revision happens.
    pub fn with_accept_bar(mut self, bar: u8) -> Self {
        self.accept_bar = bar.min(10);
        self
    }

    /// Score at or above which outputs are kept as learning examples.
    pub fn with_learn_bar(mut self, bar: u8) -> Self {
        self.learn_bar = bar.min(10);
        self
    }

    pub fn examples(&self) -> &[LearningExample] {
        &self.examples
    }

    fn learning_context(&self) -> String {
        if self.examples.is_empty() {
            return String::new();
        }
        let best = self
            .examples
            .iter()
            .max_by_key(|e| e.score)
            .expect("non-empty examples");
        format!(
            "Here is a previous output that scored {}/10 — match or beat its \
             quality:\nTask: {}\nOutput: {}\n\n",
            best.score, best.task, best.output
        )
    }

    /// Generate a draft, seeded by the best stored example.
    pub async fn generate(&self, task: &str) -> Result<String> {
        let context = self.learning_context();
        Ok(self.llm.generate(&format!("{context}Task: {task}")).await?)
    }

    /// Critique a draft (SCORE/STRENGTHS/WEAKNESSES protocol).
    pub async fn critique(&self, task: &str, output: &str) -> Result<Critique> {
        let response = self
            .llm
            .generate(&format!(
                "You are a demanding editor. Critique this output.\n\n\
                 Task: {task}\nOutput: {output}\n\n\
                 Reply in exactly this format:\n\
                 SCORE: <1-10>\n\
                 STRENGTHS: <one line>\n\
                 WEAKNESSES: <one line>"
            ))
            .await?;

        let field = |prefix: &str| -> String {
            response
                .lines()
                .find_map(|l| l.trim().strip_prefix(prefix))
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        };
        let score = field("SCORE:")
            .split('/')
            .next()
            .and_then(|s| s.trim().parse::<u8>().ok())
            .unwrap_or(5)
            .min(10);

        Ok(Critique {
            score,
            strengths: field("STRENGTHS:"),
            weaknesses: field("WEAKNESSES:"),
        })
    }

    /// One full round: draft → critique → maybe revise → maybe learn.
    pub async fn process(&mut self, task: &str) -> Result<ImprovementRound> {
        let draft = self.generate(task).await?;
        let first_critique = self.critique(task, &draft).await?;
        debug!(score = first_critique.score, "first critique");

        let (revised, final_output, final_critique) = if first_critique.score < self.accept_bar {
            let revised = self
                .llm
                .generate(&format!(
                    "Task: {task}\n\nDraft:\n{draft}\n\n\
                     Editor feedback — strengths: {}; weaknesses: {}\n\n\
                     Rewrite the draft addressing the weaknesses.",
                    first_critique.strengths, first_critique.weaknesses
                ))
                .await?;
            let critique = self.critique(task, &revised).await?;
            (Some(revised.clone()), revised, critique)
        } else {
            (None, draft.clone(), first_critique.clone())
        };

        let learned = final_critique.score >= self.learn_bar;
        if learned {
            info!(score = final_critique.score, "storing learning example");
            self.examples.push(LearningExample {
                task: task.to_string(),
                output: final_output,
                score: final_critique.score,
            });
        }

        Ok(ImprovementRound {
            task: task.to_string(),
            draft,
            first_critique,
            revised,
            final_critique,
            learned,
        })
    }
}

/// Demo: two related tasks; the second benefits from the first's example.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let mut agent = SelfImprovingAgent::new(llm.clone());

    let tasks = [
        "Write a one-paragraph product description for noise-cancelling headphones.",
        "Write a one-paragraph product description for a mechanical keyboard.",
    ];

    let mut report = DemoReport::new("self-improvement");
    for task in tasks {
        let round = agent.process(task).await?;
        let mut body = format!(
            "draft score: {}/10 (strengths: {}; weaknesses: {})",
            round.first_critique.score,
            round.first_critique.strengths,
            round.first_critique.weaknesses
        );
        if round.revised.is_some() {
            body.push_str(&format!(
                "\nrevised score: {}/10",
                round.final_critique.score
            ));
        }
        body.push_str(&format!("\nlearned: {}", round.learned));
        report.push(format!("Task: {task}"), body);
    }

    report.push(
        "Learning memory",
        format!("{} stored example(s)", agent.examples().len()),
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{scripted, scripted_with_handle};

    const GOOD_CRITIQUE: &str = "SCORE: 9\nSTRENGTHS: vivid\nWEAKNESSES: none";
    const BAD_CRITIQUE: &str = "SCORE: 4\nSTRENGTHS: clear\nWEAKNESSES: generic";

    #[tokio::test]
    async fn good_draft_skips_revision_and_learns() {
        let llm = scripted(&["a great draft", GOOD_CRITIQUE]);
        let mut agent = SelfImprovingAgent::new(llm);
        let round = agent.process("task").await.unwrap();
        assert!(round.revised.is_none());
        assert!(round.learned);
        assert_eq!(agent.examples().len(), 1);
    }

    #[tokio::test]
    async fn weak_draft_gets_revised() {
        let llm = scripted(&["weak draft", BAD_CRITIQUE, "stronger draft", GOOD_CRITIQUE]);
        let mut agent = SelfImprovingAgent::new(llm);
        let round = agent.process("task").await.unwrap();
        assert_eq!(round.first_critique.score, 4);
        assert_eq!(round.revised.as_deref(), Some("stronger draft"));
        assert_eq!(round.final_critique.score, 9);
        assert!(round.learned);
    }

    #[tokio::test]
    async fn mediocre_final_is_not_learned() {
        let llm = scripted(&[
            "weak draft",
            BAD_CRITIQUE,
            "slightly better",
            "SCORE: 7\nSTRENGTHS: ok\nWEAKNESSES: flat",
        ]);
        let mut agent = SelfImprovingAgent::new(llm);
        let round = agent.process("task").await.unwrap();
        assert!(!round.learned);
        assert!(agent.examples().is_empty());
    }

    #[tokio::test]
    async fn stored_example_seeds_next_generation() {
        let (llm, provider) = scripted_with_handle(&[
            "headphones copy",
            GOOD_CRITIQUE,
            "keyboard copy",
            GOOD_CRITIQUE,
        ]);
        let mut agent = SelfImprovingAgent::new(llm);
        agent.process("headphones description").await.unwrap();
        agent.process("keyboard description").await.unwrap();

        // The second generation prompt (3rd call) must embed the stored example.
        assert!(provider.prompts()[2].contains("headphones copy"));
        assert!(provider.prompts()[2].contains("9/10"));
    }
}
