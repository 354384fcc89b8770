//! Relevancy check — score, filter and verify retrieved content.
//!
//! Relevancy scores come from the judge (`SCORE: n/10` protocol); content
//! below the floor is filtered out. Fact grounding checks content against
//! supplied sources; claim verification returns one of three verdicts per
//! claim.

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use tracing::debug;

/// A scored piece of content.
#[derive(Debug, Clone)]
pub struct ScoredContent {
    pub content: String,
    pub score: u8,
    pub rationale: String,
}

/// Verdict on one claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Supported,
    Contradicted,
    Unverifiable,
}

/// The relevancy checker.
pub struct RelevancyChecker {
    llm: LlmClient,
    score_floor: u8,
}

impl RelevancyChecker {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            score_floor: 5,
        }
    }

    /// Content scoring below this is filtered out.
    pub fn with_score_floor(mut self, floor: u8) -> Self {
        self.score_floor = floor.min(10);
        self
    }

    /// Score content relevance to a query (1-10).
    pub async fn score(&self, query: &str, content: &str) -> Result<ScoredContent> {
        let response = self
            .llm
            .generate(&format!(
                "Rate how relevant this content is to the query, 1-10.\n\
                 Query: {query}\nContent: {content}\n\n\
                 Reply with \"SCORE: n/10\" then a one-line reason."
            ))
            .await?;

        let score = crate::evaluation::parse_score(&response).unwrap_or(5);
        let rationale = response
            .lines()
            .filter(|l| !l.trim().starts_with("SCORE:"))
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string();

        Ok(ScoredContent {
            content: content.to_string(),
            score,
            rationale,
        })
    }

    /// Keep only content at or above the floor, best first.
    pub async fn filter(
        &self,
        query: &str,
        contents: &[&str],
    ) -> Result<(Vec<ScoredContent>, Vec<ScoredContent>)> {
        let mut kept = Vec::new();
        let mut dropped = Vec::new();
        for content in contents {
            let scored = self.score(query, content).await?;
            debug!(score = scored.score, "scored content");
            if scored.score >= self.score_floor {
                kept.push(scored);
            } else {
                dropped.push(scored);
            }
        }
        kept.sort_by(|a, b| b.score.cmp(&a.score));
        Ok((kept, dropped))
    }

    /// Check whether content is grounded in the given sources.
    pub async fn check_grounding(&self, content: &str, sources: &[&str]) -> Result<bool> {
        let sources_text = sources.join("\n---\n");
        let response = self
            .llm
            .generate(&format!(
                "Is every factual claim in this content supported by the \
                 sources below?\n\nContent: {content}\n\nSources:\n{sources_text}\n\n\
                 Reply with exactly GROUNDED or UNGROUNDED."
            ))
            .await?;
        Ok(response.to_uppercase().contains("GROUNDED")
            && !response.to_uppercase().contains("UNGROUNDED"))
    }

    /// Verify one claim against a knowledge base.
    pub async fn verify_claim(&self, claim: &str, knowledge: &[&str]) -> Result<Verdict> {
        let knowledge_text = knowledge.join("\n");
        let response = self
            .llm
            .generate(&format!(
                "Claim: {claim}\n\nKnown facts:\n{knowledge_text}\n\n\
                 Reply with exactly one word: SUPPORTED, CONTRADICTED or UNVERIFIABLE."
            ))
            .await?;
        let upper = response.to_uppercase();
        Ok(if upper.contains("CONTRADICTED") {
            Verdict::Contradicted
        } else if upper.contains("UNVERIFIABLE") {
            Verdict::Unverifiable
        } else if upper.contains("SUPPORTED") {
            Verdict::Supported
        } else {
            Verdict::Unverifiable
        })
    }
}

/// Demo: filter three snippets, ground-check one, verify two claims.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let checker = RelevancyChecker::new(llm.clone()).with_score_floor(5);
    let query = "How does Rust prevent data races?";

    let contents = [
        "Rust's ownership and Send/Sync traits prevent data races at compile time.",
        "The borrow checker enforces aliasing rules that make data races impossible in safe code.",
        "Sourdough bread needs a long, slow fermentation for flavour.",
    ];

    let (kept, dropped) = checker.filter(query, &contents).await?;

    let mut report = DemoReport::new("relevancy-check");
    report.push(
        "Kept content",
        kept.iter()
            .map(|c| format!("[{}] {} — {}", c.score, c.content, c.rationale))
            .collect::<Vec<_>>()
            .join("\n"),
    );
    report.push(
        "Filtered out",
        dropped
            .iter()
            .map(|c| format!("[{}] {}", c.score, c.content))
            .collect::<Vec<_>>()
            .join("\n"),
    );

    let grounded = checker
        .check_grounding(
            "Rust prevents data races through ownership.",
            &["The ownership system statically prevents data races."],
        )
        .await?;
    report.push("Grounding check", format!("grounded: {grounded}"));

    let verdict = checker
        .verify_claim(
            "Rust guarantees freedom from data races in safe code.",
            &["Safe Rust prevents data races via Send and Sync."],
        )
        .await?;
    report.push("Claim verification", format!("{verdict:?}"));
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::scripted;

    #[tokio::test]
    async fn filter_splits_on_floor() {
        let llm = scripted(&[
            "SCORE: 9/10\ndirectly on topic",
            "SCORE: 2/10\nabout baking",
        ]);
        let checker = RelevancyChecker::new(llm).with_score_floor(5);
        let (kept, dropped) = checker
            .filter("rust safety", &["ownership prevents races", "sourdough tips"])
            .await
            .unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(dropped.len(), 1);
        assert_eq!(kept[0].score, 9);
    }

    #[tokio::test]
    async fn kept_results_sorted_best_first() {
        let llm = scripted(&["SCORE: 6/10\nok", "SCORE: 9/10\nbetter"]);
        let checker = RelevancyChecker::new(llm);
        let (kept, _) = checker.filter("q", &["a", "b"]).await.unwrap();
        assert_eq!(kept[0].score, 9);
        assert_eq!(kept[1].score, 6);
    }

    #[tokio::test]
    async fn grounding_verdicts() {
        let llm = scripted(&["GROUNDED", "UNGROUNDED"]);
        let checker = RelevancyChecker::new(llm);
        assert!(checker.check_grounding("c", &["s"]).await.unwrap());
        assert!(!checker.check_grounding("c", &["s"]).await.unwrap());
    }

    #[tokio::test]
    async fn claim_verdict_parsing() {
        let llm = scripted(&["SUPPORTED", "CONTRADICTED", "no idea honestly"]);
        let checker = RelevancyChecker::new(llm);
        assert_eq!(checker.verify_claim("c", &[]).await.unwrap(), Verdict::Supported);
        assert_eq!(
            checker.verify_claim("c", &[]).await.unwrap(),
            Verdict::Contradicted
        );
        assert_eq!(
            checker.verify_claim("c", &[]).await.unwrap(),
            Verdict::Unverifiable
        );
    }
}
