//! Exploration and discovery — hypotheses, research, connections.
//!
//! For a topic: generate hypotheses (numbered-list protocol), research each
//! one with a self-reported confidence, ask a follow-up question per
//! finding, and close by connecting the findings into a report.

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use tracing::debug;

/// One researched hypothesis.
#[derive(Debug, Clone)]
pub struct Finding {
    pub hypothesis: String,
    pub research: String,
    pub confidence: f32,
    pub follow_up: String,
}

/// Result of exploring one topic.
#[derive(Debug, Clone)]
pub struct ExplorationOutcome {
    pub topic: String,
    pub findings: Vec<Finding>,
    pub connections: String,
}

/// The exploration agent.
pub struct Explorer {
    llm: LlmClient,
    max_hypotheses: usize,
}

impl Explorer {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            max_hypotheses: 3,
        }
    }

    /// Cap how many hypotheses get researched.
    pub fn with_max_hypotheses(mut self, max: usize) -> Self {
        self.max_hypotheses = max.max(1);
        self
    }

    /// Generate hypotheses as a numbered list.
    pub async fn generate_hypotheses(&self, topic: &str) -> Result<Vec<String>> {
        let response = self
            .llm
            .generate(&format!(
                "Generate {} testable hypotheses about: {topic}\n\
                 Respond with a numbered list only.",
                self.max_hypotheses
            ))
            .await?;

        let hypotheses: Vec<String> = response
            .lines()
            .filter_map(|line| {
                let trimmed = line.trim();
                trimmed
                    .split_once('.')
                    .filter(|(n, _)| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
                    .map(|(_, rest)| rest.trim().to_string())
                    .filter(|rest| !rest.is_empty())
            })
            .take(self.max_hypotheses)
            .collect();
        Ok(hypotheses)
    }

    /// Research one hypothesis; confidence comes from a trailing marker.
    pub async fn research(&self, hypothesis: &str) -> Result<(String, f32)> {
        let response = self
            .llm
            .generate(&format!(
                "Research this hypothesis and summarize the evidence for and \
                 against it:\n{hypothesis}\n\n\
                 End with a line \"CONFIDENCE: 0.0-1.0\" for how well supported it is."
            ))
            .await?;
        let confidence = extract_confidence(&response);
        let research = response
            .lines()
            .filter(|l| !l.trim().starts_with("CONFIDENCE:"))
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();
        Ok((research, confidence))
    }

    /// Explore a topic end to end.
    pub async fn explore(&self, topic: &str) -> Result<ExplorationOutcome> {
        let hypotheses = self.generate_hypotheses(topic).await?;
        debug!(count = hypotheses.len(), "hypotheses generated");

        let mut findings = Vec::with_capacity(hypotheses.len());
        for hypothesis in hypotheses {
            let (research, confidence) = self.research(&hypothesis).await?;
            let follow_up = self
                .llm
                .generate(&format!(
                    "Given this finding:\n{research}\n\n\
                     Ask the single most valuable follow-up question."
                ))
                .await?;
            findings.push(Finding {
                hypothesis,
                research,
                confidence,
                follow_up,
            });
        }

        let findings_text = findings
            .iter()
            .map(|f| format!("- {} (confidence {:.1}): {}", f.hypothesis, f.confidence, f.research))
            .collect::<Vec<_>>()
            .join("\n");
        let connections = self
            .llm
            .generate(&format!(
                "Topic: {topic}\n\nFindings:\n{findings_text}\n\n\
                 Identify connections between the findings and what they \
                 suggest as the most promising direction to explore next."
            ))
            .await?;

        Ok(ExplorationOutcome {
            topic: topic.to_string(),
            findings,
            connections,
        })
    }
}

/// Parse a `CONFIDENCE: x` marker; defaults to 0.5.
fn extract_confidence(text: &str) -> f32 {
    for line in text.lines().rev() {
        if let Some(rest) = line.trim().strip_prefix("CONFIDENCE:") {
            if let Ok(value) = rest.trim().parse::<f32>() {
                return value.clamp(0.0, 1.0);
            }
        }
    }
    0.5
}

/// Demo: explore the effect of caching on service latency.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let explorer = Explorer::new(llm.clone()).with_max_hypotheses(2);
    let outcome = explorer
        .explore("the effect of caching on web service latency")
        .await?;

    let mut report = DemoReport::new("exploration");
    report.push("Topic", &outcome.topic);
    for (i, finding) in outcome.findings.iter().enumerate() {
        report.push(
            format!("Hypothesis {} (confidence {:.1})", i + 1, finding.confidence),
            format!(
                "{}\nResearch: {}\nFollow-up: {}",
                finding.hypothesis, finding.research, finding.follow_up
            ),
        );
    }
    report.push("Connections", &outcome.connections);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::scripted;

    #[tokio::test]
    async fn hypotheses_parsed_and_capped() {
        let llm = scripted(&["1. First\n2. Second\n3. Third\n4. Fourth"]);
        let explorer = Explorer::new(llm).with_max_hypotheses(2);
        let hypotheses = explorer.generate_hypotheses("topic").await.unwrap();
        assert_eq!(hypotheses, vec!["First", "Second"]);
    }

    #[tokio::test]
    async fn research_extracts_confidence() {
        let llm = scripted(&["Evidence is strong.\nCONFIDENCE: 0.8"]);
        let explorer = Explorer::new(llm);
        let (research, confidence) = explorer.research("h").await.unwrap();
        assert_eq!(research, "Evidence is strong.");
        assert!((confidence - 0.8).abs() < 0.01);
    }

    #[tokio::test]
    async fn missing_confidence_defaults() {
        let llm = scripted(&["Some evidence."]);
        let explorer = Explorer::new(llm);
        let (_, confidence) = explorer.research("h").await.unwrap();
        assert_eq!(confidence, 0.5);
    }

    #[tokio::test]
    async fn full_exploration_flow() {
        let llm = scripted(&[
            "1. Caching reduces median latency\n2. Caching hurts tail latency",
            "Median drops sharply.\nCONFIDENCE: 0.9",
            "What cache hit rate is needed?",
            "Tail latency can spike on misses.\nCONFIDENCE: 0.6",
            "How do cold starts interact?",
            "Both findings point at hit-rate as the lever.",
        ]);
        let explorer = Explorer::new(llm).with_max_hypotheses(2);
        let outcome = explorer.explore("caching").await.unwrap();
        assert_eq!(outcome.findings.len(), 2);
        assert!(outcome.connections.contains("hit-rate"));
    }
}
