//! Parallelization — fan independent LLM calls out, collect results.
//!
//! The one genuinely concurrent pattern in the catalogue: per-topic prompts
//! have no ordering requirement and share no state, so they fan out as tokio
//! tasks and fan back in as they complete. The demo runs the same topics
//! sequentially first to make the contrast visible.

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::debug;

/// One analyzed topic.
#[derive(Debug, Clone)]
pub struct TopicResult {
    pub topic: String,
    pub analysis: String,
}

/// Results of a fan-out run.
#[derive(Debug, Clone)]
pub struct FanOutResult {
    /// Results in completion order.
    pub results: Vec<TopicResult>,
    pub elapsed_ms: u128,
}

fn topic_prompt(topic: &str) -> String {
    format!("Give me 3 key facts about {topic}")
}

/// Analyze topics one at a time.
pub async fn run_sequential(llm: &LlmClient, topics: &[&str]) -> Result<FanOutResult> {
    let start = Instant::now();
    let mut results = Vec::with_capacity(topics.len());
    for topic in topics {
        let analysis = llm.generate(&topic_prompt(topic)).await?;
        results.push(TopicResult {
            topic: topic.to_string(),
            analysis,
        });
    }
    Ok(FanOutResult {
        results,
        elapsed_ms: start.elapsed().as_millis(),
    })
}

/// Analyze topics concurrently; results arrive in completion order.
pub async fn run_parallel(llm: &LlmClient, topics: &[&str]) -> Result<FanOutResult> {
    let start = Instant::now();
    let mut set = JoinSet::new();

    for topic in topics {
        let llm = llm.clone();
        let topic = topic.to_string();
        set.spawn(async move {
            let analysis = llm.generate(&topic_prompt(&topic)).await?;
            Ok::<TopicResult, agentry_core::Error>(TopicResult { topic, analysis })
        });
    }

    let mut results = Vec::with_capacity(topics.len());
    while let Some(joined) = set.join_next().await {
        let result = joined
            .map_err(|e| agentry_core::Error::Internal(format!("task panicked: {e}")))??;
        debug!(topic = %result.topic, "topic completed");
        results.push(result);
    }

    Ok(FanOutResult {
        results,
        elapsed_ms: start.elapsed().as_millis(),
    })
}

/// Demo: analyze three topics sequentially, then in parallel.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let topics = ["Python", "AI", "Machine Learning"];

    let sequential = run_sequential(llm, &topics).await?;
    let parallel = run_parallel(llm, &topics).await?;

    let mut report = DemoReport::new("parallelization");
    report.push(
        format!("Sequential ({} ms)", sequential.elapsed_ms),
        sequential
            .results
            .iter()
            .map(|r| format!("{}: {}", r.topic, r.analysis))
            .collect::<Vec<_>>()
            .join("\n"),
    );
    report.push(
        format!("Parallel ({} ms, completion order)", parallel.elapsed_ms),
        parallel
            .results
            .iter()
            .map(|r| format!("{}: {}", r.topic, r.analysis))
            .collect::<Vec<_>>()
            .join("\n"),
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::scripted;

    #[tokio::test]
    async fn sequential_preserves_topic_order() {
        let llm = scripted(&["facts about A", "facts about B"]);
        let result = run_sequential(&llm, &["A", "B"]).await.unwrap();
        assert_eq!(result.results[0].topic, "A");
        assert_eq!(result.results[1].topic, "B");
    }

    #[tokio::test]
    async fn parallel_returns_all_topics() {
        let llm = scripted(&["r1", "r2", "r3"]);
        let result = run_parallel(&llm, &["A", "B", "C"]).await.unwrap();
        assert_eq!(result.results.len(), 3);

        let mut topics: Vec<&str> = result.results.iter().map(|r| r.topic.as_str()).collect();
        topics.sort();
        assert_eq!(topics, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn demo_renders_both_modes() {
        // 3 sequential + 3 parallel calls
        let llm = scripted(&["s1", "s2", "s3", "p1", "p2", "p3"]);
        let report = demo(&llm).await.unwrap();
        let rendered = report.render();
        assert!(rendered.contains("Sequential"));
        assert!(rendered.contains("Parallel"));
    }
}
