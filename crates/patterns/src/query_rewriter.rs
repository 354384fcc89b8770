//! Query rewriter — analyse, expand and rewrite queries for retrieval.
//!
//! Four operations over a query: intent analysis, expansion into variants,
//! clarification when ambiguous, and a history-aware contextual rewrite.
//! The pipeline runs them in order and keeps rewrite statistics.

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use tracing::debug;

/// Analysis of one query.
#[derive(Debug, Clone)]
pub struct QueryAnalysis {
    pub intent: String,
    pub ambiguous: bool,
}

/// Output of a full rewrite pass.
#[derive(Debug, Clone)]
pub struct RewriteOutcome {
    pub original: String,
    pub analysis: QueryAnalysis,
    pub variants: Vec<String>,
    pub clarification: Option<String>,
    pub rewritten: String,
}

/// Pipeline statistics.
#[derive(Debug, Clone, Default)]
pub struct RewriteStats {
    pub processed: usize,
    pub ambiguous: usize,
    pub total_variants: usize,
}

/// The rewriter.
pub struct QueryRewriter {
    llm: LlmClient,
    history: Vec<String>,
    stats: RewriteStats,
}

impl QueryRewriter {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            history: Vec::new(),
            stats: RewriteStats::default(),
        }
    }

    pub fn stats(&self) -> &RewriteStats {
        &self.stats
    }

    /// Classify intent and flag ambiguity (AMBIGUOUS/CLEAR protocol).
    pub async fn analyze(&self, query: &str) -> Result<QueryAnalysis> {
        let response = self
            .llm
            .generate(&format!(
                "Analyze this search query.\nQuery: {query}\n\n\
                 Reply with two lines:\n\
                 INTENT: <one short phrase>\n\
                 CLARITY: AMBIGUOUS or CLEAR"
            ))
            .await?;

        let intent = response
            .lines()
            .find_map(|l| l.trim().strip_prefix("INTENT:"))
            .unwrap_or("unknown")
            .trim()
            .to_string();
        let ambiguous = response.to_uppercase().contains("AMBIGUOUS");
        Ok(QueryAnalysis { intent, ambiguous })
    }

    /// Expand into search variants (numbered-list protocol).
    pub async fn expand(&self, query: &str) -> Result<Vec<String>> {
        let response = self
            .llm
            .generate(&format!(
                "Generate 3 alternative phrasings of this search query that \
                 could surface different relevant results.\nQuery: {query}\n\
                 Reply with a numbered list only."
            ))
            .await?;

        Ok(response
            .lines()
            .filter_map(|line| {
                let trimmed = line.trim();
                trimmed
                    .split_once('.')
                    .filter(|(n, _)| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
                    .map(|(_, rest)| rest.trim().to_string())
                    .filter(|rest| !rest.is_empty())
            })
            .collect())
    }

    /// Ask what clarification an ambiguous query needs.
    pub async fn clarify(&self, query: &str) -> Result<String> {
        Ok(self
            .llm
            .generate(&format!(
                "This query is ambiguous: {query}\n\
                 What single clarifying question would most narrow it down?"
            ))
            .await?)
    }

    /// Rewrite with conversation history folded in.
    pub async fn rewrite_with_history(&self, query: &str) -> Result<String> {
        let history = if self.history.is_empty() {
            "(no prior queries)".to_string()
        } else {
            self.history.join("\n")
        };
        Ok(self
            .llm
            .generate(&format!(
                "Previous queries in this session:\n{history}\n\n\
                 Rewrite the current query to be self-contained and optimized \
                 for keyword retrieval:\n{query}\n\n\
                 Reply with the rewritten query only."
            ))
            .await?)
    }

    /// Run the full pass and record the query into history.
    pub async fn process(&mut self, query: &str) -> Result<RewriteOutcome> {
        let analysis = self.analyze(query).await?;
        debug!(intent = %analysis.intent, ambiguous = analysis.ambiguous, "analyzed");

        let variants = self.expand(query).await?;
        let clarification = if analysis.ambiguous {
            Some(self.clarify(query).await?)
        } else {
            None
        };
        let rewritten = self.rewrite_with_history(query).await?;

        self.stats.processed += 1;
        if analysis.ambiguous {
            self.stats.ambiguous += 1;
        }
        self.stats.total_variants += variants.len();
        self.history.push(query.to_string());

        Ok(RewriteOutcome {
            original: query.to_string(),
            analysis,
            variants,
            clarification,
            rewritten,
        })
    }
}

/// Demo: a clear query followed by an ambiguous follow-up.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let mut rewriter = QueryRewriter::new(llm.clone());

    let queries = ["rust async runtime comparison", "which one is faster"];

    let mut report = DemoReport::new("query-rewriter");
    for query in queries {
        let outcome = rewriter.process(query).await?;
        let mut body = format!(
            "Intent: {}\nAmbiguous: {}\nVariants:\n{}",
            outcome.analysis.intent,
            outcome.analysis.ambiguous,
            outcome
                .variants
                .iter()
                .map(|v| format!("  - {v}"))
                .collect::<Vec<_>>()
                .join("\n")
        );
        if let Some(clarification) = &outcome.clarification {
            body.push_str(&format!("\nClarification needed: {clarification}"));
        }
        body.push_str(&format!("\nRewritten: {}", outcome.rewritten));
        report.push(format!("Query: {query}"), body);
    }

    let stats = rewriter.stats();
    report.push(
        "Statistics",
        format!(
            "processed: {}  ambiguous: {}  variants generated: {}",
            stats.processed, stats.ambiguous, stats.total_variants
        ),
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{scripted, scripted_with_handle};

    #[tokio::test]
    async fn clear_query_skips_clarification() {
        let llm = scripted(&[
            "INTENT: compare async runtimes\nCLARITY: CLEAR",
            "1. tokio vs async-std benchmark\n2. rust executor performance\n3. async runtime latency",
            "rust async runtime comparison benchmark",
        ]);
        let mut rewriter = QueryRewriter::new(llm);
        let outcome = rewriter.process("rust async runtime comparison").await.unwrap();
        assert!(!outcome.analysis.ambiguous);
        assert!(outcome.clarification.is_none());
        assert_eq!(outcome.variants.len(), 3);
    }

    #[tokio::test]
    async fn ambiguous_query_gets_clarification() {
        let llm = scripted(&[
            "INTENT: unclear comparison\nCLARITY: AMBIGUOUS",
            "1. variant a\n2. variant b",
            "Faster at what workload?",
            "which async runtime is faster for io-bound work",
        ]);
        let mut rewriter = QueryRewriter::new(llm);
        let outcome = rewriter.process("which one is faster").await.unwrap();
        assert!(outcome.analysis.ambiguous);
        assert!(outcome.clarification.unwrap().contains("workload"));
        assert_eq!(rewriter.stats().ambiguous, 1);
    }

    #[tokio::test]
    async fn history_appears_in_rewrite_prompt() {
        let (llm, provider) = scripted_with_handle(&[
            "INTENT: a\nCLARITY: CLEAR",
            "1. v",
            "first rewritten",
            "INTENT: b\nCLARITY: CLEAR",
            "1. v2",
            "second rewritten",
        ]);
        let mut rewriter = QueryRewriter::new(llm);
        rewriter.process("first query").await.unwrap();
        rewriter.process("second query").await.unwrap();

        // The second rewrite prompt (6th call) must include the first query.
        assert!(provider.prompts()[5].contains("first query"));
    }

    #[tokio::test]
    async fn missing_intent_line_defaults() {
        let llm = scripted(&["CLARITY: CLEAR"]);
        let rewriter = QueryRewriter::new(llm);
        let analysis = rewriter.analyze("q").await.unwrap();
        assert_eq!(analysis.intent, "unknown");
    }
}
