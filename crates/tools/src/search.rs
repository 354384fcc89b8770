//! Search tool — keyword lookup over a canned corpus.
//!
//! Stands in for a web search API. The corpus covers the subjects the
//! demos ask about; queries with no match return an honest "no results".

use agentry_core::error::ToolError;
use agentry_core::tool::{Tool, ToolOutcome};
use async_trait::async_trait;

pub struct SearchTool;

const CORPUS: [(&str, &str); 8] = [
    (
        "rust",
        "Rust is a systems programming language focused on safety and performance, \
         first released in 2015 and governed by the Rust Foundation.",
    ),
    (
        "python",
        "Python is a high-level, general-purpose programming language created by \
         Guido van Rossum and first released in 1991.",
    ),
    (
        "eiffel tower",
        "The Eiffel Tower is a wrought-iron lattice tower in Paris, completed in \
         1889 and standing 330 metres tall.",
    ),
    (
        "mount everest",
        "Mount Everest is Earth's highest mountain above sea level at 8,849 metres, \
         located in the Himalayas on the Nepal-China border.",
    ),
    (
        "photosynthesis",
        "Photosynthesis is the process by which plants convert light energy into \
         chemical energy, producing oxygen as a by-product.",
    ),
    (
        "machine learning",
        "Machine learning is a field of AI concerned with algorithms that improve \
         through experience, spanning supervised, unsupervised and reinforcement methods.",
    ),
    (
        "speed of light",
        "The speed of light in vacuum is exactly 299,792,458 metres per second.",
    ),
    (
        "capital of france",
        "Paris is the capital and largest city of France, with about 2.1 million \
         residents in the city proper.",
    ),
];

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Search for factual information on a topic. Returns a short snippet."
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;

        match find(query) {
            Some(snippet) => Ok(ToolOutcome::text(snippet).with_data(serde_json::json!({
                "query": query,
                "found": true,
            }))),
            None => Ok(ToolOutcome {
                success: true,
                output: format!("No results found for '{query}'."),
                data: Some(serde_json::json!({"query": query, "found": false})),
            }),
        }
    }
}

/// Best-match snippet for a query, by keyword overlap with corpus subjects.
pub fn find(query: &str) -> Option<String> {
    let query_lower = query.to_lowercase();
    let query_words: Vec<&str> = query_lower.split_whitespace().collect();

    let mut best: Option<(usize, &str)> = None;
    for (subject, snippet) in CORPUS {
        let overlap = subject
            .split_whitespace()
            .filter(|w| query_words.contains(w) || query_lower.contains(subject))
            .count();
        if overlap > 0 {
            match best {
                Some((score, _)) if score >= overlap => {}
                _ => best = Some((overlap, snippet)),
            }
        }
    }
    best.map(|(_, snippet)| snippet.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn finds_known_subject() {
        let tool = SearchTool;
        let result = tool
            .execute(serde_json::json!({"query": "how tall is the Eiffel Tower"}))
            .await
            .unwrap();
        assert!(result.output.contains("330 metres"));
    }

    #[tokio::test]
    async fn no_results_is_not_an_error() {
        let tool = SearchTool;
        let result = tool
            .execute(serde_json::json!({"query": "zorbulation frequency"}))
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.output.contains("No results"));
        assert_eq!(result.data.unwrap()["found"], false);
    }

    #[test]
    fn case_insensitive_matching() {
        assert!(find("MOUNT EVEREST height").unwrap().contains("8,849"));
    }
}
