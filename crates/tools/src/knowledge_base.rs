//! Knowledge base tool — canned fact lookup by topic.
//!
//! The narrow cousin of [`crate::SearchTool`]: exact-topic facts the ReAct
//! and metacognition demos rely on, keyed by a normalized topic string.

use agentry_core::error::ToolError;
use agentry_core::tool::{Tool, ToolOutcome};
use async_trait::async_trait;

pub struct KnowledgeBaseTool;

const FACTS: [(&str, &str); 6] = [
    (
        "rust release year",
        "Rust 1.0 was released on May 15, 2015.",
    ),
    (
        "python creator",
        "Python was created by Guido van Rossum.",
    ),
    (
        "boiling point of water",
        "Water boils at 100°C (212°F) at standard atmospheric pressure.",
    ),
    (
        "largest planet",
        "Jupiter is the largest planet in the Solar System.",
    ),
    (
        "dna bases",
        "DNA uses four bases: adenine, thymine, guanine and cytosine.",
    ),
    (
        "olympics frequency",
        "The Summer Olympics are held every four years.",
    ),
];

#[async_trait]
impl Tool for KnowledgeBaseTool {
    fn name(&self) -> &str {
        "knowledge_base"
    }

    fn description(&self) -> &str {
        "Look up a specific fact by topic, e.g. \"boiling point of water\"."
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let topic = arguments["topic"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'topic' argument".into()))?;

        let normalized = topic.to_lowercase();
        let fact = FACTS
            .iter()
            .find(|(key, _)| normalized.contains(key) || key.contains(normalized.as_str()))
            .map(|(_, fact)| *fact);

        match fact {
            Some(fact) => Ok(ToolOutcome::text(fact)),
            None => Ok(ToolOutcome {
                success: true,
                output: format!("No fact on record for '{topic}'."),
                data: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn known_topic() {
        let tool = KnowledgeBaseTool;
        let result = tool
            .execute(serde_json::json!({"topic": "boiling point of water"}))
            .await
            .unwrap();
        assert!(result.output.contains("100°C"));
    }

    #[tokio::test]
    async fn partial_topic_match() {
        let tool = KnowledgeBaseTool;
        let result = tool
            .execute(serde_json::json!({"topic": "what is the largest planet?"}))
            .await
            .unwrap();
        assert!(result.output.contains("Jupiter"));
    }

    #[tokio::test]
    async fn unknown_topic() {
        let tool = KnowledgeBaseTool;
        let result = tool
            .execute(serde_json::json!({"topic": "warp drive"}))
            .await
            .unwrap();
        assert!(result.output.contains("No fact on record"));
    }
}
