//! Memory management — rolling history window plus extracted preferences.
//!
//! Every turn the agent: extracts any `PREFERENCE: key=value` fact from the
//! user input, embeds the recent conversation window and stored preferences
//! into its prompt, and records both sides of the exchange.

use crate::report::DemoReport;
use agentry_core::message::{Message, Transcript};
use agentry_core::{LlmClient, Result};
use std::collections::BTreeMap;
use tracing::debug;

/// Conversation memory: history plus preference facts.
#[derive(Debug, Default)]
pub struct ConversationMemory {
    pub transcript: Transcript,
    pub preferences: BTreeMap<String, String>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remember_preference(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.preferences.insert(key.into(), value.into());
    }

    /// Render stored preferences for prompts.
    pub fn preferences_context(&self) -> String {
        if self.preferences.is_empty() {
            return "No preferences stored yet.".into();
        }
        self.preferences
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Session summary counts.
    pub fn summary(&self) -> (usize, usize) {
        (self.transcript.len(), self.preferences.len())
    }
}

/// Parse a `PREFERENCE: key=value` line out of an extraction response.
pub fn parse_preference(response: &str) -> Option<(String, String)> {
    let idx = response.find("PREFERENCE:")?;
    let rest = response[idx + "PREFERENCE:".len()..].lines().next()?.trim();
    let (key, value) = rest.split_once('=')?;
    let key = key.trim();
    let value = value.trim();
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key.to_string(), value.to_string()))
}

/// One conversational turn's outcome.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub user_input: String,
    pub stored_preference: Option<(String, String)>,
    pub response: String,
}

/// The memory-aware chat agent.
pub struct MemoryAgent {
    llm: LlmClient,
    window: usize,
}

impl MemoryAgent {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm, window: 5 }
    }

    /// Set the recent-context window size.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window.max(1);
        self
    }

    /// Try to extract a preference from the user input.
    pub async fn extract_preference(&self, user_input: &str) -> Result<Option<(String, String)>> {
        let prompt = format!(
            "Analyze this user input for any preferences or personal information:\n\
             {user_input}\n\n\
             If you find a preference (like favorite color or language), respond with:\n\
             PREFERENCE: key=value\n\
             If none, respond with: NO_PREFERENCES"
        );
        let response = self.llm.generate(&prompt).await?;
        Ok(parse_preference(&response))
    }

    /// Run one turn: extract, respond with memory context, record.
    pub async fn turn(
        &self,
        memory: &mut ConversationMemory,
        user_input: &str,
    ) -> Result<TurnOutcome> {
        let stored_preference = self.extract_preference(user_input).await?;
        if let Some((key, value)) = &stored_preference {
            debug!(key = %key, "storing preference");
            memory.remember_preference(key.clone(), value.clone());
        }

        memory.transcript.push(Message::user(user_input));

        let prompt = format!(
            "You are a helpful assistant with access to conversation history \
             and user preferences.\n\n\
             Recent conversation:\n{}\n\n\
             User preferences:\n{}\n\n\
             Current user message: {user_input}\n\n\
             Respond naturally, acknowledging remembered preferences when relevant.",
            memory.transcript.recent_context(self.window),
            memory.preferences_context()
        );
        let response = self.llm.generate(&prompt).await?;
        memory.transcript.push(Message::assistant(&response));

        Ok(TurnOutcome {
            user_input: user_input.to_string(),
            stored_preference,
            response,
        })
    }
}

/// Demo: a short scripted conversation that accumulates preferences.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let agent = MemoryAgent::new(llm.clone());
    let mut memory = ConversationMemory::new();

    let conversation = [
        "Hi! I'm learning Rust programming.",
        "I prefer code examples over theory.",
        "Can you help me with error handling?",
    ];

    let mut report = DemoReport::new("memory-management");
    for (i, user_input) in conversation.iter().enumerate() {
        let outcome = agent.turn(&mut memory, user_input).await?;
        let mut body = format!("User: {user_input}\nAssistant: {}", outcome.response);
        if let Some((k, v)) = &outcome.stored_preference {
            body.push_str(&format!("\n[stored preference {k} = {v}]"));
        }
        report.push(format!("Turn {}", i + 1), body);
    }

    let (messages, prefs) = memory.summary();
    report.push(
        "Memory summary",
        format!(
            "Total messages: {messages}\nStored preferences: {prefs}\n{}",
            memory.preferences_context()
        ),
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{scripted, scripted_with_handle};

    #[test]
    fn preference_line_parses() {
        assert_eq!(
            parse_preference("PREFERENCE: language=Rust"),
            Some(("language".into(), "Rust".into()))
        );
        assert_eq!(parse_preference("NO_PREFERENCES"), None);
        assert_eq!(parse_preference("PREFERENCE: =broken"), None);
    }

    #[test]
    fn preference_parsed_mid_response() {
        let response = "Found one.\nPREFERENCE: style = examples first\ndone";
        assert_eq!(
            parse_preference(response),
            Some(("style".into(), "examples first".into()))
        );
    }

    #[tokio::test]
    async fn turn_stores_preference_and_history() {
        let llm = scripted(&["PREFERENCE: language=Rust", "Great choice!"]);
        let agent = MemoryAgent::new(llm);
        let mut memory = ConversationMemory::new();

        let outcome = agent.turn(&mut memory, "I prefer Rust").await.unwrap();
        assert_eq!(
            outcome.stored_preference,
            Some(("language".into(), "Rust".into()))
        );
        assert_eq!(memory.preferences.get("language").unwrap(), "Rust");
        assert_eq!(memory.transcript.len(), 2); // user + assistant
    }

    #[tokio::test]
    async fn prompt_embeds_memory_context() {
        let (llm, provider) = scripted_with_handle(&[
            "PREFERENCE: language=Rust",
            "Noted!",
            "NO_PREFERENCES",
            "Here is an example in Rust.",
        ]);
        let agent = MemoryAgent::new(llm);
        let mut memory = ConversationMemory::new();

        agent.turn(&mut memory, "I prefer Rust").await.unwrap();
        agent.turn(&mut memory, "Show me an example").await.unwrap();

        // The second turn's chat prompt (4th call) must carry the preference
        // and the earlier exchange.
        let prompts = provider.prompts();
        assert!(prompts[3].contains("language: Rust"));
        assert!(prompts[3].contains("I prefer Rust"));
    }

    #[test]
    fn preferences_context_when_empty() {
        let memory = ConversationMemory::new();
        assert!(memory.preferences_context().contains("No preferences"));
    }
}
