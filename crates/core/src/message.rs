//! Message and transcript domain types.
//!
//! These are the value objects that flow through every pattern demo:
//! a prompt goes in as a user message, the provider answers with an
//! assistant message, and engines that keep history hold a `Transcript`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user (or the engine speaking on its behalf)
    User,
    /// The model
    Assistant,
    /// System instructions
    System,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::System => write!(f, "system"),
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// An ordered message log kept by the stateful demos.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    /// Ordered messages
    pub messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// The most recent `limit` messages, oldest first.
    pub fn recent(&self, limit: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(limit);
        &self.messages[start..]
    }

    /// Render the recent window as `role: content` lines for prompt context.
    pub fn recent_context(&self, limit: usize) -> String {
        self.recent(limit)
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Rough token count estimate (4 chars ≈ 1 token).
    pub fn estimated_tokens(&self) -> usize {
        self.messages.iter().map(|m| m.content.len() / 4).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("Hello, agent!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello, agent!");
    }

    #[test]
    fn transcript_recent_window() {
        let mut t = Transcript::new();
        for i in 0..10 {
            t.push(Message::user(format!("message {i}")));
        }
        let recent = t.recent(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].content, "message 7");
        assert_eq!(recent[2].content, "message 9");
    }

    #[test]
    fn recent_window_smaller_than_limit() {
        let mut t = Transcript::new();
        t.push(Message::user("only one"));
        assert_eq!(t.recent(5).len(), 1);
    }

    #[test]
    fn recent_context_renders_roles() {
        let mut t = Transcript::new();
        t.push(Message::user("hi"));
        t.push(Message::assistant("hello"));
        let ctx = t.recent_context(5);
        assert!(ctx.contains("user: hi"));
        assert!(ctx.contains("assistant: hello"));
    }

    #[test]
    fn message_serialization_roundtrip() {
        let msg = Message::assistant("Test message");
        let json = serde_json::to_string(&msg).unwrap();
        let deserialized: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.content, "Test message");
        assert_eq!(deserialized.role, Role::Assistant);
    }

    #[test]
    fn token_estimate() {
        let mut t = Transcript::new();
        // 20 chars ≈ 5 tokens
        t.push(Message::user("12345678901234567890"));
        assert_eq!(t.estimated_tokens(), 5);
    }
}
