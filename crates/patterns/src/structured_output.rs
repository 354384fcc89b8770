//! Structured output — typed records parsed from model JSON.
//!
//! The model is asked for JSON matching a serde type. A malformed reply gets
//! exactly one corrective retry with the parse error quoted back; a second
//! failure surfaces as a typed error instead of a silent default.

use crate::report::DemoReport;
use agentry_core::error::PatternError;
use agentry_core::{LlmClient, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A validated user profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub name: String,
    pub age: u8,
    pub email: String,
    #[serde(default)]
    pub interests: Vec<String>,
}

impl UserProfile {
    /// Field checks past what serde enforces.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".into());
        }
        if !(13..=120).contains(&self.age) {
            return Err(format!("age {} out of range 13-120", self.age));
        }
        if !self.email.contains('@') {
            return Err(format!("email '{}' is not valid", self.email));
        }
        Ok(())
    }
}

/// A validated task record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskRecord {
    pub title: String,
    pub priority: String,
    pub estimated_hours: f32,
}

impl TaskRecord {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".into());
        }
        if !["low", "medium", "high"].contains(&self.priority.as_str()) {
            return Err(format!("priority '{}' not one of low/medium/high", self.priority));
        }
        if self.estimated_hours <= 0.0 {
            return Err("estimated_hours must be positive".into());
        }
        Ok(())
    }
}

/// Pull the first JSON object out of a reply that may carry prose or fences.
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// The structured-output agent.
pub struct StructuredAgent {
    llm: LlmClient,
}

impl StructuredAgent {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    /// Ask for JSON matching `T`, with one corrective retry on failure.
    pub async fn generate<T: DeserializeOwned>(
        &self,
        instruction: &str,
        schema_hint: &str,
    ) -> Result<T> {
        let prompt = format!(
            "{instruction}\n\nRespond with a single JSON object only, matching:\n{schema_hint}"
        );
        let first = self.llm.generate(&prompt).await?;

        match parse::<T>(&first) {
            Ok(value) => Ok(value),
            Err(parse_error) => {
                warn!(%parse_error, "first parse failed, retrying once");
                let retry_prompt = format!(
                    "{instruction}\n\nYour previous reply could not be parsed:\n{first}\n\n\
                     Parse error: {parse_error}\n\n\
                     Respond again with ONLY a valid JSON object matching:\n{schema_hint}"
                );
                let second = self.llm.generate(&retry_prompt).await?;
                parse::<T>(&second).map_err(|detail| {
                    PatternError::MalformedOutput {
                        context: "structured output after retry".into(),
                        detail,
                    }
                    .into()
                })
            }
        }
    }
}

fn parse<T: DeserializeOwned>(reply: &str) -> std::result::Result<T, String> {
    let json = extract_json(reply).ok_or_else(|| "no JSON object found".to_string())?;
    serde_json::from_str::<T>(json).map_err(|e| e.to_string())
}

/// Demo: a profile, a task, and a batch validation sweep.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let agent = StructuredAgent::new(llm.clone());
    let mut report = DemoReport::new("structured-output");

    let profile: UserProfile = agent
        .generate(
            "Create a plausible user profile for a developer community member.",
            r#"{"name": string, "age": number, "email": string, "interests": [string]}"#,
        )
        .await?;
    debug!(?profile, "profile parsed");
    let validation = match profile.validate() {
        Ok(()) => "valid".to_string(),
        Err(e) => format!("invalid: {e}"),
    };
    report.push(
        "User profile",
        format!("{}\nvalidation: {validation}", serde_json::to_string_pretty(&profile)?),
    );

    let task: TaskRecord = agent
        .generate(
            "Create a task record for fixing a flaky integration test.",
            r#"{"title": string, "priority": "low"|"medium"|"high", "estimated_hours": number}"#,
        )
        .await?;
    let validation = match task.validate() {
        Ok(()) => "valid".to_string(),
        Err(e) => format!("invalid: {e}"),
    };
    report.push(
        "Task record",
        format!("{}\nvalidation: {validation}", serde_json::to_string_pretty(&task)?),
    );

    // Batch validation over locally constructed records
    let batch = vec![
        UserProfile {
            name: "Ada".into(),
            age: 30,
            email: "ada@example.com".into(),
            interests: vec!["compilers".into()],
        },
        UserProfile {
            name: "".into(),
            age: 200,
            email: "nope".into(),
            interests: vec![],
        },
    ];
    let lines = batch
        .iter()
        .map(|p| match p.validate() {
            Ok(()) => format!("{}: ok", if p.name.is_empty() { "(unnamed)" } else { &p.name }),
            Err(e) => format!("{}: rejected — {e}", if p.name.is_empty() { "(unnamed)" } else { &p.name }),
        })
        .collect::<Vec<_>>()
        .join("\n");
    report.push("Batch validation", lines);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::scripted;

    #[test]
    fn json_extracted_from_prose_and_fences() {
        let reply = "Here you go:\n```json\n{\"a\": 1}\n```";
        assert_eq!(extract_json(reply), Some("{\"a\": 1}"));
        assert!(extract_json("no json at all").is_none());
    }

    #[tokio::test]
    async fn valid_json_parses_first_try() {
        let llm = scripted(&[r#"{"name": "Ada", "age": 30, "email": "ada@example.com"}"#]);
        let agent = StructuredAgent::new(llm);
        let profile: UserProfile = agent.generate("make a profile", "{...}").await.unwrap();
        assert_eq!(profile.name, "Ada");
        assert!(profile.interests.is_empty()); // serde default
        assert!(profile.validate().is_ok());
    }

    #[tokio::test]
    async fn malformed_reply_gets_one_retry() {
        let llm = scripted(&[
            "Sure! The profile is name=Ada age=30",
            r#"{"name": "Ada", "age": 30, "email": "ada@example.com"}"#,
        ]);
        let agent = StructuredAgent::new(llm);
        let profile: UserProfile = agent.generate("make a profile", "{...}").await.unwrap();
        assert_eq!(profile.name, "Ada");
    }

    #[tokio::test]
    async fn second_failure_is_a_typed_error() {
        let llm = scripted(&["not json", "still not json"]);
        let agent = StructuredAgent::new(llm);
        let result: Result<UserProfile> = agent.generate("make a profile", "{...}").await;
        let err = result.unwrap_err();
        assert!(err.to_string().contains("could not be parsed"));
    }

    #[test]
    fn profile_validation_rules() {
        let mut p = UserProfile {
            name: "Ada".into(),
            age: 30,
            email: "ada@example.com".into(),
            interests: vec![],
        };
        assert!(p.validate().is_ok());
        p.age = 5;
        assert!(p.validate().is_err());
        p.age = 30;
        p.email = "bad".into();
        assert!(p.validate().is_err());
    }

    #[test]
    fn task_validation_rules() {
        let t = TaskRecord {
            title: "Fix test".into(),
            priority: "urgent".into(),
            estimated_hours: 2.0,
        };
        assert!(t.validate().is_err()); // bad priority
    }
}
