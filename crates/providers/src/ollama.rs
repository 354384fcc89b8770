//! Ollama local provider implementation.
//!
//! Talks to a local Ollama daemon over its native HTTP API:
//! `/api/generate` for completion, `/api/tags` for the liveness probe the
//! auto-detection path uses.

use agentry_core::error::ProviderError;
use agentry_core::message::{Message, Role};
use agentry_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Local Ollama provider.
pub struct OllamaProvider {
    name: String,
    base_url: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    /// Create a provider against the default local daemon.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300)) // local models can be slow
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: "ollama".into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Check whether a daemon is answering at `base_url` (2s budget).
    pub async fn probe(base_url: &str) -> bool {
        let client = match reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(2))
            .build()
        {
            Ok(c) => c,
            Err(_) => return false,
        };
        let url = format!("{}/api/tags", base_url.trim_end_matches('/'));
        matches!(client.get(&url).send().await, Ok(resp) if resp.status().is_success())
    }

    /// Flatten a message list into a single prompt string.
    ///
    /// `/api/generate` takes one prompt, which matches how the catalogue
    /// drives every provider; multi-message histories are rendered as a
    /// plain dialogue.
    fn flatten_prompt(messages: &[Message]) -> String {
        if messages.len() == 1 {
            return messages[0].content.clone();
        }
        messages
            .iter()
            .map(|m| match m.role {
                Role::System => format!("[system] {}", m.content),
                Role::User => format!("[user] {}", m.content),
                Role::Assistant => format!("[assistant] {}", m.content),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);

        let body = serde_json::json!({
            "model": request.model,
            "prompt": Self::flatten_prompt(&request.messages),
            "stream": false,
            "options": {
                "temperature": request.temperature,
            },
        });

        debug!(provider = "ollama", model = %request.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Ollama API error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_resp: OllamaResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse Ollama response: {e}"),
            })?;

        let usage = match (api_resp.prompt_eval_count, api_resp.eval_count) {
            (Some(p), Some(c)) => Some(Usage {
                prompt_tokens: p,
                completion_tokens: c,
                total_tokens: p + c,
            }),
            _ => None,
        };

        Ok(ProviderResponse {
            message: Message::assistant(api_resp.response),
            usage,
            model: api_resp.model,
        })
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(Self::probe(&self.base_url).await)
    }
}

// ── API response types ──────────────────────────────────────────────────────

#[derive(Deserialize)]
struct OllamaResponse {
    model: String,
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_message_passes_through() {
        let messages = vec![Message::user("Hello!")];
        assert_eq!(OllamaProvider::flatten_prompt(&messages), "Hello!");
    }

    #[test]
    fn history_is_rendered_as_dialogue() {
        let messages = vec![
            Message::system("be brief"),
            Message::user("hi"),
            Message::assistant("hello"),
        ];
        let prompt = OllamaProvider::flatten_prompt(&messages);
        assert!(prompt.contains("[system] be brief"));
        assert!(prompt.contains("[user] hi"));
        assert!(prompt.contains("[assistant] hello"));
    }

    #[test]
    fn response_parsing() {
        let raw = serde_json::json!({
            "model": "llama3.2",
            "response": "Hi there",
            "prompt_eval_count": 5,
            "eval_count": 3,
            "done": true
        });
        let parsed: OllamaResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.response, "Hi there");
        assert_eq!(parsed.eval_count, Some(3));
    }
}
