//! The single-prompt LLM façade every pattern engine is built on.
//!
//! `LlmClient` bundles a provider with a model name and default temperature
//! and exposes `generate(prompt) -> String`. Engines that need message
//! history or a per-call temperature use [`LlmClient::complete`] and
//! [`LlmClient::generate_at`].

use crate::error::ProviderError;
use crate::message::Message;
use crate::provider::{Provider, ProviderRequest, ProviderResponse};
use std::sync::Arc;
use tracing::debug;

/// A provider bound to a model and default temperature.
///
/// Cheap to clone; engines hold it by value.
#[derive(Clone)]
pub struct LlmClient {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl LlmClient {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
            max_tokens: None,
        }
    }

    /// Set the default temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the default max tokens per response.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// The provider backing this client.
    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// Provider name (e.g., "openai").
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// The bound model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a single-prompt request and return the response content.
    pub async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        self.generate_at(prompt, self.temperature).await
    }

    /// Like [`generate`](Self::generate), with an explicit temperature.
    pub async fn generate_at(
        &self,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, ProviderError> {
        let mut request = ProviderRequest::prompt(&self.model, prompt, temperature);
        request.max_tokens = self.max_tokens;
        debug!(provider = %self.provider.name(), model = %self.model, "generate");
        let response = self.provider.complete(request).await?;
        Ok(response.message.content)
    }

    /// Send a full message list (for engines that keep history).
    pub async fn complete(
        &self,
        messages: Vec<Message>,
    ) -> Result<ProviderResponse, ProviderError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        self.provider.complete(request).await
    }
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderResponse;
    use async_trait::async_trait;

    struct EchoProvider;

    #[async_trait]
    impl Provider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            let text = request
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            Ok(ProviderResponse {
                message: Message::assistant(format!("echo: {text} @{}", request.temperature)),
                usage: None,
                model: request.model,
            })
        }
    }

    #[tokio::test]
    async fn generate_returns_content() {
        let llm = LlmClient::new(Arc::new(EchoProvider), "test-model");
        let out = llm.generate("hello").await.unwrap();
        assert!(out.starts_with("echo: hello"));
    }

    #[tokio::test]
    async fn generate_at_overrides_temperature() {
        let llm = LlmClient::new(Arc::new(EchoProvider), "test-model").with_temperature(0.9);
        let out = llm.generate_at("x", 0.1).await.unwrap();
        assert!(out.contains("@0.1"));
    }

    #[tokio::test]
    async fn complete_passes_history() {
        let llm = LlmClient::new(Arc::new(EchoProvider), "test-model");
        let resp = llm
            .complete(vec![Message::system("be brief"), Message::user("hi")])
            .await
            .unwrap();
        assert!(resp.message.content.contains("hi"));
    }
}
