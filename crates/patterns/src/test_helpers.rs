//! Shared test helpers for pattern tests.

use agentry_core::error::ProviderError;
use agentry_core::message::Message;
use agentry_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use agentry_core::LlmClient;
use std::sync::Arc;
use std::sync::Mutex;

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue.
/// Panics if more calls are made than responses provided.
pub struct ScriptedProvider {
    responses: Mutex<Vec<String>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Number of completions served so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// The prompts this provider has been asked, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let prompt = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let mut calls = self.calls.lock().unwrap();
        let responses = self.responses.lock().unwrap();

        if calls.len() >= responses.len() {
            panic!(
                "ScriptedProvider: no more responses (call #{}, have {})\nprompt was: {}",
                calls.len() + 1,
                responses.len(),
                prompt
            );
        }

        let response = responses[calls.len()].clone();
        calls.push(prompt);

        Ok(ProviderResponse {
            message: Message::assistant(response),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "scripted-model".into(),
        })
    }
}

/// Build an `LlmClient` over a scripted provider.
pub fn scripted(responses: &[&str]) -> LlmClient {
    let provider = ScriptedProvider::new(responses.iter().map(|s| s.to_string()).collect());
    LlmClient::new(Arc::new(provider), "scripted-model")
}

/// Build an `LlmClient` and keep a handle to the provider for assertions.
pub fn scripted_with_handle(responses: &[&str]) -> (LlmClient, Arc<ScriptedProvider>) {
    let provider = Arc::new(ScriptedProvider::new(
        responses.iter().map(|s| s.to_string()).collect(),
    ));
    (
        LlmClient::new(provider.clone(), "scripted-model"),
        provider,
    )
}
