//! Provider auto-detection and client assembly.
//!
//! Detection order matches the catalogue's original wrapper: the first API
//! key found wins, and a local Ollama daemon is the fallback of last resort.
//!
//! 1. `OPENAI_API_KEY`    → openai
//! 2. `GOOGLE_API_KEY`    → gemini
//! 3. `ANTHROPIC_API_KEY` → anthropic
//! 4. `FIREWORKS_API_KEY` → fireworks
//! 5. `MISTRAL_API_KEY`   → mistral
//! 6. Ollama probe at `http://localhost:11434`

use crate::{AnthropicProvider, GeminiProvider, OllamaProvider, OpenAiCompatProvider};
use agentry_config::AppConfig;
use agentry_core::error::ProviderError;
use agentry_core::{LlmClient, Provider};
use std::sync::Arc;
use tracing::info;

/// Detection order and the env var carrying each provider's key.
const KEYED_PROVIDERS: [(&str, &str); 5] = [
    ("openai", "OPENAI_API_KEY"),
    ("gemini", "GOOGLE_API_KEY"),
    ("anthropic", "ANTHROPIC_API_KEY"),
    ("fireworks", "FIREWORKS_API_KEY"),
    ("mistral", "MISTRAL_API_KEY"),
];

/// Result of provider detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detected {
    /// Provider name ("openai", "gemini", ...)
    pub provider: String,
    /// Default model for that provider
    pub model: String,
}

/// Default model per provider.
pub fn default_model(provider: &str) -> &'static str {
    match provider {
        "openai" => "gpt-4o-mini",
        "gemini" => "gemini-1.5-flash",
        "anthropic" => "claude-sonnet-4-20250514",
        "fireworks" => "accounts/fireworks/models/llama-v3p1-8b-instruct",
        "mistral" => "mistral-small-latest",
        _ => "llama3.2",
    }
}

/// The env var carrying a provider's API key, if it uses one.
pub fn key_var(provider: &str) -> Option<&'static str> {
    KEYED_PROVIDERS
        .iter()
        .find(|(name, _)| *name == provider)
        .map(|(_, var)| *var)
}

/// Auto-detect a provider from the environment.
pub async fn detect() -> Result<Detected, ProviderError> {
    for (provider, var) in KEYED_PROVIDERS {
        if std::env::var(var).map(|v| !v.is_empty()).unwrap_or(false) {
            return Ok(Detected {
                provider: provider.into(),
                model: default_model(provider).into(),
            });
        }
    }

    if OllamaProvider::probe(crate::ollama::DEFAULT_BASE_URL).await {
        return Ok(Detected {
            provider: "ollama".into(),
            model: default_model("ollama").into(),
        });
    }

    Err(ProviderError::NotDetected(
        "No API key found. Set OPENAI_API_KEY, GOOGLE_API_KEY, ANTHROPIC_API_KEY, \
         FIREWORKS_API_KEY, MISTRAL_API_KEY, or run Ollama locally."
            .into(),
    ))
}

/// Instantiate a named provider, applying config overrides.
pub fn instantiate(name: &str, config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let pc = config.provider_config(name);
    let api_key = pc
        .and_then(|p| p.api_key.clone())
        .or_else(|| key_var(name).and_then(|var| std::env::var(var).ok()))
        .unwrap_or_default();

    if name != "ollama" && api_key.is_empty() {
        return Err(ProviderError::NotConfigured(format!(
            "No API key for provider '{name}'"
        )));
    }

    let provider: Arc<dyn Provider> = match name {
        "openai" => Arc::new(OpenAiCompatProvider::openai(api_key)),
        "fireworks" => Arc::new(OpenAiCompatProvider::fireworks(api_key)),
        "mistral" => Arc::new(OpenAiCompatProvider::mistral(api_key)),
        "anthropic" => {
            let mut p = AnthropicProvider::new(api_key);
            if let Some(url) = pc.and_then(|c| c.base_url.clone()) {
                p = p.with_base_url(url);
            }
            Arc::new(p)
        }
        "gemini" => {
            let mut p = GeminiProvider::new(api_key);
            if let Some(url) = pc.and_then(|c| c.base_url.clone()) {
                p = p.with_base_url(url);
            }
            Arc::new(p)
        }
        "ollama" => {
            let url = pc
                .and_then(|c| c.base_url.clone())
                .unwrap_or_else(|| crate::ollama::DEFAULT_BASE_URL.into());
            Arc::new(OllamaProvider::with_base_url(url))
        }
        other => {
            // Unknown names are treated as OpenAI-compatible custom endpoints
            let url = pc.and_then(|c| c.base_url.clone()).ok_or_else(|| {
                ProviderError::NotConfigured(format!(
                    "Unknown provider '{other}' needs a base_url in config"
                ))
            })?;
            Arc::new(OpenAiCompatProvider::new(other, url, api_key))
        }
    };

    Ok(provider)
}

/// Build an [`LlmClient`] from config, detecting a provider if none is forced.
pub async fn build_client(config: &AppConfig) -> Result<LlmClient, ProviderError> {
    let (provider_name, detected_model) = match &config.provider {
        Some(name) => (name.clone(), default_model(name).to_string()),
        None => {
            let d = detect().await?;
            (d.provider, d.model)
        }
    };

    let model = config
        .model
        .clone()
        .or_else(|| {
            config
                .provider_config(&provider_name)
                .and_then(|p| p.model.clone())
        })
        .unwrap_or(detected_model);

    info!(provider = %provider_name, model = %model, "Using provider");

    let provider = instantiate(&provider_name, config)?;
    let mut client = LlmClient::new(provider, model).with_temperature(config.temperature);
    if let Some(max) = config.max_tokens {
        client = client.with_max_tokens(max);
    }
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_models_are_stable() {
        assert_eq!(default_model("openai"), "gpt-4o-mini");
        assert_eq!(default_model("ollama"), "llama3.2");
        assert!(default_model("fireworks").contains("fireworks"));
    }

    #[test]
    fn key_vars_match_detection_order() {
        assert_eq!(key_var("openai"), Some("OPENAI_API_KEY"));
        assert_eq!(key_var("gemini"), Some("GOOGLE_API_KEY"));
        assert_eq!(key_var("mistral"), Some("MISTRAL_API_KEY"));
        assert_eq!(key_var("ollama"), None);
    }

    #[test]
    fn instantiate_requires_key_for_cloud_providers() {
        // Fictional provider name so no ambient env var can satisfy it.
        let config = AppConfig::default();
        let err = match instantiate("nonexistent-vendor", &config) {
            Ok(_) => panic!("expected instantiate to fail for unknown provider"),
            Err(e) => e,
        };
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[test]
    fn instantiate_with_config_key() {
        let mut config = AppConfig::default();
        config.providers.insert(
            "anthropic".into(),
            agentry_config::ProviderConfig {
                api_key: Some("sk-test".into()),
                ..Default::default()
            },
        );
        let provider = instantiate("anthropic", &config).unwrap();
        assert_eq!(provider.name(), "anthropic");
    }

    #[test]
    fn instantiate_ollama_needs_no_key() {
        let config = AppConfig::default();
        let provider = instantiate("ollama", &config).unwrap();
        assert_eq!(provider.name(), "ollama");
    }
}
