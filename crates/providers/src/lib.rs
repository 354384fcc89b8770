//! LLM provider backends for agentry.
//!
//! Four wire formats cover the six supported vendors:
//! - [`OpenAiCompatProvider`] — OpenAI, Fireworks and Mistral (chat completions)
//! - [`AnthropicProvider`] — native Messages API
//! - [`GeminiProvider`] — native generateContent API
//! - [`OllamaProvider`] — local `/api/generate`
//!
//! [`detect`] picks one from environment variables in the same order the
//! catalogue has always used: OpenAI, Gemini, Anthropic, Fireworks, Mistral,
//! then a local Ollama probe.

pub mod anthropic;
pub mod detect;
pub mod gemini;
pub mod ollama;
pub mod openai_compat;

pub use anthropic::AnthropicProvider;
pub use detect::{build_client, detect, Detected};
pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;
pub use openai_compat::OpenAiCompatProvider;
