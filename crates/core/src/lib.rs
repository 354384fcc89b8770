//! # Agentry Core
//!
//! Domain types, traits, and error definitions for the agentry pattern
//! catalogue. This crate has **zero framework dependencies** — it defines the
//! model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The catalogue's single indirection point is [`LlmClient::generate`]: every
//! pattern engine drives an LLM through that one call. The `Provider` trait
//! behind it is the only seam that touches the network, so every engine can
//! be tested with a scripted in-memory provider.

pub mod client;
pub mod error;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use client::LlmClient;
pub use error::{Error, PatternError, ProviderError, Result, ToolError};
pub use message::{Message, Role, Transcript};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use tool::{Tool, ToolOutcome, ToolRegistry};
