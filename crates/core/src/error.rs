//! Error types for the agentry domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all agentry operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Pattern errors ---
    #[error("Pattern error: {0}")]
    Pattern(#[from] PatternError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("No provider available: {0}")]
    NotDetected(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

/// Errors raised by pattern engines themselves, as opposed to the provider
/// or tool layers beneath them.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("Model output could not be parsed: {context} — {detail}")]
    MalformedOutput { context: String, detail: String },

    #[error("Iteration limit reached after {limit} rounds: {context}")]
    IterationLimit { limit: usize, context: String },

    #[error("Invalid workflow definition: {0}")]
    InvalidWorkflow(String),

    #[error("Unknown pattern: {0}")]
    UnknownPattern(String),

    #[error("Step failed: {step} — {reason}")]
    StepFailed { step: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn pattern_error_displays_correctly() {
        let err = Error::Pattern(PatternError::IterationLimit {
            limit: 5,
            context: "tree search".into(),
        });
        assert!(err.to_string().contains("5"));
        assert!(err.to_string().contains("tree search"));
    }

    #[test]
    fn tool_error_converts_to_top_level() {
        let err: Error = ToolError::NotFound("stock".into()).into();
        assert!(matches!(err, Error::Tool(ToolError::NotFound(_))));
    }
}
