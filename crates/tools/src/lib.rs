//! Deterministic mock tools for the agentry pattern demos.
//!
//! Every tool here stands in for a real external API (weather service, web
//! search, market data) but returns deterministic, hash-derived data so the
//! demos and their tests run end-to-end without network access. The
//! calculator and clock are real.

pub mod calculator;
pub mod clock;
pub mod knowledge_base;
pub mod search;
pub mod stock;
pub mod weather;

pub use calculator::CalculatorTool;
pub use clock::ClockTool;
pub use knowledge_base::KnowledgeBaseTool;
pub use search::SearchTool;
pub use stock::StockTool;
pub use weather::WeatherTool;

use agentry_core::tool::ToolRegistry;

/// Build a registry with the full default tool set.
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(CalculatorTool));
    registry.register(Box::new(ClockTool));
    registry.register(Box::new(WeatherTool));
    registry.register(Box::new(SearchTool));
    registry.register(Box::new(KnowledgeBaseTool));
    registry.register(Box::new(StockTool));
    registry
}

/// Stable small hash used by the mock tools to derive plausible data
/// from their inputs.
pub(crate) fn mock_hash(input: &str) -> u32 {
    input
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32))
}
