//! Stock quote tool — hash-derived mock market data.
//!
//! Used by the plan-execute-verify demo. Prices are stable per symbol so a
//! verified step re-run gets the same observation.

use crate::mock_hash;
use agentry_core::error::ToolError;
use agentry_core::tool::{Tool, ToolOutcome};
use async_trait::async_trait;

pub struct StockTool;

#[async_trait]
impl Tool for StockTool {
    fn name(&self) -> &str {
        "stock"
    }

    fn description(&self) -> &str {
        "Get a stock quote for a ticker symbol, e.g. \"ACME\"."
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let symbol = arguments["symbol"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'symbol' argument".into()))?;

        if symbol.is_empty() || symbol.len() > 8 || !symbol.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(ToolError::InvalidArguments(format!(
                "'{symbol}' is not a valid ticker symbol"
            )));
        }

        let quote = quote(symbol);
        Ok(ToolOutcome::text(format!(
            "{}: ${:.2} ({:+.2}%)",
            symbol.to_uppercase(),
            quote.price,
            quote.change_pct
        ))
        .with_data(serde_json::json!({
            "symbol": symbol.to_uppercase(),
            "price": quote.price,
            "change_pct": quote.change_pct,
        })))
    }
}

pub struct Quote {
    pub price: f64,
    pub change_pct: f64,
}

/// Stable mock quote per symbol.
pub fn quote(symbol: &str) -> Quote {
    let hash = mock_hash(&symbol.to_uppercase());
    Quote {
        price: 20.0 + (hash % 480) as f64 + ((hash / 7) % 100) as f64 / 100.0,
        change_pct: ((hash % 81) as f64 - 40.0) / 10.0,
    }
}
