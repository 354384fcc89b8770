//! Clock tool — reports the current date and time.

use agentry_core::error::ToolError;
use agentry_core::tool::{Tool, ToolOutcome};
use async_trait::async_trait;
use chrono::Utc;

pub struct ClockTool;

#[async_trait]
impl Tool for ClockTool {
    fn name(&self) -> &str {
        "clock"
    }

    fn description(&self) -> &str {
        "Get the current date and time (UTC)."
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let now = Utc::now();
        let formatted = now.format("%Y-%m-%d %H:%M:%S UTC").to_string();
        Ok(
            ToolOutcome::text(format!("Current time: {formatted}")).with_data(serde_json::json!({
                "iso": now.to_rfc3339(),
                "formatted": formatted,
            })),
        )
    }
}
