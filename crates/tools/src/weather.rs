//! Weather tool — deterministic mock conditions per city.
//!
//! A handful of cities have fixed canned readings (the ones the demos ask
//! about); anything else gets hash-derived but stable data, so repeated
//! lookups agree.

use crate::mock_hash;
use agentry_core::error::ToolError;
use agentry_core::tool::{Tool, ToolOutcome};
use async_trait::async_trait;

pub struct WeatherTool;

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "weather"
    }

    fn description(&self) -> &str {
        "Look up current weather for a city. Returns temperature, conditions and humidity."
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let city = arguments["city"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'city' argument".into()))?;

        let report = lookup(city);
        let output = format!(
            "Weather in {}: {}, {}°C, humidity {}%",
            city, report.conditions, report.temperature_c, report.humidity
        );

        Ok(ToolOutcome::text(output).with_data(serde_json::json!({
            "city": city,
            "temperature_c": report.temperature_c,
            "conditions": report.conditions,
            "humidity": report.humidity,
        })))
    }
}

pub struct WeatherReport {
    pub temperature_c: i32,
    pub conditions: &'static str,
    pub humidity: u32,
}

/// Canned readings for the demo cities, hash-derived for everything else.
pub fn lookup(city: &str) -> WeatherReport {
    match city.to_lowercase().as_str() {
        "paris" => WeatherReport {
            temperature_c: 22,
            conditions: "Sunny",
            humidity: 40,
        },
        "london" => WeatherReport {
            temperature_c: 18,
            conditions: "Cloudy",
            humidity: 70,
        },
        "tokyo" => WeatherReport {
            temperature_c: 25,
            conditions: "Rainy",
            humidity: 85,
        },
        "new york" => WeatherReport {
            temperature_c: 20,
            conditions: "Partly cloudy",
            humidity: 55,
        },
        other => {
            let hash = mock_hash(other);
            let conditions = [
                "Clear skies",
                "Partly cloudy",
                "Overcast",
                "Light rain",
                "Thunderstorms",
                "Snow",
                "Foggy",
            ];
            WeatherReport {
                temperature_c: (hash % 40) as i32 - 5,
                conditions: conditions[(hash as usize / 7) % conditions.len()],
                humidity: 30 + hash % 60,
            }
        }
    }
}
