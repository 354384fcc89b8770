//! `agentry providers` — show detection results and configured providers.

use agentry_config::AppConfig;
use agentry_providers::detect::{default_model, detect, key_var};
use std::process::ExitCode;

const KNOWN: [&str; 6] = [
    "openai",
    "gemini",
    "anthropic",
    "fireworks",
    "mistral",
    "ollama",
];

pub async fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    println!("Known providers:\n");
    for name in KNOWN {
        let key_state = match key_var(name) {
            Some(var) => {
                if std::env::var(var).map(|v| !v.is_empty()).unwrap_or(false) {
                    format!("{var} set")
                } else {
                    format!("{var} not set")
                }
            }
            None => "local daemon (no key)".to_string(),
        };
        let configured = if config.provider_config(name).is_some() {
            "  [configured]"
        } else {
            ""
        };
        println!(
            "  {:<10} default model {:<45} {key_state}{configured}",
            name,
            default_model(name)
        );
    }

    println!();
    match detect().await {
        Ok(detected) => println!(
            "Auto-detection would pick: {} ({})",
            detected.provider, detected.model
        ),
        Err(e) => println!("Auto-detection: {e}"),
    }

    if let Some(forced) = &config.provider {
        println!("Config forces provider: {forced}");
    }

    Ok(ExitCode::SUCCESS)
}
