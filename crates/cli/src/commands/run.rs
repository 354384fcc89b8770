//! `agentry run` — execute one pattern demo.

use agentry_config::AppConfig;
use agentry_patterns::registry;
use agentry_providers::build_client;
use std::process::ExitCode;
use tracing::error;

pub async fn run(
    pattern: &str,
    provider: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let Some(entry) = registry::find(pattern) else {
        eprintln!("Unknown pattern '{pattern}'. See `agentry list`.");
        return Ok(ExitCode::from(2));
    };

    let mut config = AppConfig::load()?;
    if provider.is_some() {
        config.provider = provider;
    }
    if model.is_some() {
        config.model = model;
    }
    if let Some(t) = temperature {
        config.temperature = t;
    }
    config.validate()?;

    let llm = build_client(&config).await?;

    println!(
        "── {} {} ── ({} / {})\n",
        entry.number,
        entry.slug,
        llm.provider_name(),
        llm.model()
    );

    match registry::run(entry.slug, &llm).await {
        Ok(report) => {
            println!("{}", report.render());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!(pattern = entry.slug, error = %e, "pattern demo failed");
            eprintln!("pattern failed: {e}");
            Ok(ExitCode::from(1))
        }
    }
}
