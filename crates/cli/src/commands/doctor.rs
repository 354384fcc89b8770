//! `agentry doctor` — diagnose configuration and provider health.

use agentry_config::AppConfig;
use agentry_providers::build_client;
use std::process::ExitCode;

pub async fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    println!("agentry doctor\n");

    // Config
    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  config ........... ok");
            config
        }
        Err(e) => {
            println!("  config ........... FAILED: {e}");
            return Ok(ExitCode::from(2));
        }
    };

    // Provider detection + construction
    let llm = match build_client(&config).await {
        Ok(llm) => {
            println!(
                "  provider ......... ok ({} / {})",
                llm.provider_name(),
                llm.model()
            );
            llm
        }
        Err(e) => {
            println!("  provider ......... FAILED: {e}");
            println!("\nSet one of OPENAI_API_KEY, GOOGLE_API_KEY, ANTHROPIC_API_KEY,");
            println!("FIREWORKS_API_KEY, MISTRAL_API_KEY, or run Ollama locally.");
            return Ok(ExitCode::from(2));
        }
    };

    // Health check
    match llm.provider().health_check().await {
        Ok(true) => println!("  health check ..... ok"),
        Ok(false) => println!("  health check ..... unreachable"),
        Err(e) => println!("  health check ..... FAILED: {e}"),
    }

    println!("\nAll set. Try: agentry run prompt-chaining");
    Ok(ExitCode::SUCCESS)
}
