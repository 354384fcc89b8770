//! agentry CLI — the main entry point.
//!
//! Commands:
//! - `list`      — Show the pattern catalogue
//! - `run`       — Run one pattern demo against the detected provider
//! - `providers` — Show provider detection results
//! - `doctor`    — Diagnose configuration and provider health

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "agentry",
    about = "agentry — a catalogue of agentic-AI design pattern demos",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the pattern catalogue
    List,

    /// Run a pattern demo by number or slug (e.g. "34" or "react")
    Run {
        /// Pattern number or slug
        pattern: String,

        /// Override the provider (openai, gemini, anthropic, fireworks,
        /// mistral, ollama)
        #[arg(short, long)]
        provider: Option<String>,

        /// Override the model
        #[arg(short, long)]
        model: Option<String>,

        /// Override the default temperature
        #[arg(short, long)]
        temperature: Option<f32>,
    },

    /// Show provider detection results
    Providers,

    /// Diagnose configuration and provider health
    Doctor,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::List => commands::list::run(),
        Commands::Run {
            pattern,
            provider,
            model,
            temperature,
        } => commands::run::run(&pattern, provider, model, temperature).await,
        Commands::Providers => commands::providers::run().await,
        Commands::Doctor => commands::doctor::run().await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::ExitCode::from(2)
        }
    }
}
