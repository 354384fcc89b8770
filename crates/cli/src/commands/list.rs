//! `agentry list` — render the pattern catalogue.

use agentry_patterns::registry::CATALOGUE;
use std::process::ExitCode;

pub fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    println!("The agentry pattern catalogue ({} patterns):\n", CATALOGUE.len());

    let slug_width = CATALOGUE
        .iter()
        .map(|p| p.slug.len())
        .max()
        .unwrap_or(0);

    for pattern in CATALOGUE {
        println!(
            "  {:>3}  {:<width$}  {}",
            pattern.number,
            pattern.slug,
            pattern.summary,
            width = slug_width
        );
    }

    println!("\nRun one with: agentry run <number|slug>");
    Ok(ExitCode::SUCCESS)
}
