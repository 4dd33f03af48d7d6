//! Diagnose command - walk through installation, connection and models.

use ollabot_chat::ChatConfig;
use ollabot_service::diagnose;

use super::health_checker;

pub(crate) async fn run(config: &ChatConfig) -> miette::Result<()> {
    let checker = health_checker(config)?;
    let binary = &config.recovery.binary;

    println!("Ollabot Diagnostics");
    println!("===================");
    println!();

    let report = diagnose(&checker, binary, &config.model).await;

    match &report.binary_path {
        Some(path) => println!("Installation: {} found at {}", binary, path.display()),
        None => println!("Installation: {} not found on PATH", binary),
    }
    println!("Connection:   {} ({})", config.base_url, report.connection_message);
    match report.model_listed {
        Some(true) => println!("Model:        {} is installed", config.model),
        Some(false) => println!("Model:        {} is not installed", config.model),
        None => match &report.listing_error {
            Some(e) => println!("Model:        could not list models ({})", e),
            None => println!("Model:        not checked"),
        },
    }
    println!();

    if report.is_healthy() {
        println!("Everything looks good.");
        return Ok(());
    }

    let remedies = report.remedies(binary, &config.model);
    if remedies.is_empty() {
        println!("Re-run with --verbose and check the server log for details.");
    } else {
        println!("Troubleshooting:");
        for (i, step) in remedies.iter().enumerate() {
            println!("  {}. {}", i + 1, step);
        }
    }

    Err(miette::miette!("Diagnostics found problems"))
}
