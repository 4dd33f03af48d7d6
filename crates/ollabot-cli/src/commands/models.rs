//! Models command - list models installed on the backend.

use ollabot_chat::ChatConfig;
use ollabot_service::model_listed;

use super::health_checker;

pub(crate) async fn run(config: &ChatConfig) -> miette::Result<()> {
    let checker = health_checker(config)?;
    let models = checker
        .installed_models()
        .await
        .map_err(|e| miette::miette!("Failed to list models: {}", e))?;

    if models.is_empty() {
        println!("No models installed.");
        println!();
        println!("To install the configured model, run:");
        println!("  {} pull {}", config.recovery.binary, config.model);
        return Ok(());
    }

    println!("Installed models:");
    for model in &models {
        println!("  - {}", model);
    }

    if !model_listed(&models, &config.model) {
        println!();
        println!("Configured model '{}' is not installed.", config.model);
    }

    Ok(())
}
