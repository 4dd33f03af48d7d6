//! Status command - check the backend and the configured model.

use ollabot_chat::ChatConfig;
use ollabot_service::{HealthCheck, HealthStatus, ModelStatus};

use super::health_checker;

pub(crate) async fn run(config: &ChatConfig, json: bool) -> miette::Result<()> {
    let checker = health_checker(config)?;
    let (service, model) = check(&checker, &config.model).await;

    if json {
        let report = serde_json::json!({
            "url": config.base_url,
            "model": config.model,
            "service": service,
            "model_status": model,
        });
        let output = serde_json::to_string_pretty(&report)
            .map_err(|e| miette::miette!("Failed to serialize status: {}", e))?;
        println!("{}", output);
    } else {
        println!("Backend: {}", config.base_url);
        print_report(&config.model, &service, model.as_ref());
    }

    if service.reachable && model.as_ref().is_some_and(|m| m.available) {
        Ok(())
    } else {
        Err(miette::miette!("Backend is not ready"))
    }
}

/// Run both checks; the model is only probed when the service answers.
pub(crate) async fn check(
    health: &impl HealthCheck,
    model: &str,
) -> (HealthStatus, Option<ModelStatus>) {
    let service = health.check_reachability().await;
    let model = if service.reachable {
        Some(health.check_model_available(model).await)
    } else {
        None
    };
    (service, model)
}

pub(crate) fn print_report(model_name: &str, service: &HealthStatus, model: Option<&ModelStatus>) {
    println!("  Service: {}", mark(service.reachable, &service.message));
    match model {
        Some(status) => println!(
            "  Model:   {} ({})",
            mark(status.available, &status.message),
            model_name
        ),
        None => println!("  Model:   skipped ({})", model_name),
    }
}

fn mark(ok: bool, message: &str) -> String {
    if ok {
        format!("ok - {}", message)
    } else {
        format!("FAILED - {}", message)
    }
}
