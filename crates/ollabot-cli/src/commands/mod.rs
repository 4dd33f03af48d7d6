//! CLI commands.

pub mod ask;
pub mod chat;
pub mod diagnose;
pub mod models;
pub mod restart;
pub mod status;

use ollabot_chat::ChatConfig;
use ollabot_service::{
    BackendHealthChecker, ServiceRecoveryController, SystemCommandRunner,
};
use std::sync::Arc;

pub(crate) fn health_checker(config: &ChatConfig) -> miette::Result<BackendHealthChecker> {
    BackendHealthChecker::new(&config.base_url, config.retry.clone())
        .map(|checker| {
            checker
                .with_reachability_timeout(config.reachability_timeout)
                .with_model_timeout(config.model_timeout)
        })
        .map_err(|e| miette::miette!("Failed to create HTTP client: {}", e))
}

pub(crate) async fn recovery_controller(config: &ChatConfig) -> ServiceRecoveryController {
    ServiceRecoveryController::detect(Arc::new(SystemCommandRunner), config.recovery.clone()).await
}
