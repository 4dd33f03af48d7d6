//! Restart command - restart the backend and confirm it came back.

use ollabot_chat::ChatConfig;
use ollabot_service::{HealthCheck, ServiceRecoveryController};

use super::{health_checker, recovery_controller};

pub(crate) async fn run(config: &ChatConfig) -> miette::Result<()> {
    let checker = health_checker(config)?;
    let recovery = recovery_controller(config).await;

    restart(&recovery, &checker).await.map(|_| ())
}

/// Restart the backend if it is unreachable, then re-check reachability.
/// Shared with the chat `/restart`.
///
/// Returns `Ok(false)` when the backend was already reachable and nothing
/// was restarted.
pub(crate) async fn restart(
    recovery: &ServiceRecoveryController,
    health: &impl HealthCheck,
) -> miette::Result<bool> {
    println!(
        "Checking backend before restarting via {}...",
        recovery.strategy()
    );

    let Some(outcome) = recovery.recover_if_unreachable(health).await else {
        println!("Backend is reachable, nothing to restart.");
        return Ok(false);
    };
    if !outcome.succeeded {
        return Err(miette::miette!("{}", outcome.detail));
    }
    println!("{}", outcome.detail);

    let status = health.check_reachability().await;
    if status.reachable {
        println!("Backend is up: {}", status.message);
        Ok(true)
    } else {
        Err(miette::miette!(
            "Backend still unreachable after restart: {}",
            status.message
        ))
    }
}
