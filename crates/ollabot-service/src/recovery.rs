//! Restarting an unresponsive backend.
//!
//! Recovery moves through `Idle → Restarting → Waiting → {Recovered | Failed}`.
//! The restart mechanism is chosen once, when the controller is built, by
//! probing for a service manager. After the OS-level restart succeeds the
//! controller waits a fixed settle period for the backend to load its model;
//! it does not poll. Callers wanting certainty re-run the reachability check.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::command::CommandRunner;
use crate::health::HealthCheck;

/// How the backend gets restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartStrategy {
    /// `systemctl restart <unit>`.
    ServiceManager,
    /// Kill the running process, then spawn `<binary> serve`.
    DirectProcess,
}

impl RestartStrategy {
    /// Pick the service-manager path if `systemctl --version` succeeds.
    pub async fn detect(runner: &dyn CommandRunner) -> Self {
        match runner.run("systemctl", &["--version".to_string()]).await {
            Ok(output) if output.success => Self::ServiceManager,
            Ok(_) => Self::DirectProcess,
            Err(e) => {
                debug!("systemctl unavailable: {}", e);
                Self::DirectProcess
            }
        }
    }
}

impl fmt::Display for RestartStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServiceManager => write!(f, "service manager"),
            Self::DirectProcess => write!(f, "direct process"),
        }
    }
}

/// Where a recovery attempt currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryState {
    Idle,
    Restarting,
    Waiting,
    Recovered,
    Failed,
}

impl fmt::Display for RecoveryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Restarting => "restarting",
            Self::Waiting => "waiting",
            Self::Recovered => "recovered",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of one recovery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryOutcome {
    pub succeeded: bool,
    pub detail: String,
}

impl RecoveryOutcome {
    fn success(detail: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            detail: detail.into(),
        }
    }

    fn failure(detail: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            detail: detail.into(),
        }
    }
}

/// Recovery settings.
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// Service unit restarted on the service-manager path.
    pub service_unit: String,
    /// Backend executable killed and respawned on the direct path.
    pub binary: String,
    /// Prefix privileged commands with `sudo`.
    pub use_sudo: bool,
    /// Pause between killing the old process and spawning a new one.
    pub kill_settle: Duration,
    /// Pause after a successful restart before declaring recovery.
    pub startup_settle: Duration,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            service_unit: "ollama".to_string(),
            binary: "ollama".to_string(),
            use_sudo: true,
            kill_settle: Duration::from_secs(2),
            startup_settle: Duration::from_secs(10),
        }
    }
}

/// Restarts the backend. At most one recovery runs at a time.
pub struct ServiceRecoveryController {
    runner: Arc<dyn CommandRunner>,
    strategy: RestartStrategy,
    config: RecoveryConfig,
    state: Mutex<RecoveryState>,
    in_flight: tokio::sync::Mutex<()>,
}

impl ServiceRecoveryController {
    /// Build a controller, probing the host for a service manager.
    pub async fn detect(runner: Arc<dyn CommandRunner>, config: RecoveryConfig) -> Self {
        let strategy = RestartStrategy::detect(runner.as_ref()).await;
        info!("Backend restart strategy: {}", strategy);
        Self::with_strategy(runner, config, strategy)
    }

    /// Build a controller with a known strategy.
    pub fn with_strategy(
        runner: Arc<dyn CommandRunner>,
        config: RecoveryConfig,
        strategy: RestartStrategy,
    ) -> Self {
        Self {
            runner,
            strategy,
            config,
            state: Mutex::new(RecoveryState::Idle),
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    pub fn strategy(&self) -> RestartStrategy {
        self.strategy
    }

    pub fn config(&self) -> &RecoveryConfig {
        &self.config
    }

    /// Current state of the most recent attempt.
    pub fn state(&self) -> RecoveryState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, state: RecoveryState) {
        debug!("Recovery state -> {}", state);
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    /// Recover only if `health` reports the backend unreachable.
    ///
    /// Returns `None` when the backend is already reachable.
    pub async fn recover_if_unreachable(
        &self,
        health: &dyn HealthCheck,
    ) -> Option<RecoveryOutcome> {
        let status = health.check_reachability().await;
        if status.reachable {
            debug!("Backend reachable, skipping recovery");
            return None;
        }
        warn!("Backend unreachable ({}), attempting recovery", status.message);
        Some(self.recover().await)
    }

    /// Restart the backend and wait for it to settle.
    ///
    /// Never retries internally. A call made while another recovery is in
    /// progress fails immediately.
    pub async fn recover(&self) -> RecoveryOutcome {
        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!("Recovery requested while another is in progress");
            return RecoveryOutcome::failure("Recovery already in progress");
        };

        self.set_state(RecoveryState::Restarting);
        info!("Restarting backend via {}", self.strategy);

        let restarted = match self.strategy {
            RestartStrategy::ServiceManager => self.restart_service().await,
            RestartStrategy::DirectProcess => self.restart_process().await,
        };

        if let Err(detail) = restarted {
            error!("Backend restart failed: {}", detail);
            self.set_state(RecoveryState::Failed);
            return RecoveryOutcome::failure(detail);
        }

        self.set_state(RecoveryState::Waiting);
        info!(
            "Waiting {:?} for the backend to load",
            self.config.startup_settle
        );
        sleep(self.config.startup_settle).await;

        self.set_state(RecoveryState::Recovered);
        info!("Backend restarted");
        RecoveryOutcome::success("Service restarted successfully")
    }

    async fn restart_service(&self) -> Result<(), String> {
        let unit = self.config.service_unit.as_str();
        let (program, args) = self.privileged("systemctl", &["restart", unit]);
        let output = self
            .runner
            .run(&program, &args)
            .await
            .map_err(|e| format!("Failed to restart service: {}", e))?;

        if output.success {
            return Ok(());
        }

        let reason = if output.stderr.is_empty() {
            match output.code {
                Some(code) => format!("exit status {}", code),
                None => "terminated by signal".to_string(),
            }
        } else {
            output.stderr
        };
        Err(format!("Failed to restart service: {}", reason))
    }

    async fn restart_process(&self) -> Result<(), String> {
        let binary = &self.config.binary;

        // pkill exits non-zero when nothing matched; only a failure to run it counts.
        let (program, args) = self.privileged("pkill", &[binary.as_str()]);
        let output = self
            .runner
            .run(&program, &args)
            .await
            .map_err(|e| format!("Failed to stop {}: {}", binary, e))?;
        debug!("pkill exited with {:?}", output.code);

        sleep(self.config.kill_settle).await;

        let pid = self
            .runner
            .spawn_detached(binary, &["serve".to_string()])
            .map_err(|e| format!("Failed to start {}: {}", binary, e))?;
        info!("Spawned `{} serve` with PID {}", binary, pid);
        Ok(())
    }

    fn privileged(&self, program: &str, args: &[&str]) -> (String, Vec<String>) {
        let args = args.iter().map(|a| a.to_string());
        if self.config.use_sudo {
            let mut full = vec![program.to_string()];
            full.extend(args);
            ("sudo".to_string(), full)
        } else {
            (program.to_string(), args.collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandOutput;
    use crate::health::{HealthStatus, ModelStatus};
    use async_trait::async_trait;
    use std::io;

    /// Records every command and answers from canned results.
    #[derive(Default)]
    struct FakeRunner {
        calls: Mutex<Vec<String>>,
        has_systemctl: bool,
        restart_fails_with: Option<String>,
        spawn_fails: bool,
    }

    impl FakeRunner {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for FakeRunner {
        async fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput> {
            let line = format!("{} {}", program, args.join(" "));
            self.calls.lock().unwrap().push(line.clone());

            if line == "systemctl --version" {
                return if self.has_systemctl {
                    Ok(CommandOutput {
                        success: true,
                        code: Some(0),
                        stderr: String::new(),
                    })
                } else {
                    Err(io::Error::new(io::ErrorKind::NotFound, "not found"))
                };
            }

            match &self.restart_fails_with {
                Some(stderr) if line.contains("restart") => Ok(CommandOutput {
                    success: false,
                    code: Some(1),
                    stderr: stderr.clone(),
                }),
                // pkill with no matching process.
                _ if line.contains("pkill") => Ok(CommandOutput {
                    success: false,
                    code: Some(1),
                    stderr: String::new(),
                }),
                _ => Ok(CommandOutput {
                    success: true,
                    code: Some(0),
                    stderr: String::new(),
                }),
            }
        }

        fn spawn_detached(&self, program: &str, args: &[String]) -> io::Result<u32> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("spawn {} {}", program, args.join(" ")));
            if self.spawn_fails {
                Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    "No such file or directory",
                ))
            } else {
                Ok(4242)
            }
        }
    }

    struct FixedHealth(bool);

    #[async_trait]
    impl HealthCheck for FixedHealth {
        async fn check_reachability(&self) -> HealthStatus {
            HealthStatus {
                reachable: self.0,
                message: "fixed".to_string(),
            }
        }

        async fn check_model_available(&self, _model: &str) -> ModelStatus {
            ModelStatus {
                available: self.0,
                message: "fixed".to_string(),
            }
        }
    }

    fn controller(runner: Arc<FakeRunner>, strategy: RestartStrategy) -> ServiceRecoveryController {
        ServiceRecoveryController::with_strategy(runner, RecoveryConfig::default(), strategy)
    }

    #[tokio::test]
    async fn test_detects_service_manager() {
        let runner = FakeRunner {
            has_systemctl: true,
            ..Default::default()
        };
        assert_eq!(
            RestartStrategy::detect(&runner).await,
            RestartStrategy::ServiceManager
        );
    }

    #[tokio::test]
    async fn test_falls_back_to_direct_process() {
        let runner = FakeRunner::default();
        assert_eq!(
            RestartStrategy::detect(&runner).await,
            RestartStrategy::DirectProcess
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_service_manager_restart() {
        let runner = Arc::new(FakeRunner::default());
        let controller = controller(runner.clone(), RestartStrategy::ServiceManager);

        let started = tokio::time::Instant::now();
        let outcome = controller.recover().await;

        assert!(outcome.succeeded);
        assert_eq!(controller.state(), RecoveryState::Recovered);
        assert_eq!(runner.calls(), vec!["sudo systemctl restart ollama"]);
        assert!(started.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_service_manager_failure_surfaces_stderr() {
        let runner = Arc::new(FakeRunner {
            restart_fails_with: Some("Failed to restart ollama.service: Access denied".into()),
            ..Default::default()
        });
        let controller = controller(runner, RestartStrategy::ServiceManager);

        let outcome = controller.recover().await;

        assert!(!outcome.succeeded);
        assert_eq!(
            outcome.detail,
            "Failed to restart service: Failed to restart ollama.service: Access denied"
        );
        assert_eq!(controller.state(), RecoveryState::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_direct_process_restart() {
        let runner = Arc::new(FakeRunner::default());
        let controller = controller(runner.clone(), RestartStrategy::DirectProcess);

        let started = tokio::time::Instant::now();
        let outcome = controller.recover().await;

        assert!(outcome.succeeded, "{}", outcome.detail);
        assert_eq!(
            runner.calls(),
            vec!["sudo pkill ollama", "spawn ollama serve"]
        );
        // 2s kill settle + 10s startup settle.
        assert!(started.elapsed() >= Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn test_direct_process_spawn_failure() {
        let runner = Arc::new(FakeRunner {
            spawn_fails: true,
            ..Default::default()
        });
        let controller = controller(runner, RestartStrategy::DirectProcess);

        let outcome = controller.recover().await;

        assert!(!outcome.succeeded);
        assert_eq!(
            outcome.detail,
            "Failed to start ollama: No such file or directory"
        );
        assert_eq!(controller.state(), RecoveryState::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_without_sudo() {
        let runner = Arc::new(FakeRunner::default());
        let config = RecoveryConfig {
            use_sudo: false,
            service_unit: "ollama-gpu".to_string(),
            ..Default::default()
        };
        let controller = ServiceRecoveryController::with_strategy(
            runner.clone(),
            config,
            RestartStrategy::ServiceManager,
        );

        controller.recover().await;

        assert_eq!(runner.calls(), vec!["systemctl restart ollama-gpu"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_before_declaring_recovered() {
        let runner = Arc::new(FakeRunner::default());
        let controller = Arc::new(controller(runner, RestartStrategy::ServiceManager));
        assert_eq!(controller.state(), RecoveryState::Idle);

        let task = tokio::spawn({
            let controller = controller.clone();
            async move { controller.recover().await }
        });

        for _ in 0..10 {
            tokio::task::yield_now().await;
            if controller.state() == RecoveryState::Waiting {
                break;
            }
        }
        assert_eq!(controller.state(), RecoveryState::Waiting);

        // Overlapping requests are refused rather than queued.
        let second = controller.recover().await;
        assert!(!second.succeeded);
        assert_eq!(second.detail, "Recovery already in progress");

        let outcome = task.await.unwrap();
        assert!(outcome.succeeded);
        assert_eq!(controller.state(), RecoveryState::Recovered);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skips_recovery_when_reachable() {
        let runner = Arc::new(FakeRunner::default());
        let controller = controller(runner.clone(), RestartStrategy::ServiceManager);

        assert!(controller
            .recover_if_unreachable(&FixedHealth(true))
            .await
            .is_none());
        assert!(runner.calls().is_empty());

        let outcome = controller
            .recover_if_unreachable(&FixedHealth(false))
            .await
            .unwrap();
        assert!(outcome.succeeded);
        assert_eq!(runner.calls().len(), 1);
    }
}
