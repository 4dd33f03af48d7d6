//! # Backend health and recovery
//!
//! Point-in-time checks of whether the inference backend is reachable and
//! serving the required model, plus a controller that restarts the backend
//! when it is not.
//!
//! ```text
//! ┌──────────────────────┐  unreachable  ┌───────────────────────────┐
//! │ BackendHealthChecker │ ────────────> │ ServiceRecoveryController │
//! └──────────────────────┘               └─────────────┬─────────────┘
//!                                                      │
//!                                      ┌───────────────┴──────────────┐
//!                                      │ systemctl restart │ kill+spawn │
//!                                      └──────────────────────────────┘
//! ```

mod command;
mod error;
mod health;
mod install;
mod recovery;

pub use command::{CommandOutput, CommandRunner, SystemCommandRunner};
pub use error::ServiceError;
pub use health::{
    model_listed, BackendHealthChecker, HealthCheck, HealthStatus, ModelStatus,
    DEFAULT_MODEL_TIMEOUT, DEFAULT_REACHABILITY_TIMEOUT,
};
pub use install::{diagnose, find_binary, Diagnosis};
pub use recovery::{
    RecoveryConfig, RecoveryOutcome, RecoveryState, RestartStrategy, ServiceRecoveryController,
};

/// Default model served by the backend.
pub const DEFAULT_MODEL: &str = "mistral";
