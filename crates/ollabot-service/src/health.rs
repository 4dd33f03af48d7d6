//! Reachability and model-availability checks.

use async_trait::async_trait;
use ollabot_http::api::{GenerateBody, TagsReply, GENERATE_PATH, TAGS_PATH};
use ollabot_http::{HttpError, RetryPolicy, RetryableHttpClient, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

use crate::error::ServiceError;

/// Deadline for the reachability probe.
pub const DEFAULT_REACHABILITY_TIMEOUT: Duration = Duration::from_secs(10);

/// Deadline for the model probe; it performs a real (tiny) generation.
pub const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(15);

/// Result of a reachability check. Produced fresh on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub reachable: bool,
    pub message: String,
}

impl HealthStatus {
    fn up() -> Self {
        Self {
            reachable: true,
            message: "Service is running".to_string(),
        }
    }

    fn down(message: impl Into<String>) -> Self {
        Self {
            reachable: false,
            message: message.into(),
        }
    }
}

/// Result of a model-availability check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelStatus {
    pub available: bool,
    pub message: String,
}

impl ModelStatus {
    fn available() -> Self {
        Self {
            available: true,
            message: "Model is working".to_string(),
        }
    }

    fn unavailable(message: impl Into<String>) -> Self {
        Self {
            available: false,
            message: message.into(),
        }
    }
}

/// The two checks every chat turn runs before generating.
///
/// Implementations must never fail past their own boundary: every error is
/// folded into the returned status.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check_reachability(&self) -> HealthStatus;

    async fn check_model_available(&self, model: &str) -> ModelStatus;
}

/// Health checker backed by its own HTTP client.
#[derive(Debug, Clone)]
pub struct BackendHealthChecker {
    http: RetryableHttpClient,
    reachability_timeout: Duration,
    model_timeout: Duration,
}

impl BackendHealthChecker {
    /// Create a checker for `base_url` using the default timeouts.
    pub fn new(base_url: impl Into<String>, policy: RetryPolicy) -> Result<Self, HttpError> {
        Ok(Self {
            http: RetryableHttpClient::new(base_url, policy)?,
            reachability_timeout: DEFAULT_REACHABILITY_TIMEOUT,
            model_timeout: DEFAULT_MODEL_TIMEOUT,
        })
    }

    /// Set the reachability deadline.
    pub fn with_reachability_timeout(mut self, timeout: Duration) -> Self {
        self.reachability_timeout = timeout;
        self
    }

    /// Set the model probe deadline.
    pub fn with_model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout = timeout;
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    /// Names of all models the backend reports as installed.
    pub async fn installed_models(&self) -> Result<Vec<String>, ServiceError> {
        let response = self.http.get(TAGS_PATH, self.reachability_timeout).await?;
        if !response.is_success() {
            return Err(ServiceError::UnexpectedStatus(response.status().as_u16()));
        }
        let tags: TagsReply = response.json()?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

#[async_trait]
impl HealthCheck for BackendHealthChecker {
    async fn check_reachability(&self) -> HealthStatus {
        match self.http.get(TAGS_PATH, self.reachability_timeout).await {
            Ok(response) if response.status() == StatusCode::OK => HealthStatus::up(),
            Ok(response) => {
                debug!("Status probe returned {}", response.status().as_u16());
                HealthStatus::down(format!(
                    "Service is not responding (status {})",
                    response.status().as_u16()
                ))
            }
            Err(e) => {
                error!("Service status check failed: {}", e);
                HealthStatus::down(format!("Service is not running: {}", e))
            }
        }
    }

    async fn check_model_available(&self, model: &str) -> ModelStatus {
        let probe = GenerateBody::probe(model);
        match self.http.post(GENERATE_PATH, &probe, self.model_timeout).await {
            Ok(response) => match response.status() {
                StatusCode::OK => ModelStatus::available(),
                StatusCode::NOT_FOUND => ModelStatus::unavailable("Model not found"),
                other => ModelStatus::unavailable(format!(
                    "Model validation failed: status {}",
                    other.as_u16()
                )),
            },
            Err(e) => {
                error!("Model validation error: {}", e);
                ModelStatus::unavailable(format!("Model validation error: {}", e))
            }
        }
    }
}

/// Returns true if `model` appears in `installed`, either exactly or as
/// `model:<tag>`.
pub fn model_listed(installed: &[String], model: &str) -> bool {
    installed.iter().any(|name| {
        name == model
            || (!model.contains(':')
                && name
                    .strip_prefix(model)
                    .is_some_and(|rest| rest.starts_with(':')))
    })
}
