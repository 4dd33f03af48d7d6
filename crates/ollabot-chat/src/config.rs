//! Chat client configuration.

use ollabot_http::{RetryPolicy, DEFAULT_BASE_URL};
use ollabot_service::{
    RecoveryConfig, DEFAULT_MODEL, DEFAULT_MODEL_TIMEOUT, DEFAULT_REACHABILITY_TIMEOUT,
};
use std::path::PathBuf;
use std::time::Duration;

use crate::failure::DEFAULT_FAILURE_THRESHOLD;
use crate::request::SamplingParameters;

/// Deadline for a generation call.
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// System prompt used when none is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful and honest AI assistant. Give short, clear answers.";

/// Configuration for the chat client.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Backend URL (default: http://localhost:11434)
    pub base_url: String,
    /// Model to chat with (default: mistral)
    pub model: String,
    /// System prompt sent with every turn
    pub system_prompt: String,
    /// Initial sampling parameters
    pub sampling: SamplingParameters,
    /// Retry behavior for every backend call
    pub retry: RetryPolicy,
    pub reachability_timeout: Duration,
    pub model_timeout: Duration,
    pub generation_timeout: Duration,
    /// Consecutive failures before the user is warned
    pub failure_threshold: u32,
    /// How to restart the backend
    pub recovery: RecoveryConfig,
    /// Log file; `None` disables file logging
    pub log_file: Option<PathBuf>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            sampling: SamplingParameters::default(),
            retry: RetryPolicy::default(),
            reachability_timeout: DEFAULT_REACHABILITY_TIMEOUT,
            model_timeout: DEFAULT_MODEL_TIMEOUT,
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            recovery: RecoveryConfig::default(),
            log_file: Some(PathBuf::from("ollabot.log")),
        }
    }
}

impl ChatConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable source.
    ///
    /// Unparseable numbers fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let temperature = var("OLLABOT_TEMPERATURE")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.sampling.temperature());
        let top_p = var("OLLABOT_TOP_P")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.sampling.top_p());

        let use_sudo = !var("OLLABOT_NO_SUDO")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        // Set but empty disables file logging.
        let log_file = match lookup("OLLABOT_LOG_FILE") {
            Some(path) if path.trim().is_empty() => None,
            Some(path) => Some(PathBuf::from(path)),
            None => defaults.log_file.clone(),
        };

        Self {
            base_url: var("OLLABOT_URL").unwrap_or(defaults.base_url),
            model: var("OLLABOT_MODEL").unwrap_or(defaults.model),
            system_prompt: var("OLLABOT_SYSTEM_PROMPT").unwrap_or(defaults.system_prompt),
            sampling: SamplingParameters::clamped(temperature, top_p),
            recovery: RecoveryConfig {
                service_unit: var("OLLABOT_SERVICE_UNIT")
                    .unwrap_or(defaults.recovery.service_unit),
                binary: var("OLLABOT_BINARY").unwrap_or(defaults.recovery.binary),
                use_sudo,
                ..defaults.recovery
            },
            log_file,
            ..defaults
        }
    }

    /// Create a builder for configuration.
    pub fn builder() -> ChatConfigBuilder {
        ChatConfigBuilder::default()
    }
}

/// Builder for chat configuration.
#[derive(Debug, Default)]
pub struct ChatConfigBuilder {
    config: ChatConfig,
}

impl ChatConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    pub fn sampling(mut self, sampling: SamplingParameters) -> Self {
        self.config.sampling = sampling;
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    pub fn reachability_timeout(mut self, timeout: Duration) -> Self {
        self.config.reachability_timeout = timeout;
        self
    }

    pub fn model_timeout(mut self, timeout: Duration) -> Self {
        self.config.model_timeout = timeout;
        self
    }

    pub fn generation_timeout(mut self, timeout: Duration) -> Self {
        self.config.generation_timeout = timeout;
        self
    }

    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.config.failure_threshold = threshold;
        self
    }

    pub fn recovery(mut self, recovery: RecoveryConfig) -> Self {
        self.config.recovery = recovery;
        self
    }

    pub fn log_file(mut self, path: Option<PathBuf>) -> Self {
        self.config.log_file = path;
        self
    }

    pub fn build(self) -> ChatConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ChatConfig::from_lookup(lookup(&[]));
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.model, "mistral");
        assert_eq!(config.generation_timeout, Duration::from_secs(30));
        assert_eq!(config.failure_threshold, 3);
        assert!(config.recovery.use_sudo);
        assert_eq!(config.log_file, Some(PathBuf::from("ollabot.log")));
    }

    #[test]
    fn test_env_overrides() {
        let config = ChatConfig::from_lookup(lookup(&[
            ("OLLABOT_URL", "http://gpu-box:11434"),
            ("OLLABOT_MODEL", "llama3"),
            ("OLLABOT_TEMPERATURE", "0.2"),
            ("OLLABOT_SERVICE_UNIT", "ollama-gpu"),
            ("OLLABOT_NO_SUDO", "true"),
            ("OLLABOT_LOG_FILE", ""),
        ]));
        assert_eq!(config.base_url, "http://gpu-box:11434");
        assert_eq!(config.model, "llama3");
        assert_eq!(config.sampling.temperature(), 0.2);
        assert_eq!(config.recovery.service_unit, "ollama-gpu");
        assert!(!config.recovery.use_sudo);
        assert_eq!(config.log_file, None);
    }

    #[test]
    fn test_bad_sampling_values() {
        let config = ChatConfig::from_lookup(lookup(&[
            ("OLLABOT_TEMPERATURE", "warm"),
            ("OLLABOT_TOP_P", "7"),
        ]));
        assert_eq!(config.sampling.temperature(), 0.7);
        assert_eq!(config.sampling.top_p(), 1.0);
    }

    #[test]
    fn test_builder() {
        let config = ChatConfig::builder()
            .model("phi3")
            .failure_threshold(5)
            .log_file(None)
            .build();
        assert_eq!(config.model, "phi3");
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.log_file, None);
    }
}
