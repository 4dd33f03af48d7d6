//! Installation and connectivity diagnosis.

use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

use crate::health::{model_listed, BackendHealthChecker, HealthCheck};

/// Locate `binary` on `PATH`.
pub fn find_binary(binary: &str) -> Option<PathBuf> {
    match which::which(binary) {
        Ok(path) => Some(path),
        Err(e) => {
            debug!("{} not found on PATH: {}", binary, e);
            None
        }
    }
}

/// Outcome of each diagnostic step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnosis {
    /// Path of the backend executable, if found.
    pub binary_path: Option<PathBuf>,
    /// Whether the status endpoint answered 200.
    pub reachable: bool,
    /// Reachability diagnostic.
    pub connection_message: String,
    /// `None` when models could not be listed, either because the backend
    /// was unreachable or because the listing itself failed.
    pub model_listed: Option<bool>,
    /// Why listing failed on a reachable backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_error: Option<String>,
}

impl Diagnosis {
    pub fn installed(&self) -> bool {
        self.binary_path.is_some()
    }

    pub fn is_healthy(&self) -> bool {
        self.installed() && self.reachable && self.model_listed == Some(true)
    }

    /// Suggested fixes for every failed step, in the order they should be tried.
    pub fn remedies(&self, binary: &str, model: &str) -> Vec<String> {
        let mut steps = Vec::new();
        if !self.installed() {
            steps.push(format!(
                "Install {}: curl -fsSL https://ollama.com/install.sh | sh",
                binary
            ));
        }
        if !self.reachable {
            steps.push(format!("Start the server: {} serve", binary));
        }
        if self.model_listed == Some(false) {
            steps.push(format!("Download the model: {} pull {}", binary, model));
        }
        steps
    }
}

/// Check installation, connectivity and whether `model` is installed.
///
/// Models are listed only if the backend is reachable.
pub async fn diagnose(checker: &BackendHealthChecker, binary: &str, model: &str) -> Diagnosis {
    let binary_path = find_binary(binary);
    let status = checker.check_reachability().await;

    let (model_listed, listing_error) = if status.reachable {
        match checker.installed_models().await {
            Ok(models) => (Some(model_listed(&models, model)), None),
            Err(e) => {
                debug!("Could not list models: {}", e);
                (None, Some(e.to_string()))
            }
        }
    } else {
        (None, None)
    };

    Diagnosis {
        binary_path,
        reachable: status.reachable,
        connection_message: status.message,
        model_listed,
        listing_error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagnosis(installed: bool, reachable: bool, listed: Option<bool>) -> Diagnosis {
        Diagnosis {
            binary_path: installed.then(|| PathBuf::from("/usr/local/bin/ollama")),
            reachable,
            connection_message: String::new(),
            model_listed: listed,
            listing_error: None,
        }
    }

    #[test]
    fn test_healthy_has_no_remedies() {
        let d = diagnosis(true, true, Some(true));
        assert!(d.is_healthy());
        assert!(d.remedies("ollama", "mistral").is_empty());
    }

    #[test]
    fn test_remedies_in_order() {
        let d = diagnosis(false, false, None);
        let steps = d.remedies("ollama", "mistral");
        assert_eq!(steps.len(), 2);
        assert!(steps[0].starts_with("Install ollama"));
        assert_eq!(steps[1], "Start the server: ollama serve");
    }

    #[test]
    fn test_missing_model_remedy() {
        let d = diagnosis(true, true, Some(false));
        assert!(!d.is_healthy());
        assert_eq!(
            d.remedies("ollama", "mistral"),
            vec!["Download the model: ollama pull mistral"]
        );
    }

    #[test]
    fn test_unknown_listing_suggests_no_pull() {
        let d = diagnosis(true, true, None);
        assert!(!d.is_healthy());
        assert!(d.remedies("ollama", "mistral").is_empty());
    }

    #[test]
    fn test_find_binary_missing() {
        assert!(find_binary("ollabot-definitely-not-a-real-binary").is_none());
    }
}
