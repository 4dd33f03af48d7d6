//! Wire types for the backend's HTTP API.

use serde::{Deserialize, Serialize};

/// Model listing endpoint, also used as the reachability probe.
pub const TAGS_PATH: &str = "/api/tags";

/// Non-streaming generation endpoint.
pub const GENERATE_PATH: &str = "/api/generate";

/// Request body for `POST /api/generate`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GenerateBody {
    pub model: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Vec<i64>>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerateOptions>,
}

impl GenerateBody {
    /// The smallest request that exercises model loading.
    pub fn probe(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: "test".to_string(),
            system: None,
            context: None,
            stream: false,
            options: None,
        }
    }
}

/// Sampling options.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct GenerateOptions {
    pub temperature: f32,
    pub top_p: f32,
}

/// Successful response from `POST /api/generate`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateReply {
    pub response: String,
    #[serde(default)]
    pub context: Option<Vec<i64>>,
    #[serde(default)]
    pub done: bool,
}

/// Error payload returned with 4xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorReply {
    pub error: String,
}

/// Response from `GET /api/tags`.
#[derive(Debug, Clone, Deserialize)]
pub struct TagsReply {
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelEntry {
    pub name: String,
}
