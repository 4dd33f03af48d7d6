//! Error types for building the chat pipeline.

use ollabot_http::HttpError;
use thiserror::Error;

/// Errors raised while constructing chat components.
///
/// Turns themselves never fail with this type; they return a
/// [`crate::GenerationResult`].
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("HTTP client error: {0}")]
    Http(#[from] HttpError),

    #[error("{name} must be a number between 0 and 1, got {value}")]
    InvalidSampling { name: &'static str, value: f32 },
}
