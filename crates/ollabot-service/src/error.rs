//! Error types for service operations that return data rather than a status.

use ollabot_http::HttpError;
use thiserror::Error;

/// Errors from querying the backend outside the status checks.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// Backend answered with a non-2xx status.
    #[error("backend returned status {0}")]
    UnexpectedStatus(u16),
}
