//! Transport-level error types.

use std::time::Duration;
use thiserror::Error;

/// Errors raised by [`crate::RetryableHttpClient`].
///
/// Only `Connection` and `Timeout` are transient and eligible for retry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HttpError {
    /// The backend could not be reached (refused, reset, DNS, ...).
    #[error("connection error: {0}")]
    Connection(String),

    /// The call exceeded its configured deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The request could not be built or its body serialized.
    #[error("invalid request: {0}")]
    Request(String),

    /// The response body could not be decoded.
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl HttpError {
    /// Returns true if retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }

    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if err.is_builder() {
            Self::Request(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Connection(describe(&err))
        }
    }
}

/// Error message with the innermost cause appended (e.g. "Connection refused").
fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    let mut root = None;
    while let Some(cause) = source {
        root = Some(cause.to_string());
        source = cause.source();
    }
    if let Some(root) = root {
        if !message.contains(&root) {
            message.push_str(": ");
            message.push_str(&root);
        }
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(HttpError::Connection("refused".into()).is_transient());
        assert!(HttpError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(!HttpError::Request("bad".into()).is_transient());
        assert!(!HttpError::Decode("eof".into()).is_transient());
    }

    #[test]
    fn test_timeout_display() {
        let err = HttpError::Timeout(Duration::from_secs(10));
        assert_eq!(err.to_string(), "request timed out after 10s");
    }
}
