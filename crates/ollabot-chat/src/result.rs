//! Outcome of a chat turn.

use std::fmt;

use crate::request::ConversationContext;

/// Why a turn failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Reachability check failed.
    ServiceUnavailable,
    /// Model check failed, including a missing model.
    ModelUnavailable,
    /// Backend rejected the request as malformed (400).
    InvalidRequest,
    /// Any other non-200 status.
    UnexpectedStatus,
    /// Network failure or timeout while generating.
    ConnectionFailed,
    /// 200 with a body that is not a generation reply.
    MalformedResponse,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ServiceUnavailable => "service unavailable",
            Self::ModelUnavailable => "model unavailable",
            Self::InvalidRequest => "invalid request",
            Self::UnexpectedStatus => "unexpected status",
            Self::ConnectionFailed => "connection failed",
            Self::MalformedResponse => "malformed response",
        };
        f.write_str(label)
    }
}

/// Exactly one of these is produced per turn.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResult {
    Success {
        text: String,
        context: Option<ConversationContext>,
    },
    Failure {
        kind: ErrorKind,
        detail: String,
    },
}

impl GenerationResult {
    pub fn success(text: impl Into<String>) -> Self {
        Self::Success {
            text: text.into(),
            context: None,
        }
    }

    pub fn failure(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            detail: detail.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Generated text, if the turn succeeded.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Success { text, .. } => Some(text),
            Self::Failure { .. } => None,
        }
    }

    /// Failure kind, if the turn failed.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }
}

impl fmt::Display for GenerationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { text, .. } => f.write_str(text),
            Self::Failure { detail, .. } => write!(f, "Error: {}", detail),
        }
    }
}
