//! HTTP layer for talking to a local Ollama-compatible inference server.
//!
//! Every call made through [`RetryableHttpClient`] carries its own deadline
//! and is retried on transient failures according to a [`RetryPolicy`], so
//! nothing built on top of this crate can block forever on a dead backend.

pub mod api;
mod client;
mod error;
mod retry;

pub use client::{HttpResponse, RetryableHttpClient, DEFAULT_CONNECT_TIMEOUT};
pub use error::HttpError;
pub use retry::{RetryPolicy, DEFAULT_RETRY_METHODS, DEFAULT_RETRY_STATUSES};

/// Re-exported so callers can name methods and status codes without
/// depending on reqwest directly.
pub use reqwest::{Method, StatusCode};

/// Default backend URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
