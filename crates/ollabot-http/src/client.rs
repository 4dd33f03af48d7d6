//! HTTP client with bounded retries and per-call deadlines.

use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::HttpError;
use crate::retry::RetryPolicy;

/// Deadline for establishing a TCP connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the inference backend.
///
/// Holds a pooled `reqwest::Client`; the only state that survives a call is
/// that connection pool.
#[derive(Debug, Clone)]
pub struct RetryableHttpClient {
    client: reqwest::Client,
    base_url: String,
    policy: RetryPolicy,
}

/// A fully buffered response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl HttpResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        serde_json::from_str(&self.body).map_err(|e| HttpError::Decode(e.to_string()))
    }
}

impl RetryableHttpClient {
    /// Create a client for `base_url` with the given retry policy.
    pub fn new(base_url: impl Into<String>, policy: RetryPolicy) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| HttpError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            policy,
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a GET to `path`.
    pub async fn get(&self, path: &str, timeout: Duration) -> Result<HttpResponse, HttpError> {
        self.execute(Method::GET, path, None, timeout).await
    }

    /// Issue a HEAD to `path`.
    pub async fn head(&self, path: &str, timeout: Duration) -> Result<HttpResponse, HttpError> {
        self.execute(Method::HEAD, path, None, timeout).await
    }

    /// Issue a GET and decode a successful JSON body.
    ///
    /// Non-2xx statuses are reported as [`HttpError::Decode`] with the status.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        timeout: Duration,
    ) -> Result<T, HttpError> {
        let response = self.get(path, timeout).await?;
        if !response.is_success() {
            return Err(HttpError::Decode(format!(
                "unexpected status {} from {}",
                response.status().as_u16(),
                path
            )));
        }
        response.json()
    }

    /// Issue a POST with a JSON body.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<HttpResponse, HttpError> {
        let bytes = serde_json::to_vec(body).map_err(|e| HttpError::Request(e.to_string()))?;
        self.execute(Method::POST, path, Some(bytes), timeout).await
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        timeout: Duration,
    ) -> Result<HttpResponse, HttpError> {
        let url = format!("{}{}", self.base_url, path);
        let replayable = self.policy.allows_method(&method);
        let mut retries = 0;

        loop {
            let outcome = self.send_once(&method, &url, body.as_deref(), timeout).await;
            let can_retry = replayable && retries < self.policy.max_retries;

            let delay = match &outcome {
                Ok(response) if can_retry && self.policy.is_retry_status(response.status) => {
                    retries += 1;
                    let delay =
                        self.policy
                            .delay_after_status(retries, response.status, &response.headers);
                    warn!(
                        "{} {} returned {}, retry {}/{} in {:?}",
                        method,
                        url,
                        response.status.as_u16(),
                        retries,
                        self.policy.max_retries,
                        delay
                    );
                    Some(delay)
                }
                Err(err) if can_retry && err.is_transient() => {
                    retries += 1;
                    let delay = self.policy.backoff(retries);
                    warn!(
                        "{} {} failed ({}), retry {}/{} in {:?}",
                        method, url, err, retries, self.policy.max_retries, delay
                    );
                    Some(delay)
                }
                _ => None,
            };

            match delay {
                Some(delay) => sleep(delay).await,
                None => return outcome,
            }
        }
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &str,
        body: Option<&[u8]>,
        timeout: Duration,
    ) -> Result<HttpResponse, HttpError> {
        let mut request = self.client.request(method.clone(), url).timeout(timeout);
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(body.to_vec());
        }

        let response = request
            .send()
            .await
            .map_err(|e| HttpError::from_reqwest(e, timeout))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|e| HttpError::from_reqwest(e, timeout))?;

        debug!("{} {} -> {}", method, url, status.as_u16());

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
