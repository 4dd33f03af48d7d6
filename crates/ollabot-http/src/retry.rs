//! Retry policy: which failures are retried and how long to wait in between.

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use std::time::Duration;

/// Statuses that indicate a transient backend condition.
pub const DEFAULT_RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Methods that may be replayed.
pub const DEFAULT_RETRY_METHODS: [Method; 3] = [Method::GET, Method::HEAD, Method::POST];

/// Bounded exponential-backoff retry configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt (total attempts = `max_retries + 1`).
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each subsequent one.
    pub backoff_factor: Duration,
    /// Upper bound on any single delay, including `Retry-After`.
    pub backoff_max: Duration,
    /// Response statuses that trigger a retry.
    pub retry_statuses: Vec<u16>,
    /// Methods eligible for retry.
    pub retry_methods: Vec<Method>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_factor: Duration::from_secs(1),
            backoff_max: Duration::from_secs(120),
            retry_statuses: DEFAULT_RETRY_STATUSES.to_vec(),
            retry_methods: DEFAULT_RETRY_METHODS.to_vec(),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_backoff_factor(mut self, factor: Duration) -> Self {
        self.backoff_factor = factor;
        self
    }

    pub fn with_backoff_max(mut self, max: Duration) -> Self {
        self.backoff_max = max;
        self
    }

    /// Delay before retry number `retry` (1-based): `factor * 2^(retry-1)`,
    /// capped at `backoff_max`.
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let exponent = (retry - 1).min(31);
        self.backoff_factor
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.backoff_max)
            .min(self.backoff_max)
    }

    /// Sum of all backoff delays when every retry is used.
    pub fn total_backoff(&self) -> Duration {
        (1..=self.max_retries).map(|n| self.backoff(n)).sum()
    }

    /// Returns true if requests with this method may be retried.
    pub fn allows_method(&self, method: &Method) -> bool {
        self.retry_methods.iter().any(|m| m == method)
    }

    /// Returns true if this status should be retried.
    pub fn is_retry_status(&self, status: StatusCode) -> bool {
        self.retry_statuses.contains(&status.as_u16())
    }

    /// Delay to use before retry `retry` after a response with `status`.
    ///
    /// A `Retry-After` header is honored on 429 and 503.
    pub(crate) fn delay_after_status(
        &self,
        retry: u32,
        status: StatusCode,
        headers: &HeaderMap,
    ) -> Duration {
        let honors_header = matches!(
            status,
            StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE
        );
        match retry_after(headers) {
            Some(delay) if honors_header => delay.min(self.backoff_max),
            _ => self.backoff(retry),
        }
    }
}

/// Parse an integer-seconds `Retry-After` header.
pub(crate) fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_secs(1));
        assert_eq!(policy.backoff(2), Duration::from_secs(2));
        assert_eq!(policy.backoff(3), Duration::from_secs(4));
    }

    #[test]
    fn test_total_backoff_for_three_retries() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.total_backoff(), Duration::from_secs(7));
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy::default().with_backoff_max(Duration::from_secs(3));
        assert_eq!(policy.backoff(3), Duration::from_secs(3));
        assert_eq!(policy.backoff(40), Duration::from_secs(3));
    }

    #[test]
    fn test_retry_statuses() {
        let policy = RetryPolicy::default();
        for code in [429, 500, 502, 503, 504] {
            assert!(policy.is_retry_status(StatusCode::from_u16(code).unwrap()));
        }
        for code in [200, 400, 401, 404, 501] {
            assert!(!policy.is_retry_status(StatusCode::from_u16(code).unwrap()));
        }
    }

    #[test]
    fn test_retry_methods() {
        let policy = RetryPolicy::default();
        assert!(policy.allows_method(&Method::GET));
        assert!(policy.allows_method(&Method::HEAD));
        assert!(policy.allows_method(&Method::POST));
        assert!(!policy.allows_method(&Method::DELETE));
    }

    #[test]
    fn test_retry_after_only_on_429_and_503() {
        let policy = RetryPolicy::default();
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("5"));

        assert_eq!(
            policy.delay_after_status(1, StatusCode::TOO_MANY_REQUESTS, &headers),
            Duration::from_secs(5)
        );
        assert_eq!(
            policy.delay_after_status(1, StatusCode::SERVICE_UNAVAILABLE, &headers),
            Duration::from_secs(5)
        );
        assert_eq!(
            policy.delay_after_status(1, StatusCode::BAD_GATEWAY, &headers),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn test_retry_after_ignores_http_dates() {
        let mut headers = HeaderMap::new();
        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(retry_after(&headers), None);
    }

    #[test]
    fn test_none_policy() {
        assert_eq!(RetryPolicy::none().total_backoff(), Duration::ZERO);
    }
}
