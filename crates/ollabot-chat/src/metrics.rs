//! Per-session usage metrics.

use chrono::{DateTime, Local};
use std::time::Duration;

/// One completed turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSample {
    pub timestamp: DateTime<Local>,
    pub elapsed: Duration,
    pub success: bool,
}

/// Running totals and the response-time series for a session.
#[derive(Debug, Clone, Default)]
pub struct SessionMetrics {
    samples: Vec<ResponseSample>,
    successful: usize,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a turn that took `elapsed`.
    pub fn record(&mut self, elapsed: Duration, success: bool) {
        self.record_at(Local::now(), elapsed, success);
    }

    pub fn record_at(&mut self, timestamp: DateTime<Local>, elapsed: Duration, success: bool) {
        if success {
            self.successful += 1;
        }
        self.samples.push(ResponseSample {
            timestamp,
            elapsed,
            success,
        });
    }

    pub fn total_queries(&self) -> usize {
        self.samples.len()
    }

    pub fn successful_queries(&self) -> usize {
        self.successful
    }

    /// Mean response time; zero when nothing has been recorded.
    pub fn average_response_time(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.samples.iter().map(|s| s.elapsed).sum();
        total / self.samples.len() as u32
    }

    /// Percentage of successful turns; zero when nothing has been recorded.
    pub fn success_rate(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.successful as f64 / self.samples.len() as f64 * 100.0
    }

    /// Samples in recording order.
    pub fn history(&self) -> &[ResponseSample] {
        &self.samples
    }
}
