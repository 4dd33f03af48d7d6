//! Consecutive-failure tracking across turns.

use std::fmt;

use crate::result::GenerationResult;

/// Failures in a row before the user is warned.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// Raised once when consecutive failures reach the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureWarning {
    pub consecutive: u32,
}

impl fmt::Display for FailureWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} errors in a row. Check your connection or consider restarting the service.",
            self.consecutive
        )
    }
}

/// Counts failed turns since the last success.
#[derive(Debug, Clone)]
pub struct FailureTracker {
    consecutive: u32,
    threshold: u32,
}

impl Default for FailureTracker {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_THRESHOLD)
    }
}

impl FailureTracker {
    /// A threshold of zero is treated as one.
    pub fn new(threshold: u32) -> Self {
        Self {
            consecutive: 0,
            threshold: threshold.max(1),
        }
    }

    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Update the count with a turn's result.
    ///
    /// Returns a warning only on the failure that reaches the threshold;
    /// further failures stay silent until a success resets the count.
    pub fn record(&mut self, result: &GenerationResult) -> Option<FailureWarning> {
        if result.is_success() {
            self.consecutive = 0;
            return None;
        }

        self.consecutive = self.consecutive.saturating_add(1);
        (self.consecutive == self.threshold).then_some(FailureWarning {
            consecutive: self.consecutive,
        })
    }

    pub fn reset(&mut self) {
        self.consecutive = 0;
    }
}
