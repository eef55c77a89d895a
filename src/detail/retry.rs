//! Retry classification for detail page failures.
//!
//! Failures are classified into a [`FailureType`]:
//! - [`FailureType::Transient`] - Navigation or marker timeouts that may succeed on retry
//! - [`FailureType::Structural`] - Expected page regions absent; retrying cannot fix it
//! - [`FailureType::Validation`] - Content present but rejected; retrying cannot fix it
//!
//! The [`RetryPolicy`] then decides whether another attempt is made. The
//! backoff between attempts is fixed rather than exponential: the remote
//! pages either render within the marker timeout or they do not.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use article_harvester::{FailureType, RetryDecision, RetryPolicy};
//!
//! let policy = RetryPolicy::new(3, Duration::from_secs(2));
//! match policy.should_retry(FailureType::Transient, 1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         println!("Retrying in {:?} (attempt {})", delay, attempt);
//!     }
//!     RetryDecision::DoNotRetry { reason } => {
//!         println!("Not retrying: {}", reason);
//!     }
//! }
//! ```

use std::time::Duration;

use tracing::debug;

use crate::constants::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_BACKOFF};

/// Classification of detail page failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Timing failure that may succeed on retry.
    Transient,
    /// Page schema mismatch.
    Structural,
    /// Content quality reject.
    Validation,
}

/// Decision on whether to make another attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Attempt again after the specified delay.
    Retry {
        /// How long to wait before the next attempt.
        delay: Duration,
        /// Which attempt number this will be (1-indexed, so first retry is attempt 2).
        attempt: u32,
    },

    /// Stop attempting.
    DoNotRetry {
        /// Human-readable reason why no further attempt is made.
        reason: String,
    },
}

/// Attempt bound and fixed backoff for detail page rendering.
///
/// # Default Values
///
/// - `max_attempts`: 3
/// - `backoff`: 2 seconds
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,

    /// Sleep before every retry.
    backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_RETRY_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` is raised to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the fixed backoff.
    #[must_use]
    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Determines whether to attempt again.
    ///
    /// # Arguments
    ///
    /// * `failure_type` - Classification of the failure
    /// * `attempt` - The attempt number that just failed (1-indexed)
    #[must_use]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        match failure_type {
            FailureType::Structural => {
                return RetryDecision::DoNotRetry {
                    reason: "page structure mismatch - retry would not help".to_string(),
                };
            }
            FailureType::Validation => {
                return RetryDecision::DoNotRetry {
                    reason: "content rejected - retry would not help".to_string(),
                };
            }
            FailureType::Transient => {}
        }

        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        RetryDecision::Retry {
            delay: self.backoff,
            attempt: attempt + 1,
        }
    }
}
