//! Retry policy for the rate-limit condition.
//!
//! The API throttles callers by answering with a regular envelope whose
//! `errorMessage` mentions the rate limit. Those calls are repeated after a fixed
//! delay until the attempt budget runs out. Nothing else is ever retried.

use crate::Error;
use std::time::Duration;

/// Delay between attempts unless configured otherwise.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(250);

/// Defines how many times a rate-limited call is sent and how long to wait in between.
///
/// # Examples
///
/// ```
/// use hasoffers::RetryPolicy;
/// use std::time::Duration;
///
/// // Up to three attempts, 250ms apart
/// let policy = RetryPolicy::new(3);
/// assert_eq!(policy.max_attempts(), 3);
/// assert_eq!(policy.delay(), Duration::from_millis(250));
///
/// // A single attempt: never retry
/// let once = RetryPolicy::default();
/// assert_eq!(once.max_attempts(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: usize,
    delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy allowing `max_attempts` sends in total.
    ///
    /// Values below one are treated as one.
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Replaces the fixed delay between attempts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Returns the delay before sending again, or `None` if the error must surface.
    ///
    /// # Arguments
    ///
    /// * `error` - The classified error of the attempt that just finished
    /// * `attempts` - How many attempts have been made so far (1-indexed)
    pub fn delay_after(&self, error: &Error, attempts: usize) -> Option<Duration> {
        if error.is_rate_limited() && self.max_attempts > 1 && attempts < self.max_attempts {
            Some(self.delay)
        } else {
            None
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(1)
    }
}
