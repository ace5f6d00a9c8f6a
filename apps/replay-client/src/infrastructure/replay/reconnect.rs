//! Retry Policy
//!
//! Fixed-interval retry timing for the connection supervisor.
//!
//! The interval never grows: every retry waits the same configured duration
//! (3 seconds unless overridden), with no jitter and no attempt cap. A feed
//! stuck behind a dead server retries forever at a steady rate. Retrying
//! arms only after a connection has been open at least once; the supervisor
//! gives up outright when the very first connect fails.

use std::time::Duration;

/// Default wait between retry attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(3);

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Wait between consecutive connect attempts.
    pub interval: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}

impl RetryConfig {
    /// Create a configuration with a custom interval.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

/// Retry bookkeeping for one supervisor.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
///
/// use replay_client::infrastructure::replay::reconnect::{RetryConfig, RetryPolicy};
///
/// let mut policy = RetryPolicy::new(RetryConfig::new(Duration::from_secs(3)));
///
/// assert_eq!(policy.record_attempt(), 1);
/// assert_eq!(policy.interval(), Duration::from_secs(3));
///
/// // A successful connection clears the counter.
/// policy.reset();
/// assert_eq!(policy.attempt_count(), 0);
/// ```
#[derive(Debug)]
pub struct RetryPolicy {
    config: RetryConfig,
    attempt_count: u32,
}

impl RetryPolicy {
    /// Create a new retry policy.
    #[must_use]
    pub const fn new(config: RetryConfig) -> Self {
        Self {
            config,
            attempt_count: 0,
        }
    }

    /// Record the next attempt and return its 1-based number.
    pub const fn record_attempt(&mut self) -> u32 {
        self.attempt_count += 1;
        self.attempt_count
    }

    /// The wait before every attempt. Constant by policy.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.config.interval
    }

    /// Attempts made since the last reset.
    #[must_use]
    pub const fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    /// Reset after a successful connection.
    pub const fn reset(&mut self) {
        self.attempt_count = 0;
    }
}
