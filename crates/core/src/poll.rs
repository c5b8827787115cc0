//! Polling and retry policy for remote tasks.
//!
//! The status endpoint is queried on a fixed interval until the task
//! reaches a terminal state. Transient transport failures during a
//! single query are retried with exponential backoff, bounded by
//! [`RetryConfig::max_retries`].

use std::time::Duration;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Interval between status queries for a single job.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Interval between rounds when many jobs are polled together.
pub const BATCH_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Upper bound on how long a poll waits for a terminal state.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Retries of a single status query before giving up.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

// ---------------------------------------------------------------------------
// Retry
// ---------------------------------------------------------------------------

/// Tunable parameters for the exponential-backoff strategy applied to
/// retryable status-query failures.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first failed attempt. `0` disables retrying.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on the delay between retries.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }
}

/// Calculate the next backoff delay from the current delay and config.
///
/// The result is clamped to [`RetryConfig::max_delay`].
pub fn next_delay(current: Duration, config: &RetryConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

// ---------------------------------------------------------------------------
// Poll
// ---------------------------------------------------------------------------

/// How a task poller paces itself and when it gives up.
#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    /// Fixed sleep between status queries.
    pub interval: Duration,
    /// Deadline measured from the start of the poll. `None` polls until
    /// a terminal state is seen or the poll is cancelled.
    pub timeout: Option<Duration>,
    pub retry: RetryConfig,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: Some(DEFAULT_POLL_TIMEOUT),
            retry: RetryConfig::default(),
        }
    }
}

impl PollConfig {
    /// Defaults tuned for polling many pending jobs in one loop.
    pub fn batch() -> Self {
        Self {
            interval: BATCH_POLL_INTERVAL,
            ..Default::default()
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_delay_doubles() {
        let config = RetryConfig::default();
        let d = next_delay(Duration::from_secs(1), &config);
        assert_eq!(d, Duration::from_secs(2));
    }

    #[test]
    fn next_delay_clamps_at_max() {
        let config = RetryConfig {
            max_delay: Duration::from_secs(10),
            ..Default::default()
        };
        let d = next_delay(Duration::from_secs(8), &config);
        assert_eq!(d, Duration::from_secs(10));
    }

    #[test]
    fn full_backoff_sequence() {
        let config = RetryConfig::default();
        let mut delay = config.initial_delay;
        let expected = [1, 2, 4, 8, 16, 30, 30];

        for &expected_secs in &expected {
            assert_eq!(delay.as_secs(), expected_secs);
            delay = next_delay(delay, &config);
        }
    }

    #[test]
    fn default_poll_is_bounded() {
        let config = PollConfig::default();
        assert_eq!(config.interval, Duration::from_secs(10));
        assert_eq!(config.timeout, Some(DEFAULT_POLL_TIMEOUT));
    }

    #[test]
    fn batch_poll_uses_short_interval() {
        assert_eq!(PollConfig::batch().interval, Duration::from_secs(1));
    }

    #[test]
    fn builder_overrides_fields() {
        let config = PollConfig::default()
            .with_interval(Duration::from_millis(50))
            .with_timeout(None)
            .with_retry(RetryConfig::none());
        assert_eq!(config.interval, Duration::from_millis(50));
        assert!(config.timeout.is_none());
        assert_eq!(config.retry.max_retries, 0);
    }
}
