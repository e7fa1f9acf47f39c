//! Retry utilities for directory write operations with exponential backoff.
//!
//! Modify operations against a busy directory server can fail with
//! transient conditions (server busy, temporarily unavailable, timeouts).
//! This module provides the backoff schedule and the policy that decides
//! which failures are worth retrying; the directory client drives the
//! actual loop because retries need the mutable connection handle.

#![allow(dead_code)]

use std::time::Duration;

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial attempt)
    pub max_attempts: u32,

    /// Initial delay between retries
    pub initial_delay: Duration,

    /// Maximum delay between retries (for exponential backoff)
    pub max_delay: Duration,

    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,

    /// Whether to add jitter to prevent thundering herd
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Delay to sleep before retrying after the given (0-based) attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt as i32);
        let raw = Duration::from_millis((self.initial_delay.as_millis() as f64 * factor) as u64);
        let capped = std::cmp::min(raw, self.max_delay);
        if self.jitter { add_jitter(capped) } else { capped }
    }
}

/// Policy for determining if an operation should be retried
pub trait RetryPolicy<E> {
    /// Returns true if the operation should be retried for this error
    fn should_retry(&self, error: &E, attempt: u32) -> bool;
}

/// Retry policy for directory modify operations.
///
/// LDAP result codes surface in the client error text ("busy",
/// "unavailable", ...); transient transport failures surface as
/// connection/timeout messages.
pub struct DirectoryRetryPolicy;

impl<E> RetryPolicy<E> for DirectoryRetryPolicy
where
    E: std::error::Error,
{
    fn should_retry(&self, error: &E, attempt: u32) -> bool {
        if attempt >= 2 {
            return false;
        }

        let error_str = error.to_string().to_lowercase();

        error_str.contains("busy")
            || error_str.contains("unavailable")
            || error_str.contains("timeout")
            || error_str.contains("timed out")
            || error_str.contains("connection reset")
            || error_str.contains("connection refused")
            || error_str.contains("broken pipe")
    }
}

/// Add random jitter to prevent thundering herd problems
fn add_jitter(delay: Duration) -> Duration {
    use rand::Rng;

    let jitter_range = delay.as_millis() as f64 * 0.1; // 10% jitter
    let mut rng = rand::rng();
    let jitter: f64 = rng.random_range(-jitter_range..=jitter_range);

    let jittered_ms = (delay.as_millis() as f64 + jitter).max(0.0) as u64;
    Duration::from_millis(jittered_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct TextError(&'static str);

    impl fmt::Display for TextError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    impl std::error::Error for TextError {}

    #[test]
    fn transient_errors_are_retried() {
        let policy = DirectoryRetryPolicy;
        assert!(policy.should_retry(&TextError("rc=51 (busy)"), 0));
        assert!(policy.should_retry(&TextError("server unavailable"), 1));
        assert!(policy.should_retry(&TextError("operation timed out"), 0));
    }

    #[test]
    fn permanent_errors_are_not_retried() {
        let policy = DirectoryRetryPolicy;
        assert!(!policy.should_retry(&TextError("rc=50 (insufficientAccessRights)"), 0));
        assert!(!policy.should_retry(&TextError("no such object"), 0));
    }

    #[test]
    fn attempts_are_capped() {
        let policy = DirectoryRetryPolicy;
        assert!(!policy.should_retry(&TextError("busy"), 2));
    }

    #[test]
    fn backoff_grows_and_caps() {
        let config = RetryConfig {
            jitter: false,
            ..Default::default()
        };
        let d0 = config.delay_for(0);
        let d1 = config.delay_for(1);
        assert_eq!(d0, Duration::from_millis(250));
        assert_eq!(d1, Duration::from_millis(500));
        // Far-out attempts stay capped at max_delay.
        assert_eq!(config.delay_for(20), config.max_delay);
    }

    #[test]
    fn jitter_stays_near_base() {
        let config = RetryConfig::default();
        let base = Duration::from_millis(250);
        for _ in 0..20 {
            let d = config.delay_for(0);
            let diff = d.abs_diff(base);
            assert!(diff <= Duration::from_millis(30), "jitter too large: {d:?}");
        }
    }
}
