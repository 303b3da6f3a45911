//! Retry policy and exponential backoff for registry requests

use std::time::Duration;

/// Transient failures tolerated per page before the run fails
pub const DEFAULT_MAX_RETRIES: u32 = 6;

/// First backoff step; doubles on every further attempt
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(800);

/// Fixed wait after an HTTP 429
pub const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(2);

/// Exponential backoff: `base * 2^(attempt-1)` (0.8s, 1.6s, 3.2s, ... for the default base)
pub fn backoff_duration(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor)
}

/// How the fetch loop reacts to failed requests.
///
/// Transient failures (connection errors, 5xx) back off exponentially and
/// give up after `max_retries`. Rate limiting (429) waits a fixed
/// `rate_limit_wait` and is not counted against `max_retries`; it is
/// unbounded unless `max_rate_limit_waits` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub rate_limit_wait: Duration,
    pub max_rate_limit_waits: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: DEFAULT_BACKOFF_BASE,
            rate_limit_wait: DEFAULT_RATE_LIMIT_WAIT,
            max_rate_limit_waits: None,
        }
    }
}

impl RetryPolicy {
    /// Policy with every sleep set to zero (tests, local mocks)
    pub fn immediate() -> Self {
        Self {
            backoff_base: Duration::ZERO,
            rate_limit_wait: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Sleep before transient retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        backoff_duration(self.backoff_base, attempt)
    }

    /// Whether another 429 wait is allowed after `waits` so far on this page
    pub fn allows_rate_limit_wait(&self, waits: u32) -> bool {
        self.max_rate_limit_waits.is_none_or(|max| waits < max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_exponential() {
        let base = Duration::from_millis(800);
        assert_eq!(backoff_duration(base, 1), Duration::from_millis(800));
        assert_eq!(backoff_duration(base, 2), Duration::from_millis(1600));
        assert_eq!(backoff_duration(base, 3), Duration::from_millis(3200));
    }

    #[test]
    fn backoff_attempt_zero_is_base() {
        let base = Duration::from_secs(1);
        assert_eq!(backoff_duration(base, 0), base);
    }

    #[test]
    fn backoff_saturates() {
        let d = backoff_duration(Duration::from_secs(u64::MAX / 2), 40);
        assert_eq!(d, Duration::MAX);
    }

    #[test]
    fn default_policy_matches_registry_session() {
        let p = RetryPolicy::default();
        assert_eq!(p.max_retries, 6);
        assert_eq!(p.rate_limit_wait, Duration::from_secs(2));
        assert!(p.max_rate_limit_waits.is_none());
    }

    #[test]
    fn unbounded_rate_limit_always_allows() {
        let p = RetryPolicy::default();
        assert!(p.allows_rate_limit_wait(0));
        assert!(p.allows_rate_limit_wait(u32::MAX - 1));
    }

    #[test]
    fn bounded_rate_limit_stops() {
        let p = RetryPolicy {
            max_rate_limit_waits: Some(2),
            ..RetryPolicy::default()
        };
        assert!(p.allows_rate_limit_wait(1));
        assert!(!p.allows_rate_limit_wait(2));
    }

    #[test]
    fn immediate_policy_has_no_sleeps() {
        let p = RetryPolicy::immediate();
        assert_eq!(p.backoff(5), Duration::ZERO);
        assert_eq!(p.rate_limit_wait, Duration::ZERO);
    }
}
