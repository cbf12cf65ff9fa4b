//! Retry budget and backoff schedule

use std::time::Duration;

/// Default attempt budget per `execute` call.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay; attempt `n` (zero-based) waits `base * 2^n`.
pub const DEFAULT_BASE_BACKOFF: Duration = Duration::from_millis(500);

/// Bounded exponential backoff.
///
/// `max_retries` is the total number of attempts for one call, not counting
/// the single resend after a re-authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_backoff: Duration,
}

impl RetryPolicy {
    /// `max_retries` below 1 is raised to 1: every call sends at least once.
    pub fn new(max_retries: u32, base_backoff: Duration) -> Self {
        Self {
            max_retries: max_retries.max(1),
            base_backoff,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn base_backoff(&self) -> Duration {
        self.base_backoff
    }

    /// Whether another attempt may follow the zero-based `attempt`.
    pub fn allows_retry_after(&self, attempt: u32) -> bool {
        attempt.saturating_add(1) < self.max_retries
    }

    /// Delay after the zero-based `attempt` failed.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff
            .saturating_mul(2u32.saturating_pow(attempt.min(31)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_BASE_BACKOFF)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries(), 3);
        assert_eq!(policy.base_backoff(), Duration::from_millis(500));
    }

    #[test]
    fn backoff_doubles_from_base() {
        let policy = RetryPolicy::default();
        let delays: Vec<u64> = (0..4).map(|n| policy.backoff(n).as_millis() as u64).collect();
        assert_eq!(delays, vec![500, 1000, 2000, 4000]);
    }

    #[test]
    fn backoff_saturates() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        assert!(policy.backoff(64) >= policy.backoff(30));
    }

    #[test]
    fn attempt_budget_is_total_attempts() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        assert!(policy.allows_retry_after(0));
        assert!(policy.allows_retry_after(1));
        assert!(!policy.allows_retry_after(2));
    }

    #[test]
    fn zero_budget_still_sends_once() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.max_retries(), 1);
        assert!(!policy.allows_retry_after(0));
    }
}
