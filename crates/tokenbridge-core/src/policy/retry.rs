//! Backoff schedule for connector retries.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total number of attempts, including the first try.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_backoff: Duration,
    /// Upper bound for any single delay.
    pub max_backoff: Duration,
    /// Growth factor between consecutive delays.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 15,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

/// Pure function of the attempt number; holds no per-call state.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Returns the delay to wait after the `attempt`-th attempt failed (1-based):
    /// `min(max_backoff, initial_backoff * multiplier^(attempt-1))`.
    /// Returns `None` once `attempt` reaches `max_attempts`.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if !self.should_retry(attempt) {
            return None;
        }
        let exponent = attempt.saturating_sub(1) as i32;
        let grown_ms = self.config.initial_backoff.as_millis() as f64 * self.config.multiplier.powi(exponent);
        let ceiling_ms = self.config.max_backoff.as_millis() as f64;
        Some(Duration::from_millis(grown_ms.min(ceiling_ms) as u64))
    }

    /// `attempt` failures so far; is there budget for one more try?
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.config.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_attempts: u32, initial_ms: u64, cap_ms: u64, factor: f64) -> RetryPolicy {
        RetryPolicy::new(RetryConfig {
            max_attempts,
            initial_backoff: Duration::from_millis(initial_ms),
            max_backoff: Duration::from_millis(cap_ms),
            multiplier: factor,
        })
    }

    #[test]
    fn default_schedule_doubles_from_100ms() {
        let p = RetryPolicy::new(RetryConfig::default());
        let delays: Vec<u128> = (1..=4).map(|n| p.next_delay(n).unwrap().as_millis()).collect();
        assert_eq!(delays, [100, 200, 400, 800]);
        // 100ms * 2^7 crosses the 10s ceiling
        assert_eq!(p.next_delay(8), Some(Duration::from_secs(10)));
    }

    #[test]
    fn last_attempt_gets_no_delay() {
        let p = policy(3, 50, 1_000, 3.0);
        assert_eq!(p.next_delay(2), Some(Duration::from_millis(150)));
        assert!(p.should_retry(2));
        assert!(!p.should_retry(3));
        assert_eq!(p.next_delay(3), None);
    }

    #[test]
    fn factor_one_is_a_fixed_delay() {
        let p = policy(10, 250, 5_000, 1.0);
        assert_eq!(p.next_delay(1), p.next_delay(9));
    }

    #[test]
    fn one_attempt_means_no_retry() {
        assert_eq!(policy(1, 100, 100, 2.0).next_delay(1), None);
    }
}
