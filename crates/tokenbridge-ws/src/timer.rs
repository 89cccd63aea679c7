//! Cancellable single-shot timer.
//!
//! A `Timer` is a deadline owned by connection state. Superseding or
//! cancelling it is an explicit call, and a timer that is not armed never
//! fires.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Default)]
pub struct Timer {
    deadline: Option<Instant>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) the timer to fire `after` from now.
    pub fn arm(&mut self, after: Duration) {
        self.deadline = Some(Instant::now() + after);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolves at the deadline; pends forever while disarmed.
    pub async fn expired(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_at_deadline() {
        let mut t = Timer::new();
        t.arm(Duration::from_secs(5));
        let start = Instant::now();
        t.expired().await;
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let mut t = Timer::new();
        t.arm(Duration::from_millis(10));
        t.cancel();
        assert!(!t.is_armed());
        let fired = tokio::time::timeout(Duration::from_secs(60), t.expired()).await;
        assert!(fired.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_supersedes_previous_deadline() {
        let mut t = Timer::new();
        t.arm(Duration::from_secs(1));
        t.arm(Duration::from_secs(10));
        let start = Instant::now();
        t.expired().await;
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }
}
