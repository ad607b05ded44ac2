//! Wait-until primitive
//!
//! Fixed sleeps are replaced by polling a condition against a deadline, so a
//! step finishes as soon as its condition holds and never waits longer than
//! its budget.

use std::time::Duration;

use tokio::time::Instant;

/// A time budget that started at construction
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    timeout: Duration,
}

impl Deadline {
    /// Start a budget of `timeout` from now
    pub fn after(timeout: Duration) -> Self {
        Self {
            start: Instant::now(),
            timeout,
        }
    }

    /// The full budget
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn remaining(&self) -> Duration {
        self.timeout.saturating_sub(self.elapsed())
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_zero()
    }

    /// Sleep one poll interval, clipped to what is left of the budget.
    ///
    /// Returns `false` without sleeping once the budget is spent, so a loop of
    /// `check; tick` checks at 0, interval, 2*interval, ... and one final time
    /// exactly at the deadline.
    pub async fn tick(&self, interval: Duration) -> bool {
        let remaining = self.remaining();
        if remaining.is_zero() {
            return false;
        }
        tokio::time::sleep(interval.min(remaining)).await;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_tick_until_expired() {
        let deadline = Deadline::after(Duration::from_millis(250));
        let mut ticks = 0;
        while deadline.tick(Duration::from_millis(100)).await {
            ticks += 1;
        }
        // 100 + 100 + 50 (clipped)
        assert_eq!(ticks, 3);
        assert!(deadline.is_expired());
        assert_eq!(deadline.elapsed(), Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_budget_never_sleeps() {
        let deadline = Deadline::after(Duration::ZERO);
        assert!(!deadline.tick(Duration::from_millis(100)).await);
        assert_eq!(deadline.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remaining_shrinks() {
        let deadline = Deadline::after(Duration::from_secs(1));
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(deadline.remaining(), Duration::from_millis(600));
    }
}
