//! Reconnection policy.
//!
//! Delays grow linearly with the attempt number and are capped:
//! `delay(n) = min(base * n, max)`. There is no jitter, so clients that lose
//! the server together also retry together.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Delay unit per attempt.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Upper bound on any single delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(10_000);

/// Attempts before giving up for the session.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

// ============================================================================
// ReconnectPolicy
// ============================================================================

/// Bounded linear backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay unit per attempt.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Attempts before giving up.
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ReconnectPolicy {
    /// Creates a policy.
    #[inline]
    #[must_use]
    pub const fn new(base_delay: Duration, max_delay: Duration, max_attempts: u32) -> Self {
        Self {
            base_delay,
            max_delay,
            max_attempts,
        }
    }

    /// Returns the delay before attempt `attempt` (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .checked_mul(attempt)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Returns the next attempt number and its delay, or `None` once
    /// `attempts_so_far` has reached the limit.
    #[must_use]
    pub fn next(&self, attempts_so_far: u32) -> Option<(u32, Duration)> {
        if attempts_so_far >= self.max_attempts {
            return None;
        }

        let attempt = attempts_so_far + 1;
        Some((attempt, self.delay_for(attempt)))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule() {
        let policy = ReconnectPolicy::default();

        let delays: Vec<u64> = (1..=5)
            .map(|n| policy.delay_for(n).as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![1000, 2000, 3000, 4000, 5000]);
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = ReconnectPolicy::default();

        assert_eq!(policy.delay_for(10), DEFAULT_MAX_DELAY);
        assert_eq!(policy.delay_for(11), DEFAULT_MAX_DELAY);
        assert_eq!(policy.delay_for(u32::MAX), DEFAULT_MAX_DELAY);
    }

    #[test]
    fn test_next_stops_at_limit() {
        let policy = ReconnectPolicy::default();

        let mut attempts = 0;
        let mut schedule = Vec::new();
        while let Some((attempt, delay)) = policy.next(attempts) {
            schedule.push((attempt, delay.as_millis() as u64));
            attempts = attempt;
        }

        assert_eq!(
            schedule,
            vec![(1, 1000), (2, 2000), (3, 3000), (4, 4000), (5, 5000)]
        );
        assert_eq!(policy.next(5), None);
    }

    #[test]
    fn test_zero_attempts_never_retries() {
        let policy = ReconnectPolicy::new(Duration::from_millis(1), Duration::from_millis(1), 0);
        assert_eq!(policy.next(0), None);
    }
}
