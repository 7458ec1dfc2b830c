//! Bounded retry policy for the resolution step.

use std::time::Duration;

use rand::{Rng, rng};

/// Retry settings applied to transient resolution failures only.
///
/// A relay that has started streaming is never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,
    /// Backoff before the first retry, doubled for each further retry
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_backoff: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_backoff: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (zero-based), with up to 50% jitter.
    pub fn backoff(&self, retry: u32) -> Duration {
        let base = self.base_backoff.saturating_mul(1u32 << retry.min(8));
        let jitter_cap = base.as_millis() as u64 / 2;
        if jitter_cap == 0 {
            return base;
        }
        base + Duration::from_millis(rng().random_range(0..=jitter_cap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_within_jitter_bounds() {
        let policy = RetryPolicy::default();

        for _ in 0..50 {
            let first = policy.backoff(0);
            assert!(first >= Duration::from_millis(250));
            assert!(first <= Duration::from_millis(375));

            let second = policy.backoff(1);
            assert!(second >= Duration::from_millis(500));
            assert!(second <= Duration::from_millis(750));
        }
    }

    #[test]
    fn test_zero_backoff_has_no_jitter() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_backoff: Duration::ZERO,
        };
        assert_eq!(policy.backoff(2), Duration::ZERO);
        assert_eq!(RetryPolicy::none().max_retries, 0);
    }
}
