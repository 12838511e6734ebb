//! Capped exponential backoff.
//!
//! `delay(k) = min(min_backoff * 2^(k-1), max_backoff)` for retry `k >= 1`.
//! Retry 0 (the first attempt) never waits. Arithmetic saturates, so large
//! `k` simply yields `max_backoff`.

use std::time::Duration;

use crate::config::{DEFAULT_MAX_BACKOFF, DEFAULT_MIN_BACKOFF};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub min_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            min_backoff: DEFAULT_MIN_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

impl BackoffPolicy {
    pub fn new(min_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            min_backoff,
            max_backoff: max_backoff.max(min_backoff),
        }
    }

    /// Wait before retry `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(retry - 1).unwrap_or(u32::MAX);
        self.min_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}
