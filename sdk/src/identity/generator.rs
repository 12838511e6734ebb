//! # Identity Generator
//!
//! Issues fresh [`TransactionId`]s whose valid-start times are strictly
//! increasing within one generator.
//!
//! ## Algorithm
//!
//! 1. Sample the clock at millisecond precision, convert to nanoseconds,
//!    subtract [`VALID_START_BACKOFF_NANOS`] to tolerate clock skew.
//! 2. Compare against the last issued base. If the candidate is not
//!    strictly greater, use `last + TIMESTAMP_INCREMENT_NANOS`.
//! 3. Publish the new base with a compare-and-set; on contention, retry
//!    from step 1.
//! 4. Add random jitter in `[0, TIMESTAMP_INCREMENT_NANOS)` to the issued
//!    value.
//!
//! Bases are always whole multiples of the increment (milliseconds are, and
//! every bump adds one increment), so consecutive bases differ by at least
//! one increment and jitter can never make two issued values meet.
//!
//! One generator belongs to one client. There is no process-global counter,
//! which keeps tests isolated from each other.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use rand::Rng;

use super::entity::AccountId;
use super::timestamp::Timestamp;
use super::transaction_id::TransactionId;
use crate::config::{NANOS_PER_MILLI, TIMESTAMP_INCREMENT_NANOS, VALID_START_BACKOFF_NANOS};

/// Source of wall-clock time for the generator.
pub trait ClockSource: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// The system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Monotonic identity generator. See the module docs for the algorithm.
pub struct IdentityGenerator {
    clock: Arc<dyn ClockSource>,
    last_base_nanos: AtomicI64,
    jitter: bool,
}

impl IdentityGenerator {
    /// Generator backed by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Generator backed by a caller-supplied clock.
    pub fn with_clock(clock: Arc<dyn ClockSource>) -> Self {
        Self {
            clock,
            last_base_nanos: AtomicI64::new(i64::MIN),
            jitter: true,
        }
    }

    /// Disable the sub-increment jitter. Issued values become exact bases,
    /// which makes them predictable in tests.
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Issue a fresh identity for `payer`.
    pub fn next(&self, payer: AccountId) -> TransactionId {
        let base = self.next_base_nanos();
        let issued = if self.jitter {
            base + rand::thread_rng().gen_range(0..TIMESTAMP_INCREMENT_NANOS)
        } else {
            base
        };
        TransactionId::with_valid_start(payer, Timestamp::from_unix_nanos(issued))
    }

    fn next_base_nanos(&self) -> i64 {
        loop {
            let mut candidate = self
                .clock
                .now_millis()
                .saturating_mul(NANOS_PER_MILLI)
                .saturating_sub(VALID_START_BACKOFF_NANOS);

            let last = self.last_base_nanos.load(Ordering::Acquire);
            if candidate <= last {
                candidate = last + TIMESTAMP_INCREMENT_NANOS;
            }

            if self
                .last_base_nanos
                .compare_exchange(last, candidate, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return candidate;
            }
        }
    }
}

impl Default for IdentityGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for IdentityGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityGenerator")
            .field("last_base_nanos", &self.last_base_nanos.load(Ordering::Relaxed))
            .field("jitter", &self.jitter)
            .finish()
    }
}
