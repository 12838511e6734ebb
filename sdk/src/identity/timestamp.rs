//! Second + nanosecond timestamps.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// A point in time as the ledger sees it: whole seconds since the Unix
/// epoch plus a nanosecond remainder in `0..1_000_000_000`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: u32,
}

impl Timestamp {
    pub const fn new(seconds: i64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }

    pub const fn from_seconds(seconds: i64) -> Self {
        Self { seconds, nanos: 0 }
    }

    /// Split a nanosecond count since the epoch into seconds + remainder.
    /// Negative inputs floor toward the earlier second.
    pub fn from_unix_nanos(nanos: i64) -> Self {
        Self {
            seconds: nanos.div_euclid(NANOS_PER_SECOND),
            nanos: nanos.rem_euclid(NANOS_PER_SECOND) as u32,
        }
    }

    /// Nanoseconds since the epoch. Saturates instead of overflowing for
    /// timestamps beyond the year 2262.
    pub fn as_unix_nanos(&self) -> i64 {
        self.seconds
            .saturating_mul(NANOS_PER_SECOND)
            .saturating_add(i64::from(self.nanos))
    }

    pub fn now() -> Self {
        Self::from(Utc::now())
    }

    /// This timestamp shifted forward by `duration`.
    pub fn plus(&self, duration: Duration) -> Self {
        let shift = i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX);
        Self::from_unix_nanos(self.as_unix_nanos().saturating_add(shift))
    }

    /// Convert to a chrono `DateTime`, if representable.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.seconds, self.nanos).single()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self {
            seconds: dt.timestamp(),
            nanos: dt.timestamp_subsec_nanos(),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.seconds, self.nanos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nanos_roundtrip() {
        let ts = Timestamp::from_unix_nanos(1_554_158_542_123_456_789);
        assert_eq!(ts, Timestamp::new(1_554_158_542, 123_456_789));
        assert_eq!(ts.as_unix_nanos(), 1_554_158_542_123_456_789);
    }

    #[test]
    fn negative_nanos_floor() {
        let ts = Timestamp::from_unix_nanos(-1);
        assert_eq!(ts, Timestamp::new(-1, 999_999_999));
    }

    #[test]
    fn plus_carries_into_seconds() {
        let ts = Timestamp::new(10, 999_999_999).plus(Duration::from_nanos(2));
        assert_eq!(ts, Timestamp::new(11, 1));
    }

    #[test]
    fn chrono_conversion_is_lossless() {
        let ts = Timestamp::new(1_700_000_000, 42);
        let dt = ts.to_datetime().unwrap();
        assert_eq!(Timestamp::from(dt), ts);
    }
}
