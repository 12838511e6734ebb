//! Logical request identities.
//!
//! A [`TransactionId`] names one request across every node and chunk
//! encoding of it. The payer plus valid-start pair is the part the network
//! deduplicates on; the nonce distinguishes chunks (and other child
//! requests) of one logical request; the scheduled flag marks the inner
//! transaction of a schedule.
//!
//! ## Ordering
//!
//! Identities order lexicographically on `(scheduled, payer, valid_start)`
//! with the nonce as the final tie-breaker. Absent nonces and unscheduled
//! identities sort before present/scheduled ones. Keeping the nonce in the
//! comparison makes `Eq` agree with `Ord`, so two chunks of one request
//! remain distinct map keys. Use [`TransactionId::is_same_request`] to ask
//! whether two identities are different chunks of one logical request.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::entity::AccountId;
use super::timestamp::Timestamp;
use super::IdentityError;

/// The logical identity of a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId {
    /// Account paying for the request.
    pub account_id: AccountId,
    /// Earliest consensus time at which the request may be processed.
    pub valid_start: Timestamp,
    /// Child discriminator. `None` for the initial chunk.
    pub nonce: Option<i32>,
    /// Marks the scheduled (inner) form of a transaction.
    pub scheduled: bool,
}

impl TransactionId {
    /// An identity with an explicit valid-start, no nonce, not scheduled.
    pub const fn with_valid_start(account_id: AccountId, valid_start: Timestamp) -> Self {
        Self {
            account_id,
            valid_start,
            nonce: None,
            scheduled: false,
        }
    }

    /// Copy of this identity carrying `nonce`.
    pub fn with_nonce(mut self, nonce: Option<i32>) -> Self {
        self.nonce = nonce;
        self
    }

    /// Copy of this identity with the scheduled flag set to `scheduled`.
    pub fn with_scheduled(mut self, scheduled: bool) -> Self {
        self.scheduled = scheduled;
        self
    }

    /// Identity of chunk `index` of a request whose initial identity is
    /// `self`. Chunk 0 carries no nonce; chunk `k` carries `nonce = k`, all
    /// off the same valid-start.
    pub fn for_chunk(&self, index: usize) -> Self {
        let nonce = match index {
            0 => None,
            k => Some(i32::try_from(k).unwrap_or(i32::MAX)),
        };
        Self {
            nonce,
            ..self.without_nonce()
        }
    }

    /// This identity with the nonce cleared.
    pub fn without_nonce(&self) -> Self {
        Self {
            nonce: None,
            ..*self
        }
    }

    /// `true` when `other` is a different chunk of the same logical
    /// request: same payer, valid-start and scheduled flag, different
    /// nonce. An identity is not a sibling of itself.
    pub fn is_same_request(&self, other: &TransactionId) -> bool {
        self.account_id == other.account_id
            && self.valid_start == other.valid_start
            && self.scheduled == other.scheduled
            && self.nonce != other.nonce
    }
}

impl Ord for TransactionId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.scheduled
            .cmp(&other.scheduled)
            .then_with(|| self.account_id.cmp(&other.account_id))
            .then_with(|| self.valid_start.cmp(&other.valid_start))
            .then_with(|| self.nonce.cmp(&other.nonce))
    }
}

impl PartialOrd for TransactionId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.account_id, self.valid_start)?;
        if self.scheduled {
            write!(f, "?scheduled")?;
        }
        if let Some(nonce) = self.nonce {
            write!(f, "/{}", nonce)?;
        }
        Ok(())
    }
}

impl FromStr for TransactionId {
    type Err = IdentityError;

    /// Parses `payer@seconds.nanos[?scheduled][/nonce]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || IdentityError::InvalidTransactionId(s.to_string());

        let (rest, nonce) = match s.split_once('/') {
            Some((rest, nonce)) => (rest, Some(nonce.parse::<i32>().map_err(|_| invalid())?)),
            None => (s, None),
        };

        let (rest, scheduled) = match rest.split_once('?') {
            Some((rest, "scheduled")) => (rest, true),
            Some(_) => return Err(invalid()),
            None => (rest, false),
        };

        let (account, valid_start) = rest.split_once('@').ok_or_else(invalid)?;
        let (seconds, nanos) = valid_start.split_once('.').ok_or_else(invalid)?;

        let nanos: u32 = nanos.parse().map_err(|_| invalid())?;
        if nanos >= 1_000_000_000 {
            return Err(invalid());
        }

        Ok(Self {
            account_id: account.parse().map_err(|_| invalid())?,
            valid_start: Timestamp::new(seconds.parse().map_err(|_| invalid())?, nanos),
            nonce,
            scheduled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TransactionId {
        TransactionId::with_valid_start(AccountId::from_num(5006), Timestamp::from_seconds(1_554_158_542))
    }

    #[test]
    fn display_and_parse_roundtrip() {
        let cases = [
            sample(),
            sample().with_nonce(Some(3)),
            sample().with_scheduled(true),
            sample().with_scheduled(true).with_nonce(Some(7)),
        ];
        for id in cases {
            let s = id.to_string();
            assert_eq!(s.parse::<TransactionId>().unwrap(), id, "roundtrip of {s}");
        }
    }

    #[test]
    fn display_matches_canonical_form() {
        assert_eq!(sample().to_string(), "0.0.5006@1554158542.0");
        assert_eq!(
            sample().with_scheduled(true).with_nonce(Some(2)).to_string(),
            "0.0.5006@1554158542.0?scheduled/2"
        );
    }

    #[test]
    fn rejects_malformed_strings() {
        for bad in [
            "0.0.5006",
            "0.0.5006@1554158542",
            "0.0.5006@x.0",
            "0.0.5006@1.0?later",
            "0.0.5006@1.0/abc",
            "0.0.5006@1.1000000000",
        ] {
            assert!(bad.parse::<TransactionId>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn scheduled_sorts_after_unscheduled() {
        let plain = sample();
        let scheduled = sample().with_scheduled(true);
        assert!(plain < scheduled);
    }

    #[test]
    fn absent_nonce_sorts_first() {
        let base = sample();
        assert!(base < base.with_nonce(Some(0)));
        assert!(base.with_nonce(Some(1)) < base.with_nonce(Some(2)));
    }

    #[test]
    fn payer_dominates_valid_start() {
        let early_big_payer =
            TransactionId::with_valid_start(AccountId::from_num(9), Timestamp::from_seconds(1));
        let late_small_payer =
            TransactionId::with_valid_start(AccountId::from_num(1), Timestamp::from_seconds(99));
        assert!(late_small_payer < early_big_payer);
    }

    #[test]
    fn chunk_identities_share_request() {
        let initial = sample();
        let second = initial.for_chunk(1);
        assert_eq!(initial.for_chunk(0), initial);
        assert_eq!(second.nonce, Some(1));
        assert!(second.is_same_request(&initial));
        assert!(initial.is_same_request(&second));
        assert_ne!(second, initial);
    }

    #[test]
    fn identity_is_not_its_own_sibling() {
        let initial = sample();
        assert!(!initial.is_same_request(&initial));
        assert!(!initial.for_chunk(2).is_same_request(&initial.for_chunk(2)));

        let later = TransactionId {
            valid_start: Timestamp::from_seconds(initial.valid_start.seconds + 1),
            ..initial.for_chunk(1)
        };
        assert!(!later.is_same_request(&initial));
        assert!(!initial.with_scheduled(true).for_chunk(1).is_same_request(&initial));
    }
}
