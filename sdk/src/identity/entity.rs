//! `shard.realm.num` entity identifiers.
//!
//! Accounts, nodes, files and topics all share the same three-part numeric
//! address. The aliases below exist for readability at call sites; they do
//! not add type-level distinction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::IdentityError;

/// A `shard.realm.num` ledger entity address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    pub shard: u64,
    pub realm: u64,
    pub num: u64,
}

/// An account (payer, transfer party, operator).
pub type AccountId = EntityId;

/// A candidate execution target. Nodes are addressed by their account.
pub type NodeId = EntityId;

pub type FileId = EntityId;

pub type TopicId = EntityId;

impl EntityId {
    pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
        Self { shard, realm, num }
    }

    /// Shorthand for `0.0.num`, the common case on single-shard networks.
    pub const fn from_num(num: u64) -> Self {
        Self::new(0, 0, num)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

impl FromStr for EntityId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || IdentityError::InvalidEntityId(s.to_string());

        let mut parts = s.split('.');
        let (Some(shard), Some(realm), Some(num), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        Ok(Self {
            shard: shard.parse().map_err(|_| invalid())?,
            realm: realm.parse().map_err(|_| invalid())?,
            num: num.parse().map_err(|_| invalid())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_displays() {
        let id: EntityId = "0.0.5005".parse().unwrap();
        assert_eq!(id, EntityId::from_num(5005));
        assert_eq!(id.to_string(), "0.0.5005");
    }

    #[test]
    fn rejects_malformed_strings() {
        for bad in ["", "0.0", "0.0.0.0", "a.b.c", "0..3", "-1.0.3"] {
            assert!(bad.parse::<EntityId>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn orders_by_shard_realm_num() {
        let mut ids = vec![
            EntityId::new(1, 0, 0),
            EntityId::new(0, 1, 0),
            EntityId::new(0, 0, 9),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                EntityId::new(0, 0, 9),
                EntityId::new(0, 1, 0),
                EntityId::new(1, 0, 0),
            ]
        );
    }
}
