//! # Identity Module
//!
//! Addresses and logical request identities.
//!
//! ## Architecture
//!
//! ```text
//! entity.rs          — shard.realm.num ids (accounts, nodes, files, topics)
//! timestamp.rs       — seconds + nanos timestamps
//! transaction_id.rs  — TransactionId: payer, valid-start, nonce, scheduled
//! generator.rs       — monotonic, collision-free identity generation
//! ```

pub mod entity;
pub mod generator;
pub mod timestamp;
pub mod transaction_id;

pub use entity::{AccountId, EntityId, FileId, NodeId, TopicId};
pub use generator::{ClockSource, IdentityGenerator, SystemClock};
pub use timestamp::Timestamp;
pub use transaction_id::TransactionId;

use thiserror::Error;

/// Errors raised while parsing identifiers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("invalid entity id {0:?}: expected shard.realm.num")]
    InvalidEntityId(String),

    #[error("invalid transaction id {0:?}: expected payer@seconds.nanos[?scheduled][/nonce]")]
    InvalidTransactionId(String),
}
