//! Error types for transaction construction and decoding.
//!
//! Both are local failures: they are returned synchronously to the caller
//! that triggered them and are never retried.

use thiserror::Error;

use crate::identity::TransactionId;

/// Errors raised while building, freezing or inspecting a transaction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    /// A field the operation cannot be encoded without is unset.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Freeze needs at least one node, either set explicitly or taken from
    /// the client.
    #[error("no node account ids: set them explicitly or freeze with a client that has nodes")]
    NoNodes,

    /// Freeze needs an identity, either set explicitly or generated from
    /// the client's operator account.
    #[error("transaction id must be set explicitly or the client must have an operator")]
    MissingTransactionId,

    /// Operator signing was requested from a client without an operator.
    #[error("client has no operator")]
    NoOperator,

    #[error("payload requires {required} chunks but at most {max} are allowed")]
    TooManyChunks {
        /// Chunks the payload would need at the configured chunk size.
        required: usize,
        /// Configured ceiling.
        max: usize,
    },

    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,

    #[error("memo is {len} bytes, the limit is {max}")]
    MemoTooLong { len: usize, max: usize },

    /// A setter was called on a frozen transaction.
    #[error("transaction is immutable; it has already been frozen")]
    Immutable,

    /// An accessor that needs the body matrix was called before freeze.
    #[error("transaction must be frozen first")]
    NotFrozen,

    /// An accessor that assumes a single chunk was called on a chunked
    /// transaction.
    #[error("operation requires a single-chunk transaction, this one has {0} chunks")]
    MultipleChunks(usize),

    /// A single-cell shortcut was used on a transaction with several cells.
    #[error("operation requires exactly one node, this transaction has {0}")]
    MultipleNodes(usize),

    #[error("transaction id {0} does not belong to this transaction")]
    UnknownTransactionId(TransactionId),

    /// The request cannot be wrapped in a schedule.
    #[error("cannot schedule this transaction: {0}")]
    NotSchedulable(&'static str),

    /// The body codec refused to serialize the body.
    #[error("body encoding failed: {0}")]
    Encoding(String),
}

/// Errors raised by `from_bytes`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("cannot decode an empty byte sequence")]
    Empty,

    /// None of the known envelope shapes accepted the bytes. Carries one
    /// reason per attempted shape, in attempt order.
    #[error("bytes match no known envelope shape: {}", .0.join("; "))]
    Unrecognized(Vec<String>),

    /// The envelope magic matched but its payload did not parse.
    #[error("malformed {shape} envelope: {reason}")]
    Malformed {
        shape: &'static str,
        reason: String,
    },

    /// A list envelope with no entries.
    #[error("transaction list contains no transactions")]
    EmptyList,

    /// Cells of one container disagree on the logical operation they carry.
    #[error("cells do not describe the same transaction: {field} differs ({first} vs {other})")]
    ContentMismatch {
        field: &'static str,
        first: String,
        other: String,
    },

    /// The decoded cells do not form a complete chunk × node grid.
    #[error("irregular matrix: {0}")]
    IrregularMatrix(String),
}
