//! # Transaction Module
//!
//! Construction, freezing, signing and serialization of ledger requests.
//!
//! ## Architecture
//!
//! ```text
//! operation.rs   — Operation variants and their chunking capability surface
//! body.rs        — TransactionContent and the canonical body builder
//! chunking.rs    — splits payload-bearing operations into chunks
//! matrix.rs      — BodyMatrix: one body per (chunk, node), built at freeze
//! signatures.rs  — per-cell signature maps, safe for concurrent signers
//! codec.rs       — envelope shapes A/B/C, decode attempts, grid assembly
//! builder.rs     — TransactionBuilder: fluent, consuming, freezes to ...
//! frozen.rs      — FrozenTransaction: signing, hashing, to/from bytes
//! lifecycle.rs   — Transaction: the same lifecycle behind runtime checks
//! status.rs      — precheck status codes and their retry class
//! error.rs       — ConstructionError, DecodeError
//! ```
//!
//! ## Lifecycle
//!
//! 1. **Build**: set content on a [`TransactionBuilder`] (or [`Transaction`]).
//! 2. **Freeze**: chunk the payload, resolve identity and nodes, encode every
//!    cell of the [`BodyMatrix`].
//! 3. **Sign**: any number of times, from any number of threads.
//! 4. **Execute**: see [`crate::network::executor`].
//!
//! Bodies are never re-encoded after freeze except when the execution
//! engine regenerates an expired identity.

pub mod body;
pub mod builder;
pub mod chunking;
pub mod codec;
pub mod error;
pub mod frozen;
pub mod lifecycle;
pub mod matrix;
pub mod operation;
pub mod signatures;
pub mod status;

pub use body::{build_body, CustomFeeLimit, SchedulableBody, TransactionBody, TransactionContent};
pub use builder::TransactionBuilder;
pub use chunking::{chunk_count, split, Chunk};
pub use codec::{decode, Decoded, DecodedCell, SignedTransaction, TransactionList, WireShape};
pub use error::{ConstructionError, DecodeError};
pub use frozen::{FrozenTransaction, SignableBody};
pub use lifecycle::Transaction;
pub use matrix::{BodyMatrix, Cell};
pub use operation::{ChunkInfo, Operation, OperationKind, Transfer};
pub use signatures::{SignatureCollector, SignatureInsert, SignatureMap};
pub use status::{Status, StatusClass};
