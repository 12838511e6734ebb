//! # Cryptography
//!
//! Key wrappers, the pluggable [`Signer`] capability and transaction
//! hashing.
//!
//! ```text
//! keys.rs    — Ed25519 Keypair / PublicKey
//! signer.rs  — Signer trait, closure adapter
//! hash.rs    — SHA-384 transaction hashes
//! ```

pub mod hash;
pub mod keys;
pub mod signer;

pub use hash::{sha384, TRANSACTION_HASH_LENGTH};
pub use keys::{KeyError, Keypair, PublicKey};
pub use signer::{FnSigner, SharedSigner, Signer};
