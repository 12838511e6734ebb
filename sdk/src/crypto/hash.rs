//! Transaction hashing.
//!
//! A transaction is identified on the ledger by the SHA-384 digest of the
//! signed envelope a node received. Each node column of the matrix has its
//! own body bytes, so each node also has its own hash.

use sha2::{Digest, Sha384};

/// Length of a transaction hash in bytes.
pub const TRANSACTION_HASH_LENGTH: usize = 48;

/// SHA-384 digest of `data`.
pub fn sha384(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha384::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}
