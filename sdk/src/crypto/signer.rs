//! Pluggable signing capability.
//!
//! The engine only needs "given bytes, produce a signature for this public
//! key". Anything that can do that (a local keypair, an HSM client, a
//! remote wallet) implements [`Signer`].

use std::fmt;
use std::sync::Arc;

use super::keys::{Keypair, PublicKey};

/// A signing capability bound to one public key.
pub trait Signer: Send + Sync {
    /// The key signatures produced by this signer verify against.
    fn public_key(&self) -> PublicKey;

    /// Sign `message`, returning raw signature bytes.
    fn sign(&self, message: &[u8]) -> Vec<u8>;
}

impl Signer for Keypair {
    fn public_key(&self) -> PublicKey {
        Keypair::public_key(self)
    }

    fn sign(&self, message: &[u8]) -> Vec<u8> {
        Keypair::sign(self, message)
    }
}

/// Adapts a closure into a [`Signer`]. Backs `FrozenTransaction::sign_with`.
pub struct FnSigner<F> {
    public_key: PublicKey,
    sign_fn: F,
}

impl<F> FnSigner<F>
where
    F: Fn(&[u8]) -> Vec<u8> + Send + Sync,
{
    pub fn new(public_key: PublicKey, sign_fn: F) -> Self {
        Self {
            public_key,
            sign_fn,
        }
    }
}

impl<F> Signer for FnSigner<F>
where
    F: Fn(&[u8]) -> Vec<u8> + Send + Sync,
{
    fn public_key(&self) -> PublicKey {
        self.public_key
    }

    fn sign(&self, message: &[u8]) -> Vec<u8> {
        (self.sign_fn)(message)
    }
}

impl<F> fmt::Debug for FnSigner<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FnSigner({})", self.public_key.to_hex())
    }
}

/// Shared, thread-safe signer handle.
pub type SharedSigner = Arc<dyn Signer>;
