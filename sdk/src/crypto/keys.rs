//! # Key Material
//!
//! Ed25519 keypair and public key wrappers used by the reference signer.
//!
//! The engine itself never looks inside a signature: it hands body bytes
//! to a [`super::Signer`] and files whatever comes back under the signer's
//! public key. `Keypair` is simply the signer the SDK ships with, so that
//! tests, benches and the CLI have something real to sign with.
//!
//! ## Security considerations
//!
//! - Private keys are zeroized on drop (ed25519-dalek does this for us).
//! - Key generation pulls from `OsRng`.
//! - Secret bytes never appear in `Debug` output or log lines.

use ed25519_dalek::{Signature as DalekSignature, Signer as _, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur while parsing or validating key material.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid secret key bytes: expected 32 bytes of hex")]
    InvalidSecretKey,

    #[error("invalid public key bytes: not a valid Ed25519 point")]
    InvalidPublicKey,
}

/// An Ed25519 signing keypair.
///
/// Deliberately not `Serialize`: exporting a secret key should be an
/// explicit call to [`Keypair::to_hex`], never a side effect of dumping
/// a struct to JSON.
pub struct Keypair {
    signing_key: SigningKey,
}

/// The public half of a signing identity.
///
/// Used as the key of every signature map in the engine, so it carries a
/// total order (byte-wise) to keep those maps deterministic on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PublicKey {
    bytes: [u8; 32],
}

impl Keypair {
    /// Generate a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Deterministic keypair from a 32-byte seed. Handy in tests, where
    /// stable public keys make assertions readable.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Parse a hex-encoded 32-byte secret key.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str.trim()).map_err(|_| KeyError::InvalidSecretKey)?;
        let seed: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self::from_seed(&seed))
    }

    /// Export the secret key as hex. Handle with care.
    pub fn to_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Sign a message, returning the raw 64-byte signature.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing_key.sign(message).to_bytes().to_vec()
    }
}

impl Clone for Keypair {
    fn clone(&self) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&self.signing_key.to_bytes()),
        }
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair(pub={})", self.public_key().to_hex())
    }
}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

impl PublicKey {
    /// Wrap raw bytes without curve validation. Signature maps decoded from
    /// the wire go through here; validation happens at verify time.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Build a key from a slice, checking length and that the bytes are a
    /// valid Ed25519 point.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; 32] = slice.try_into().map_err(|_| KeyError::InvalidPublicKey)?;
        VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Verify an Ed25519 signature. Returns `false` for malformed keys or
    /// signatures rather than erroring; callers only want a yes/no.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let Ok(sig_bytes) = <[u8; 64]>::try_from(signature) else {
            return false;
        };
        verifying_key
            .verify(message, &DalekSignature::from_bytes(&sig_bytes))
            .is_ok()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s.trim()).map_err(|_| KeyError::InvalidPublicKey)?;
        Self::try_from_slice(&bytes)
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.to_hex()[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"append chunk 1 of 3");
        assert_eq!(sig.len(), 64);
        assert!(kp.public_key().verify(b"append chunk 1 of 3", &sig));
    }

    #[test]
    fn wrong_message_fails_verification() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"correct");
        assert!(!kp.public_key().verify(b"incorrect", &sig));
    }

    #[test]
    fn truncated_signature_is_rejected_not_panicking() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"msg");
        assert!(!kp.public_key().verify(b"msg", &sig[..10]));
    }

    #[test]
    fn seeded_keypairs_are_stable() {
        let a = Keypair::from_seed(&[7u8; 32]);
        let b = Keypair::from_seed(&[7u8; 32]);
        assert_eq!(a.public_key(), b.public_key());
    }

    #[test]
    fn hex_roundtrip_for_both_halves() {
        let kp = Keypair::generate();
        let restored = Keypair::from_hex(&kp.to_hex()).unwrap();
        assert_eq!(kp.public_key(), restored.public_key());

        let pk: PublicKey = kp.public_key().to_hex().parse().unwrap();
        assert_eq!(pk, kp.public_key());
    }

    #[test]
    fn bad_hex_is_rejected() {
        assert_eq!(Keypair::from_hex("abcd").unwrap_err(), KeyError::InvalidSecretKey);
        assert_eq!(PublicKey::from_hex("zz").unwrap_err(), KeyError::InvalidPublicKey);
    }

    #[test]
    fn debug_output_hides_secret() {
        let kp = Keypair::generate();
        let dbg = format!("{:?}", kp);
        assert!(!dbg.contains(&kp.to_hex()));
    }
}
