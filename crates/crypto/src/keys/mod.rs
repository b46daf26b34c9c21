// Path: crates/crypto/src/keys/mod.rs
//! The sealed key-pair variant over the supported algorithm set.
//!
//! The set of supported algorithms is closed, so dispatch is a tagged enum
//! rather than an open trait object: exhaustiveness checks catch a missing
//! arm at compile time whenever an algorithm is added.

use crate::error::CryptoError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sage_types::message::KeyAlgorithm;
use sha2::{Digest, Sha256};
use std::fmt;

pub mod ed25519;
pub mod p256;
pub mod secp256k1;
pub mod x25519;

pub use ed25519::Ed25519KeyPair;
pub use p256::P256KeyPair;
pub use secp256k1::Secp256k1KeyPair;
pub use x25519::X25519KeyPair;

/// A typed key pair over the closed algorithm set.
///
/// Private material is hidden after construction: `Debug` prints only the
/// algorithm and key id, and raw private bytes are reachable only through
/// the explicit export paths (vault, JWK, PEM).
#[derive(Clone)]
pub enum KeyPair {
    /// Ed25519 signing.
    Ed25519(Ed25519KeyPair),
    /// ECDSA over NIST P-256.
    EcdsaP256(P256KeyPair),
    /// ECDSA over secp256k1.
    EcdsaSecp256k1(Secp256k1KeyPair),
    /// X25519 key agreement. KEM only; signing fails.
    X25519(X25519KeyPair),
}

/// The public half of a [`KeyPair`], freely copyable.
#[derive(Clone, PartialEq, Eq)]
pub enum PublicKey {
    /// Ed25519, 32 raw bytes.
    Ed25519([u8; 32]),
    /// P-256, SEC1-compressed bytes.
    EcdsaP256(Vec<u8>),
    /// secp256k1, SEC1-compressed bytes.
    EcdsaSecp256k1(Vec<u8>),
    /// X25519, 32 raw bytes.
    X25519([u8; 32]),
}

impl KeyPair {
    /// Generates a fresh key pair for the given algorithm.
    pub fn generate(algorithm: KeyAlgorithm) -> Self {
        match algorithm {
            KeyAlgorithm::Ed25519 => KeyPair::Ed25519(Ed25519KeyPair::generate()),
            KeyAlgorithm::EcdsaP256 => KeyPair::EcdsaP256(P256KeyPair::generate()),
            KeyAlgorithm::EcdsaSecp256k1 => {
                KeyPair::EcdsaSecp256k1(Secp256k1KeyPair::generate())
            }
            KeyAlgorithm::X25519 => KeyPair::X25519(X25519KeyPair::generate()),
        }
    }

    /// The algorithm tag.
    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            KeyPair::Ed25519(_) => KeyAlgorithm::Ed25519,
            KeyPair::EcdsaP256(_) => KeyAlgorithm::EcdsaP256,
            KeyPair::EcdsaSecp256k1(_) => KeyAlgorithm::EcdsaSecp256k1,
            KeyPair::X25519(_) => KeyAlgorithm::X25519,
        }
    }

    /// The public half.
    pub fn public_key(&self) -> PublicKey {
        match self {
            KeyPair::Ed25519(kp) => PublicKey::Ed25519(kp.public_key_bytes()),
            KeyPair::EcdsaP256(kp) => PublicKey::EcdsaP256(kp.public_key_bytes()),
            KeyPair::EcdsaSecp256k1(kp) => PublicKey::EcdsaSecp256k1(kp.public_key_bytes()),
            KeyPair::X25519(kp) => PublicKey::X25519(kp.public_key_bytes()),
        }
    }

    /// The deterministic key id derived from the public key.
    pub fn key_id(&self) -> String {
        self.public_key().key_id()
    }

    /// Signs a message. Fails with [`CryptoError::KemOnlyKey`] on X25519.
    ///
    /// Output: Ed25519 = 64 bytes; ECDSA = raw 64-byte `r || s`. The
    /// Ethereum 65-byte recoverable form is only reachable through
    /// [`KeyPair::sign_recoverable`].
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        match self {
            KeyPair::Ed25519(kp) => Ok(kp.sign(message).to_vec()),
            KeyPair::EcdsaP256(kp) => Ok(kp.sign(message).to_vec()),
            KeyPair::EcdsaSecp256k1(kp) => Ok(kp.sign(message).to_vec()),
            KeyPair::X25519(_) => Err(CryptoError::KemOnlyKey),
        }
    }

    /// Signs with Ethereum semantics (Keccak-256 prehash, 65-byte output).
    /// Defined only on secp256k1.
    pub fn sign_recoverable(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        match self {
            KeyPair::EcdsaSecp256k1(kp) => Ok(kp.sign_recoverable(message)?.to_vec()),
            _ => Err(CryptoError::UnsupportedFormat(
                "recoverable signatures are secp256k1-only".to_string(),
            )),
        }
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("algorithm", &self.algorithm())
            .field("key_id", &self.key_id())
            .finish_non_exhaustive()
    }
}

impl PublicKey {
    /// The algorithm tag.
    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            PublicKey::Ed25519(_) => KeyAlgorithm::Ed25519,
            PublicKey::EcdsaP256(_) => KeyAlgorithm::EcdsaP256,
            PublicKey::EcdsaSecp256k1(_) => KeyAlgorithm::EcdsaSecp256k1,
            PublicKey::X25519(_) => KeyAlgorithm::X25519,
        }
    }

    /// The raw public key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            PublicKey::Ed25519(b) => b,
            PublicKey::EcdsaP256(b) => b,
            PublicKey::EcdsaSecp256k1(b) => b,
            PublicKey::X25519(b) => b,
        }
    }

    /// Parses raw public bytes under a stated algorithm.
    pub fn from_bytes(algorithm: KeyAlgorithm, bytes: &[u8]) -> Result<Self, CryptoError> {
        match algorithm {
            KeyAlgorithm::Ed25519 => {
                let b: [u8; 32] = bytes.try_into().map_err(|_| {
                    CryptoError::InvalidKey("Ed25519 public key must be 32 bytes".to_string())
                })?;
                Ok(PublicKey::Ed25519(b))
            }
            KeyAlgorithm::EcdsaP256 => {
                // Parse to validate the point, keep the caller's encoding.
                ::p256::ecdsa::VerifyingKey::from_sec1_bytes(bytes)
                    .map_err(|e| CryptoError::InvalidKey(format!("invalid P-256 point: {e}")))?;
                Ok(PublicKey::EcdsaP256(bytes.to_vec()))
            }
            KeyAlgorithm::EcdsaSecp256k1 => {
                ::k256::ecdsa::VerifyingKey::from_sec1_bytes(bytes).map_err(|e| {
                    CryptoError::InvalidKey(format!("invalid secp256k1 point: {e}"))
                })?;
                Ok(PublicKey::EcdsaSecp256k1(bytes.to_vec()))
            }
            KeyAlgorithm::X25519 => {
                let b: [u8; 32] = bytes.try_into().map_err(|_| {
                    CryptoError::InvalidKey("X25519 public key must be 32 bytes".to_string())
                })?;
                Ok(PublicKey::X25519(b))
            }
        }
    }

    /// The deterministic key id: base64url of the first 16 bytes of the
    /// SHA-256 of the raw public key bytes (22 characters).
    pub fn key_id(&self) -> String {
        let digest = Sha256::digest(self.as_bytes());
        let head = digest.get(..16).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(head)
    }

    /// Verifies a signature over `message` with this key.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
        match self {
            PublicKey::Ed25519(b) => ed25519::verify(b, message, signature),
            PublicKey::EcdsaP256(b) => p256::verify(b, message, signature),
            PublicKey::EcdsaSecp256k1(b) => secp256k1::verify(b, message, signature),
            PublicKey::X25519(_) => Err(CryptoError::KemOnlyKey),
        }
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("algorithm", &self.algorithm())
            .field("key_id", &self.key_id())
            .finish_non_exhaustive()
    }
}

/// Verifies a signature under an explicit algorithm and raw key bytes.
pub fn verify(
    algorithm: KeyAlgorithm,
    public_key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<(), CryptoError> {
    PublicKey::from_bytes(algorithm, public_key)?.verify(message, signature)
}
