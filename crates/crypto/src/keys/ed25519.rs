// Path: crates/crypto/src/keys/ed25519.rs
//! Ed25519 signing keys.

use crate::error::CryptoError;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

/// Raw public key length in bytes.
pub const PUBLIC_KEY_LEN: usize = 32;
/// Raw private key length in bytes (seed || public, Go-style).
pub const PRIVATE_KEY_LEN: usize = 64;
/// Signature length in bytes.
pub const SIGNATURE_LEN: usize = 64;

/// An Ed25519 key pair.
#[derive(Clone)]
pub struct Ed25519KeyPair {
    signing: SigningKey,
}

impl Ed25519KeyPair {
    /// Generates a new key pair from the OS RNG.
    pub fn generate() -> Self {
        let mut rng = OsRng;
        Self {
            signing: SigningKey::generate(&mut rng),
        }
    }

    /// Restores a key pair from a 32-byte seed.
    pub fn from_seed(seed: &[u8]) -> Result<Self, CryptoError> {
        let seed: [u8; 32] = seed.try_into().map_err(|_| {
            CryptoError::InvalidKey("Ed25519 seed must be 32 bytes".to_string())
        })?;
        Ok(Self {
            signing: SigningKey::from_bytes(&seed),
        })
    }

    /// Restores a key pair from the 64-byte `seed || public` form.
    pub fn from_keypair_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; PRIVATE_KEY_LEN] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidKey("Ed25519 private key must be 64 bytes".to_string())
        })?;
        SigningKey::from_keypair_bytes(&bytes)
            .map(|signing| Self { signing })
            .map_err(|e| CryptoError::InvalidKey(format!("inconsistent Ed25519 key pair: {e}")))
    }

    /// The 32-byte seed.
    pub fn seed(&self) -> [u8; 32] {
        self.signing.to_bytes()
    }

    /// The 64-byte `seed || public` private form.
    pub fn to_keypair_bytes(&self) -> [u8; PRIVATE_KEY_LEN] {
        self.signing.to_keypair_bytes()
    }

    /// The 32-byte public key.
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.signing.verifying_key().to_bytes()
    }

    /// The verifying half.
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing.verifying_key()
    }

    /// Signs a message, producing a 64-byte signature.
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_LEN] {
        self.signing.sign(message).to_bytes()
    }
}

/// Verifies an Ed25519 signature over `message`.
pub fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
    let public: [u8; PUBLIC_KEY_LEN] = public_key.try_into().map_err(|_| {
        CryptoError::InvalidKey("Ed25519 public key must be 32 bytes".to_string())
    })?;
    let key = VerifyingKey::from_bytes(&public)
        .map_err(|e| CryptoError::InvalidKey(format!("failed to parse public key: {e}")))?;
    let signature = Signature::from_slice(signature)
        .map_err(|_| CryptoError::InvalidSignature)?;
    key.verify(message, &signature)
        .map_err(|_| CryptoError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_round_trip() {
        let kp = Ed25519KeyPair::generate();
        let message = b"Test message";
        let sig = kp.sign(message);
        assert_eq!(sig.len(), SIGNATURE_LEN);
        assert!(verify(&kp.public_key_bytes(), message, &sig).is_ok());
    }

    #[test]
    fn tampered_message_fails() {
        let kp = Ed25519KeyPair::generate();
        let sig = kp.sign(b"Original message");
        assert_eq!(
            verify(&kp.public_key_bytes(), b"Tampered message", &sig),
            Err(CryptoError::InvalidSignature)
        );
    }

    #[test]
    fn seed_round_trip_is_deterministic() {
        let kp = Ed25519KeyPair::generate();
        let restored = Ed25519KeyPair::from_seed(&kp.seed()).unwrap();
        assert_eq!(kp.public_key_bytes(), restored.public_key_bytes());
        assert_eq!(kp.sign(b"m"), restored.sign(b"m"));
    }

    #[test]
    fn keypair_bytes_are_64() {
        let kp = Ed25519KeyPair::generate();
        let full = kp.to_keypair_bytes();
        assert_eq!(full.len(), PRIVATE_KEY_LEN);
        let restored = Ed25519KeyPair::from_keypair_bytes(&full).unwrap();
        assert_eq!(kp.public_key_bytes(), restored.public_key_bytes());
    }
}
