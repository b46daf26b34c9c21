// Path: crates/crypto/src/keys/x25519.rs
//! X25519 key-agreement keys. KEM only; these keys never sign.

use crate::error::CryptoError;
use rand::rngs::OsRng;
use x25519_dalek::{PublicKey, StaticSecret};

/// Key length in bytes (both halves).
pub const KEY_LEN: usize = 32;

/// An X25519 key pair.
#[derive(Clone)]
pub struct X25519KeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl X25519KeyPair {
    /// Generates a new key pair from the OS RNG.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Restores a key pair from a 32-byte secret.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidKey("X25519 secret must be 32 bytes".to_string())
        })?;
        let secret = StaticSecret::from(bytes);
        let public = PublicKey::from(&secret);
        Ok(Self { secret, public })
    }

    /// The 32-byte secret.
    pub fn secret_bytes(&self) -> [u8; KEY_LEN] {
        self.secret.to_bytes()
    }

    /// The 32-byte public key.
    pub fn public_key_bytes(&self) -> [u8; KEY_LEN] {
        self.public.to_bytes()
    }

    /// Raw Diffie–Hellman against a peer public key.
    pub fn diffie_hellman(&self, peer_public: &[u8]) -> Result<[u8; KEY_LEN], CryptoError> {
        let peer: [u8; KEY_LEN] = peer_public.try_into().map_err(|_| {
            CryptoError::InvalidKey("X25519 public key must be 32 bytes".to_string())
        })?;
        let shared = self.secret.diffie_hellman(&PublicKey::from(peer));
        Ok(shared.to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_secrets_agree() {
        let a = X25519KeyPair::generate();
        let b = X25519KeyPair::generate();
        let ab = a.diffie_hellman(&b.public_key_bytes()).unwrap();
        let ba = b.diffie_hellman(&a.public_key_bytes()).unwrap();
        assert_eq!(ab, ba);
    }

    #[test]
    fn secret_round_trip() {
        let kp = X25519KeyPair::generate();
        let restored = X25519KeyPair::from_secret_bytes(&kp.secret_bytes()).unwrap();
        assert_eq!(kp.public_key_bytes(), restored.public_key_bytes());
    }
}
