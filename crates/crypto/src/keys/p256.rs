// Path: crates/crypto/src/keys/p256.rs
//! ECDSA signing keys over NIST P-256.

use crate::error::CryptoError;
use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;

/// Private scalar length in bytes.
pub const PRIVATE_KEY_LEN: usize = 32;
/// Raw signature length in bytes (`r || s`).
pub const SIGNATURE_LEN: usize = 64;

/// An ECDSA P-256 key pair.
#[derive(Clone)]
pub struct P256KeyPair {
    signing: SigningKey,
}

impl P256KeyPair {
    /// Generates a new key pair from the OS RNG.
    pub fn generate() -> Self {
        let mut rng = OsRng;
        Self {
            signing: SigningKey::random(&mut rng),
        }
    }

    /// Restores a key pair from a 32-byte private scalar.
    pub fn from_private_scalar(scalar: &[u8]) -> Result<Self, CryptoError> {
        if scalar.len() != PRIVATE_KEY_LEN {
            return Err(CryptoError::InvalidKey(
                "P-256 private scalar must be 32 bytes".to_string(),
            ));
        }
        SigningKey::from_slice(scalar)
            .map(|signing| Self { signing })
            .map_err(|e| CryptoError::InvalidKey(format!("failed to parse P-256 scalar: {e}")))
    }

    /// The 32-byte private scalar.
    pub fn private_scalar(&self) -> [u8; PRIVATE_KEY_LEN] {
        self.signing.to_bytes().into()
    }

    /// The SEC1-compressed public key (33 bytes).
    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.signing
            .verifying_key()
            .to_encoded_point(true)
            .as_bytes()
            .to_vec()
    }

    /// The SEC1-uncompressed public point (65 bytes including the 0x04 tag).
    pub fn public_key_uncompressed(&self) -> Vec<u8> {
        self.signing
            .verifying_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec()
    }

    /// The verifying half.
    pub fn verifying_key(&self) -> VerifyingKey {
        *self.signing.verifying_key()
    }

    /// Signs a message (RFC 6979 deterministic, SHA-256), producing a raw
    /// 64-byte `r || s` signature.
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_LEN] {
        let signature: Signature = self.signing.sign(message);
        let mut out = [0u8; SIGNATURE_LEN];
        out.copy_from_slice(&signature.to_bytes());
        out
    }

    /// Signs a message, producing the ASN.1 DER `(r, s)` encoding.
    pub fn sign_der(&self, message: &[u8]) -> Vec<u8> {
        let signature: Signature = self.signing.sign(message);
        signature.to_der().as_bytes().to_vec()
    }
}

/// Verifies a P-256 signature over `message`, accepting the raw 64-byte
/// form or the DER encoding.
///
/// The public key may be in compressed or uncompressed SEC1 form.
pub fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
    let key = VerifyingKey::from_sec1_bytes(public_key)
        .map_err(|e| CryptoError::InvalidKey(format!("failed to parse P-256 key: {e}")))?;
    let signature = Signature::from_slice(signature)
        .or_else(|_| Signature::from_der(signature))
        .map_err(|_| CryptoError::InvalidSignature)?;
    key.verify(message, &signature)
        .map_err(|_| CryptoError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_round_trip() {
        let kp = P256KeyPair::generate();
        let sig = kp.sign(b"payload");
        assert_eq!(sig.len(), SIGNATURE_LEN);
        assert!(verify(&kp.public_key_bytes(), b"payload", &sig).is_ok());
        assert!(verify(&kp.public_key_uncompressed(), b"payload", &sig).is_ok());
    }

    #[test]
    fn tampered_message_fails() {
        let kp = P256KeyPair::generate();
        let sig = kp.sign(b"payload");
        assert!(verify(&kp.public_key_bytes(), b"payload!", &sig).is_err());
    }

    #[test]
    fn scalar_round_trip() {
        let kp = P256KeyPair::generate();
        let restored = P256KeyPair::from_private_scalar(&kp.private_scalar()).unwrap();
        assert_eq!(kp.public_key_bytes(), restored.public_key_bytes());
    }

    #[test]
    fn uncompressed_point_is_tagged() {
        let kp = P256KeyPair::generate();
        let point = kp.public_key_uncompressed();
        assert_eq!(point.len(), 65);
        assert_eq!(point.first(), Some(&0x04));
    }

    #[test]
    fn der_form_verifies() {
        let kp = P256KeyPair::generate();
        let der = kp.sign_der(b"payload");
        assert!(der.len() > SIGNATURE_LEN);
        assert!(verify(&kp.public_key_bytes(), b"payload", &der).is_ok());
    }
}
