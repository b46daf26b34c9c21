// Path: crates/crypto/src/keys/secp256k1.rs
//! ECDSA signing keys over secp256k1, with the recoverable form used by
//! Ethereum flows.

use crate::error::CryptoError;
use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use sha3::{Digest, Keccak256};

/// Private scalar length in bytes.
pub const PRIVATE_KEY_LEN: usize = 32;
/// Uncompressed public key length in bytes, including the 0x04 tag.
pub const PUBLIC_KEY_UNCOMPRESSED_LEN: usize = 65;
/// Raw signature length in bytes (`r || s`).
pub const SIGNATURE_LEN: usize = 64;
/// Recoverable signature length in bytes (`r || s || v`).
pub const RECOVERABLE_SIGNATURE_LEN: usize = 65;

/// An ECDSA secp256k1 key pair.
#[derive(Clone)]
pub struct Secp256k1KeyPair {
    signing: SigningKey,
}

impl Secp256k1KeyPair {
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
                "secp256k1 private scalar must be 32 bytes".to_string(),
            ));
        }
        SigningKey::from_slice(scalar)
            .map(|signing| Self { signing })
            .map_err(|e| {
                CryptoError::InvalidKey(format!("failed to parse secp256k1 scalar: {e}"))
            })
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

    /// Signs with Ethereum semantics: the message is Keccak-256 hashed and
    /// the output is the 65-byte `r || s || v` form with `v = recid + 27`.
    pub fn sign_recoverable(
        &self,
        message: &[u8],
    ) -> Result<[u8; RECOVERABLE_SIGNATURE_LEN], CryptoError> {
        let prehash: [u8; 32] = Keccak256::digest(message).into();
        let (signature, recovery_id) = self
            .signing
            .sign_prehash_recoverable(&prehash)
            .map_err(|e| CryptoError::OperationFailed(format!("recoverable sign failed: {e}")))?;
        let mut out = [0u8; RECOVERABLE_SIGNATURE_LEN];
        let (rs, v) = out.split_at_mut(SIGNATURE_LEN);
        rs.copy_from_slice(&signature.to_bytes());
        if let Some(v) = v.first_mut() {
            *v = recovery_id.to_byte() + 27;
        }
        Ok(out)
    }
}

/// Verifies a secp256k1 signature over `message`, accepting the raw
/// 64-byte form or the DER encoding.
pub fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
    let key = VerifyingKey::from_sec1_bytes(public_key)
        .map_err(|e| CryptoError::InvalidKey(format!("failed to parse secp256k1 key: {e}")))?;
    let signature = Signature::from_slice(signature)
        .or_else(|_| Signature::from_der(signature))
        .map_err(|_| CryptoError::InvalidSignature)?;
    key.verify(message, &signature)
        .map_err(|_| CryptoError::InvalidSignature)
}

/// Recovers the uncompressed public key from an Ethereum-style 65-byte
/// recoverable signature over `message`.
pub fn recover_public_key(
    message: &[u8],
    signature: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if signature.len() != RECOVERABLE_SIGNATURE_LEN {
        return Err(CryptoError::InvalidInput(
            "recoverable signature must be 65 bytes".to_string(),
        ));
    }
    let (rs, v) = signature.split_at(SIGNATURE_LEN);
    let v = v.first().copied().unwrap_or_default();
    let recovery_id = k256::ecdsa::RecoveryId::try_from(v.wrapping_sub(27))
        .map_err(|_| CryptoError::InvalidInput(format!("invalid recovery byte {v}")))?;
    let signature = Signature::from_slice(rs).map_err(|_| CryptoError::InvalidSignature)?;
    let prehash: [u8; 32] = Keccak256::digest(message).into();
    let key = VerifyingKey::recover_from_prehash(&prehash, &signature, recovery_id)
        .map_err(|_| CryptoError::InvalidSignature)?;
    Ok(key.to_encoded_point(false).as_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_round_trip() {
        let kp = Secp256k1KeyPair::generate();
        let sig = kp.sign(b"transaction");
        assert_eq!(sig.len(), SIGNATURE_LEN);
        assert!(verify(&kp.public_key_bytes(), b"transaction", &sig).is_ok());
    }

    #[test]
    fn recoverable_signature_recovers_signer() {
        let kp = Secp256k1KeyPair::generate();
        let sig = kp.sign_recoverable(b"transaction").unwrap();
        assert_eq!(sig.len(), RECOVERABLE_SIGNATURE_LEN);
        let v = sig[64];
        assert!(v == 27 || v == 28);

        let recovered = recover_public_key(b"transaction", &sig).unwrap();
        assert_eq!(recovered, kp.public_key_uncompressed());
    }

    #[test]
    fn tampered_message_does_not_recover_signer() {
        let kp = Secp256k1KeyPair::generate();
        let sig = kp.sign_recoverable(b"transaction").unwrap();
        match recover_public_key(b"tampered", &sig) {
            Ok(recovered) => assert_ne!(recovered, kp.public_key_uncompressed()),
            Err(_) => {} // some tampered inputs fail recovery outright
        }
    }

    #[test]
    fn uncompressed_point_shape() {
        let kp = Secp256k1KeyPair::generate();
        let point = kp.public_key_uncompressed();
        assert_eq!(point.len(), PUBLIC_KEY_UNCOMPRESSED_LEN);
        assert_eq!(point.first(), Some(&0x04));
    }

    #[test]
    fn der_form_verifies() {
        let kp = Secp256k1KeyPair::generate();
        let der = kp.sign_der(b"payload");
        assert!(der.len() > SIGNATURE_LEN);
        assert!(verify(&kp.public_key_bytes(), b"payload", &der).is_ok());
    }
}
