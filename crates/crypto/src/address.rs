// Path: crates/crypto/src/address.rs
//! Ethereum address derivation from secp256k1 public keys.
//!
//! Address = keccak256(uncompressed_pubkey[1..])[12..32], rendered with the
//! EIP-55 mixed-case checksum.

use crate::error::CryptoError;
use crate::keys::PublicKey;
use sha3::{Digest, Keccak256};
use std::fmt;

/// A 20-byte Ethereum account address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EthereumAddress(pub [u8; 20]);

impl EthereumAddress {
    /// The raw 20 bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// The EIP-55 checksum-cased hex form, `0x`-prefixed.
    pub fn to_checksum_string(&self) -> String {
        let lower = hex::encode(self.0);
        let digest = Keccak256::digest(lower.as_bytes());
        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = digest
                .get(i / 2)
                .map(|b| if i % 2 == 0 { b >> 4 } else { b & 0x0f })
                .unwrap_or_default();
            if c.is_ascii_hexdigit() && c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Parses an address from hex (with or without `0x`), verifying the
    /// EIP-55 checksum when the input is mixed-case.
    pub fn parse(text: &str) -> Result<Self, CryptoError> {
        let hex_part = text.strip_prefix("0x").unwrap_or(text);
        let bytes = hex::decode(hex_part)
            .map_err(|e| CryptoError::InvalidInput(format!("bad address hex: {e}")))?;
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidInput("address must be 20 bytes".to_string()))?;
        let addr = Self(bytes);

        let has_upper = hex_part.chars().any(|c| c.is_ascii_uppercase());
        let has_lower = hex_part.chars().any(|c| c.is_ascii_lowercase());
        if has_upper && has_lower && addr.to_checksum_string() != format!("0x{hex_part}") {
            return Err(CryptoError::InvalidInput(
                "EIP-55 checksum mismatch".to_string(),
            ));
        }
        Ok(addr)
    }
}

impl fmt::Display for EthereumAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum_string())
    }
}

/// Derives the Ethereum address of a secp256k1 public key.
///
/// Accepts the compressed or uncompressed SEC1 encoding; any other key
/// algorithm is rejected.
pub fn ethereum_address(public: &PublicKey) -> Result<EthereumAddress, CryptoError> {
    let sec1 = match public {
        PublicKey::EcdsaSecp256k1(bytes) => bytes,
        other => {
            return Err(CryptoError::UnsupportedFormat(format!(
                "Ethereum addresses derive from secp256k1 keys, not {}",
                other.algorithm()
            )))
        }
    };
    let key = k256::ecdsa::VerifyingKey::from_sec1_bytes(sec1)
        .map_err(|e| CryptoError::InvalidKey(format!("invalid secp256k1 key: {e}")))?;
    let point = key.to_encoded_point(false);
    ethereum_address_from_uncompressed(point.as_bytes())
}

/// Derives the Ethereum address from a 65-byte uncompressed public point.
pub fn ethereum_address_from_uncompressed(
    uncompressed: &[u8],
) -> Result<EthereumAddress, CryptoError> {
    if uncompressed.len() != 65 || uncompressed.first() != Some(&0x04) {
        return Err(CryptoError::InvalidKey(
            "expected a 65-byte uncompressed secp256k1 point".to_string(),
        ));
    }
    let body = uncompressed.get(1..).unwrap_or_default();
    let digest = Keccak256::digest(body);
    let tail = digest.get(12..).unwrap_or_default();
    let bytes: [u8; 20] = tail
        .try_into()
        .map_err(|_| CryptoError::OperationFailed("keccak digest too short".to_string()))?;
    Ok(EthereumAddress(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyPair;
    use sage_types::message::KeyAlgorithm;

    #[test]
    fn eip55_reference_vectors() {
        // Vectors from the EIP-55 specification.
        for expected in [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ] {
            let addr = EthereumAddress::parse(&expected.to_lowercase()).unwrap();
            assert_eq!(addr.to_checksum_string(), *expected);
        }
    }

    #[test]
    fn checksum_mismatch_is_rejected() {
        // Lowercase the last letter of a valid checksummed address.
        assert!(EthereumAddress::parse("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAeD").is_err());
    }

    #[test]
    fn derivation_matches_between_encodings() {
        let kp = KeyPair::generate(KeyAlgorithm::EcdsaSecp256k1);
        let from_enum = ethereum_address(&kp.public_key()).unwrap();
        let uncompressed = match &kp {
            KeyPair::EcdsaSecp256k1(inner) => inner.public_key_uncompressed(),
            _ => unreachable!(),
        };
        let from_point = ethereum_address_from_uncompressed(&uncompressed).unwrap();
        assert_eq!(from_enum, from_point);
        assert!(from_enum.to_checksum_string().starts_with("0x"));
        assert_eq!(from_enum.to_checksum_string().len(), 42);
    }

    #[test]
    fn non_secp256k1_keys_rejected() {
        let kp = KeyPair::generate(KeyAlgorithm::Ed25519);
        assert!(matches!(
            ethereum_address(&kp.public_key()),
            Err(CryptoError::UnsupportedFormat(_))
        ));
    }
}
