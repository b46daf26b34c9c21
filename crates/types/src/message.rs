// Path: crates/types/src/message.rs

//! Application-level message shapes and the signature parameters carried by
//! RFC 9421 signatures.

use crate::did::Did;
use crate::error::SignatureError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of key algorithms the workspace supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyAlgorithm {
    /// Ed25519 signing.
    Ed25519,
    /// ECDSA over NIST P-256.
    EcdsaP256,
    /// ECDSA over secp256k1.
    EcdsaSecp256k1,
    /// X25519 key agreement (KEM only).
    X25519,
}

impl KeyAlgorithm {
    /// Whether keys of this algorithm can produce signatures.
    pub fn is_signing(&self) -> bool {
        !matches!(self, KeyAlgorithm::X25519)
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KeyAlgorithm::Ed25519 => "ed25519",
            KeyAlgorithm::EcdsaP256 => "ecdsa-p256",
            KeyAlgorithm::EcdsaSecp256k1 => "ecdsa-secp256k1",
            KeyAlgorithm::X25519 => "x25519",
        };
        f.write_str(s)
    }
}

/// The signature algorithm identifiers admitted in RFC 9421 `alg` parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureAlgorithm {
    /// Ed25519 (`alg="ed25519"`), 64-byte signatures.
    Ed25519,
    /// ECDSA P-256 with SHA-256 (`alg="es256"`), raw 64-byte `(r || s)`.
    Es256,
    /// ECDSA secp256k1 with SHA-256 (`alg="es256k"`), raw 64-byte `(r || s)`.
    Es256k,
}

impl SignatureAlgorithm {
    /// The wire identifier used in the `alg` signature parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Ed25519 => "ed25519",
            SignatureAlgorithm::Es256 => "es256",
            SignatureAlgorithm::Es256k => "es256k",
        }
    }

    /// The expected signature length in bytes.
    pub fn signature_len(&self) -> usize {
        64
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ed25519" => Ok(SignatureAlgorithm::Ed25519),
            "es256" => Ok(SignatureAlgorithm::Es256),
            "es256k" => Ok(SignatureAlgorithm::Es256k),
            other => Err(SignatureError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The parameters bound into an RFC 9421 signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureParameters {
    /// The signer's key identifier (for SAGE messages, the agent DID).
    pub key_id: String,
    /// The signature algorithm.
    pub algorithm: SignatureAlgorithm,
    /// Signature creation time, unix seconds.
    pub created: u64,
    /// Optional single-use token binding the signature into the replay ledger.
    pub nonce: Option<String>,
    /// Optional expiry, unix seconds; must be in the future when present.
    pub expires: Option<u64>,
}

/// The freshness-relevant header of an application message.
///
/// These are the fields the validator pipeline consumes: the nonce feeds the
/// replay ledger, `sequence`/`timestamp_ms` feed per-session ordering, and
/// all three feed the dedupe content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeader {
    /// The sender's DID.
    pub agent_did: Did,
    /// Caller-assigned unique message id.
    pub message_id: String,
    /// Send time, unix milliseconds.
    pub timestamp_ms: u64,
    /// Single-use token (22-char base64url).
    pub nonce: String,
    /// Per-session strictly increasing sequence number.
    pub sequence: u64,
}

/// The default field set covered by a [`SignedMessage`] signature.
pub const DEFAULT_SIGNED_FIELDS: [&str; 5] =
    ["agent_did", "message_id", "timestamp", "nonce", "body"];

/// A structured, signed application message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedMessage {
    /// Freshness header.
    pub header: MessageHeader,
    /// Opaque payload bytes.
    pub body: Vec<u8>,
    /// The ordered field names covered by the signature.
    pub signed_fields: Vec<String>,
    /// The signature parameters.
    pub signature_params: SignatureParameters,
    /// The raw signature bytes.
    pub signature: Vec<u8>,
}

impl SignedMessage {
    /// Returns the default covered-field list as owned strings.
    pub fn default_signed_fields() -> Vec<String> {
        DEFAULT_SIGNED_FIELDS.iter().map(|s| s.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_wire_names_round_trip() {
        for alg in [
            SignatureAlgorithm::Ed25519,
            SignatureAlgorithm::Es256,
            SignatureAlgorithm::Es256k,
        ] {
            assert_eq!(alg.as_str().parse::<SignatureAlgorithm>().unwrap(), alg);
        }
        assert!("rsa-pss-sha512".parse::<SignatureAlgorithm>().is_err());
    }

    #[test]
    fn x25519_is_kem_only() {
        assert!(!KeyAlgorithm::X25519.is_signing());
        assert!(KeyAlgorithm::Ed25519.is_signing());
    }
}
