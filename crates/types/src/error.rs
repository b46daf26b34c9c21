// Path: crates/types/src/error.rs

//! Core error types for SAGE.
//!
//! Every error enum implements [`ErrorCode`], assigning each variant a
//! short, stable, machine-readable kind string. Library entry points return
//! the tagged error; tooling surfaces translate codes to operator-readable
//! messages.

use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Errors related to DID syntax and identity derivation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DidError {
    /// The DID string is syntactically invalid or violates a record constraint.
    #[error("invalid DID: {0}")]
    Invalid(String),
    /// The network segment names a chain this deployment does not support.
    #[error("unsupported network: {0}")]
    UnsupportedNetwork(String),
}

impl ErrorCode for DidError {
    fn code(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "DID_INVALID",
            Self::UnsupportedNetwork(_) => "DID_UNSUPPORTED_NETWORK",
        }
    }
}

/// Errors produced by key material operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// A key could not be parsed or failed a size constraint.
    #[error("invalid key: {0}")]
    InvalidKey(String),
    /// Signature verification failed.
    #[error("invalid signature")]
    InvalidSignature,
    /// The requested serialization format is not supported for this algorithm.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    /// A signing operation was requested on a KEM-only (X25519) key.
    #[error("key is KEM-only and cannot sign")]
    KemOnlyKey,
    /// A lower-level cryptographic operation failed.
    #[error("crypto operation failed: {0}")]
    OperationFailed(String),
    /// The provided input was malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ErrorCode for CryptoError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidKey(_) => "INVALID_KEY",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            Self::KemOnlyKey => "KEM_ONLY_KEY",
            Self::OperationFailed(_) => "CRYPTO_OPERATION_FAILED",
            Self::InvalidInput(_) => "CRYPTO_INVALID_INPUT",
        }
    }
}

/// Errors produced by the encrypted key vault.
#[derive(Error, Debug)]
pub enum VaultError {
    /// The passphrase failed to authenticate the stored key.
    #[error("wrong passphrase or corrupted vault file")]
    WrongPassphrase,
    /// The file is not a vault file or uses an unknown version.
    #[error("invalid vault format: {0}")]
    InvalidFormat(String),
    /// An underlying filesystem operation failed.
    #[error("vault I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A key (de)serialization step failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl ErrorCode for VaultError {
    fn code(&self) -> &'static str {
        match self {
            Self::WrongPassphrase => "WRONG_PASSPHRASE",
            Self::InvalidFormat(_) => "VAULT_INVALID_FORMAT",
            Self::Io(_) => "VAULT_IO",
            Self::Crypto(e) => e.code(),
        }
    }
}

/// Errors produced by the message freshness pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The nonce has been used before within its TTL.
    #[error("nonce has been used: {0}")]
    Replay(String),
    /// The content hash of the message was seen before within its TTL.
    #[error("duplicate message content")]
    Duplicate,
    /// The timestamp is more than the allowed window behind the session's last.
    #[error("message timestamp out of order")]
    OutOfOrder,
    /// The sequence number does not advance the session's last sequence.
    #[error("invalid sequence number: {got} <= {last}")]
    InvalidSequence {
        /// The sequence number carried by the message.
        got: u64,
        /// The last accepted sequence number.
        last: u64,
    },
    /// The message timestamp is outside the accepted skew window.
    #[error("timestamp outside tolerance: {delta_ms}ms from local clock")]
    TimestampSkew {
        /// Absolute distance from the local clock, milliseconds.
        delta_ms: u64,
    },
}

impl ErrorCode for ValidationError {
    fn code(&self) -> &'static str {
        match self {
            Self::Replay(_) => "REPLAY",
            Self::Duplicate => "DUPLICATE",
            Self::OutOfOrder => "OUT_OF_ORDER",
            Self::InvalidSequence { .. } => "INVALID_SEQUENCE",
            Self::TimestampSkew { .. } => "TIMESTAMP_SKEW",
        }
    }
}

/// Errors produced by the RFC 9421 engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// The signature parameters carry no `keyid`.
    #[error("missing keyid signature parameter")]
    MissingKeyId,
    /// The `alg` parameter names an algorithm outside the supported set.
    #[error("unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),
    /// A `Signature-Input` or `Signature` header could not be parsed.
    #[error("malformed signature header: {0}")]
    MalformedHeader(String),
    /// A covered component is absent from the message.
    #[error("covered component absent: {0}")]
    MissingComponent(String),
    /// A covered component resolves ambiguously.
    #[error("covered component ambiguous: {0}")]
    AmbiguousComponent(String),
    /// The `created` parameter is outside the configured skew window.
    #[error("signature created outside tolerance: {delta_secs}s from local clock")]
    CreatedSkew {
        /// Absolute distance from the local clock, seconds.
        delta_secs: u64,
    },
    /// The `expires` parameter is in the past.
    #[error("signature expired at {expires}")]
    Expired {
        /// The expiry carried by the signature, unix seconds.
        expires: u64,
    },
    /// No key could be resolved for the stated `keyid`.
    #[error("key resolution failed for {0}")]
    KeyResolution(String),
    /// The cryptographic verification itself failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    /// A freshness check rejected the message.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ErrorCode for SignatureError {
    fn code(&self) -> &'static str {
        match self {
            Self::MissingKeyId => "MISSING_KEY_ID",
            Self::UnsupportedAlgorithm(_) => "UNSUPPORTED_ALGORITHM",
            Self::MalformedHeader(_) => "MALFORMED_SIGNATURE_HEADER",
            Self::MissingComponent(_) => "MISSING_COVERED_COMPONENT",
            Self::AmbiguousComponent(_) => "AMBIGUOUS_COVERED_COMPONENT",
            Self::CreatedSkew { .. } => "TIMESTAMP_SKEW",
            Self::Expired { .. } => "SIGNATURE_EXPIRED",
            Self::KeyResolution(_) => "KEY_RESOLUTION_FAILED",
            Self::Crypto(e) => e.code(),
            Self::Validation(e) => e.code(),
        }
    }
}

/// Errors produced by the registry client.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No record exists for the DID.
    #[error("DID not found: {0}")]
    NotFound(String),
    /// The DID is already registered (by this or another committer).
    #[error("DID already registered: {0}")]
    DidTaken(String),
    /// The reveal named a commitment the contract does not hold.
    #[error("commitment not found")]
    CommitNotFound,
    /// The reveal arrived outside the commitment window.
    #[error("commitment expired or revealed too early")]
    CommitExpired,
    /// The caller-supplied deadline elapsed before the transport returned.
    #[error("registry deadline exceeded")]
    DeadlineExceeded,
    /// The contract rejected the transaction.
    #[error("registry rejected: {0}")]
    Rejected(String),
    /// The underlying transport failed; the caller may retry.
    #[error("registry transport error: {0}")]
    Transport(String),
    /// A record or request violated a DID-level constraint.
    #[error(transparent)]
    Did(#[from] DidError),
    /// A signing step failed while building a transaction.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl ErrorCode for RegistryError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::DidTaken(_) => "DID_TAKEN",
            Self::CommitNotFound => "COMMIT_NOT_FOUND",
            Self::CommitExpired => "COMMIT_EXPIRED",
            Self::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Self::Rejected(_) => "REGISTRY_REJECTED",
            Self::Transport(_) => "REGISTRY_TRANSPORT",
            Self::Did(e) => e.code(),
            Self::Crypto(e) => e.code(),
        }
    }
}

/// Errors produced by the session layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No live session exists under the id.
    #[error("session not found: {0}")]
    NotFound(String),
    /// A session already exists under the id.
    #[error("session already exists: {0}")]
    Duplicate(String),
    /// The session hit its age, idle, or message-count limit.
    #[error("session expired")]
    Expired,
    /// AEAD sealing or opening failed (tampered frame or wrong key).
    #[error("AEAD authentication failed")]
    Aead,
    /// A frame was too short or otherwise structurally invalid.
    #[error("malformed session frame: {0}")]
    MalformedFrame(String),
    /// Session key derivation failed.
    #[error("session key derivation failed: {0}")]
    KeyDerivation(String),
}

impl ErrorCode for SessionError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "SESSION_NOT_FOUND",
            Self::Duplicate(_) => "SESSION_DUPLICATE",
            Self::Expired => "SESSION_EXPIRED",
            Self::Aead => "SESSION_AEAD_FAILED",
            Self::MalformedFrame(_) => "SESSION_MALFORMED_FRAME",
            Self::KeyDerivation(_) => "SESSION_KEY_DERIVATION",
        }
    }
}

/// Errors produced by the HPKE handshake.
#[derive(Error, Debug)]
pub enum HandshakeError {
    /// A peer DID could not be resolved or lacked the required key.
    #[error("resolver lookup failed: {0}")]
    ResolverLookup(String),
    /// A handshake signature failed to verify.
    #[error("handshake signature verification failed")]
    SignatureVerification,
    /// The key-confirmation tag did not match (MITM/UKS defence).
    #[error("ack tag mismatch")]
    AckTagMismatch,
    /// HPKE decapsulation failed.
    #[error("KEM decapsulation failed")]
    KemDecapsulation,
    /// HPKE encapsulation or export failed.
    #[error("HPKE operation failed: {0}")]
    Hpke(String),
    /// A wire message could not be decoded.
    #[error("malformed handshake message: {0}")]
    MalformedMessage(String),
    /// Installing the derived session failed.
    #[error(transparent)]
    Session(#[from] SessionError),
    /// A key operation failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl ErrorCode for HandshakeError {
    fn code(&self) -> &'static str {
        match self {
            Self::ResolverLookup(_) => "RESOLVER_LOOKUP",
            Self::SignatureVerification => "SIGNATURE_VERIFICATION",
            Self::AckTagMismatch => "ACK_TAG_MISMATCH",
            Self::KemDecapsulation => "KEM_DECAPSULATION",
            Self::Hpke(_) => "HPKE_FAILED",
            Self::MalformedMessage(_) => "HANDSHAKE_MALFORMED",
            Self::Session(e) => e.code(),
            Self::Crypto(e) => e.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_message_names_the_nonce() {
        let err = ValidationError::Replay("nAnLbQTxYlXOQC9VgZ-uWg".into());
        let msg = err.to_string();
        assert!(msg.contains("nonce has been used"));
        assert!(msg.contains("nAnLbQTxYlXOQC9VgZ-uWg"));
        assert_eq!(err.code(), "REPLAY");
    }

    #[test]
    fn codes_are_stable_through_wrapping() {
        let inner = ValidationError::Replay("n".into());
        let outer = SignatureError::Validation(inner);
        assert_eq!(outer.code(), "REPLAY");

        let crypto = SignatureError::Crypto(CryptoError::InvalidSignature);
        assert_eq!(crypto.code(), "INVALID_SIGNATURE");
    }

    #[test]
    fn registry_codes() {
        assert_eq!(RegistryError::DeadlineExceeded.code(), "DEADLINE_EXCEEDED");
        assert_eq!(RegistryError::DidTaken("d".into()).code(), "DID_TAKEN");
        assert_eq!(SessionError::Expired.code(), "SESSION_EXPIRED");
        assert_eq!(HandshakeError::AckTagMismatch.code(), "ACK_TAG_MISMATCH");
    }
}
