// Path: crates/api/src/resolver.rs

//! Resolution seams: DID -> agent record, and `keyid` -> raw key material.
//!
//! Verifiers and the handshake depend on these rather than on a concrete
//! registry client, so tests can plug in fixed key sets and the production
//! wiring can plug in a caching resolver without touching either consumer.

use async_trait::async_trait;
use sage_types::agent::AgentRecord;
use sage_types::did::Did;
use sage_types::error::RegistryError;
use sage_types::message::KeyAlgorithm;

/// Resolves DIDs to live agent records.
#[async_trait]
pub trait AgentResolver: Send + Sync {
    /// Resolves the DID, failing with [`RegistryError::NotFound`] when no
    /// active record exists.
    async fn resolve(&self, did: &Did) -> Result<AgentRecord, RegistryError>;
}

/// Raw public key material resolved for a signature's `keyid`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKey {
    /// The key algorithm, dictating how the bytes are parsed.
    pub algorithm: KeyAlgorithm,
    /// The raw public key bytes.
    pub public_key: Vec<u8>,
}

/// Resolves the `keyid` stated in a signature to verification key material.
///
/// For SAGE messages the `keyid` is the signer's DID and the material is the
/// identity key of the resolved record.
#[async_trait]
pub trait KeyResolver: Send + Sync {
    /// Resolves the key id, failing when it is unknown or deactivated.
    async fn resolve_key(&self, key_id: &str) -> Result<ResolvedKey, RegistryError>;
}
