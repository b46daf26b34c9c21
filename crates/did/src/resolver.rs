// Path: crates/did/src/resolver.rs
//! Resolver adapters over a registry client.
//!
//! [`DidResolver`] is what verifiers and the handshake consume: it applies
//! the configured deadline, refuses deactivated records, and maps the
//! record's identity key into raw verification material.
//!
//! Registry `ecdsa` keys are secp256k1: SAGE records are anchored in an
//! EVM registry and the contract's ownership proofs rely on `ecrecover`.
//! P-256 appears in the RFC 9421 layer, not in registry records.

use async_trait::async_trait;
use sage_api::registry::RegistryClient;
use sage_api::resolver::{AgentResolver, KeyResolver, ResolvedKey};
use sage_types::agent::{AgentRecord, KeyType};
use sage_types::did::Did;
use sage_types::error::RegistryError;
use sage_types::message::KeyAlgorithm;
use std::sync::Arc;
use std::time::Duration;

/// Deadline-bounded DID resolution over any [`RegistryClient`].
pub struct DidResolver {
    client: Arc<dyn RegistryClient>,
    deadline: Duration,
}

impl DidResolver {
    /// Builds a resolver applying `deadline` to every lookup.
    pub fn new(client: Arc<dyn RegistryClient>, deadline: Duration) -> Self {
        Self { client, deadline }
    }
}

/// The key algorithm a registry key type resolves to.
fn algorithm_of(key_type: KeyType) -> KeyAlgorithm {
    match key_type {
        KeyType::Ecdsa => KeyAlgorithm::EcdsaSecp256k1,
        KeyType::Ed25519 => KeyAlgorithm::Ed25519,
        KeyType::X25519 => KeyAlgorithm::X25519,
    }
}

#[async_trait]
impl AgentResolver for DidResolver {
    async fn resolve(&self, did: &Did) -> Result<AgentRecord, RegistryError> {
        let record = self.client.resolve(did, self.deadline).await?;
        if !record.active {
            return Err(RegistryError::NotFound(format!("{did} is deactivated")));
        }
        Ok(record)
    }
}

#[async_trait]
impl KeyResolver for DidResolver {
    async fn resolve_key(&self, key_id: &str) -> Result<ResolvedKey, RegistryError> {
        let did: Did = key_id
            .parse()
            .map_err(|e: sage_types::error::DidError| RegistryError::Did(e))?;
        let record = AgentResolver::resolve(self, &did).await?;
        let identity = record
            .identity_key()
            .ok_or_else(|| RegistryError::NotFound(format!("{did} has no keys")))?;
        Ok(ResolvedKey {
            algorithm: algorithm_of(identity.key_type),
            public_key: identity.key.clone(),
        })
    }
}
