// Path: crates/handshake/src/peer.rs
//! Key extraction from resolved agent records.
//!
//! Handshake signatures use the agent's Ed25519 key and the KEM uses its
//! X25519 key; a record missing either cannot participate.

use sage_api::resolver::AgentResolver;
use sage_types::agent::{AgentRecord, KeyType};
use sage_types::did::Did;
use sage_types::error::HandshakeError;

pub(crate) async fn resolve_record(
    resolver: &dyn AgentResolver,
    did: &Did,
) -> Result<AgentRecord, HandshakeError> {
    let record = resolver
        .resolve(did)
        .await
        .map_err(|e| HandshakeError::ResolverLookup(format!("{did}: {e}")))?;
    if !record.active {
        return Err(HandshakeError::ResolverLookup(format!(
            "{did} is deactivated"
        )));
    }
    Ok(record)
}

pub(crate) fn kem_key_of(record: &AgentRecord) -> Result<Vec<u8>, HandshakeError> {
    record
        .key_of_type(KeyType::X25519)
        .map(|k| k.key.clone())
        .ok_or_else(|| {
            HandshakeError::ResolverLookup(format!("{} has no X25519 key", record.did))
        })
}

pub(crate) fn ed25519_key_of(record: &AgentRecord) -> Result<Vec<u8>, HandshakeError> {
    record
        .key_of_type(KeyType::Ed25519)
        .map(|k| k.key.clone())
        .ok_or_else(|| {
            HandshakeError::ResolverLookup(format!("{} has no Ed25519 key", record.did))
        })
}
