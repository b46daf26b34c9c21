// Path: crates/types/src/agent.rs

//! Registry-resident agent records and the deterministic `agent_id`
//! derivation shared by clients and verifiers.

use crate::codec::encode_framed;
use crate::did::Did;
use crate::error::DidError;
use crate::MAX_AGENT_KEYS;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

/// A 20-byte chain account address (the registry owner of an agent).
pub type OwnerAddress = [u8; 20];

/// A 32-byte agent identifier derived from the DID and its first key.
pub type AgentId = [u8; 32];

/// The kind of key material stored in an agent record.
///
/// This is the coarse, registry-level classification; the concrete curve of
/// an ECDSA key is carried by the key bytes themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    /// An ECDSA key (P-256 or secp256k1).
    Ecdsa,
    /// An Ed25519 signing key.
    Ed25519,
    /// An X25519 key-agreement key (KEM only, never signs).
    X25519,
}

impl KeyType {
    /// The stable wire code for this key type.
    pub fn code(&self) -> u8 {
        match self {
            KeyType::Ecdsa => 0,
            KeyType::Ed25519 => 1,
            KeyType::X25519 => 2,
        }
    }
}

/// A single registered key: type tag, raw public bytes, and its hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentKey {
    /// The registry-level key classification.
    pub key_type: KeyType,
    /// The raw public key bytes.
    pub key: Vec<u8>,
    /// Keccak-256 of the raw public key bytes.
    pub key_hash: [u8; 32],
}

impl AgentKey {
    /// Builds an entry, computing the key hash from the raw bytes.
    pub fn new(key_type: KeyType, key: Vec<u8>) -> Self {
        let key_hash = Keccak256::digest(&key).into();
        Self {
            key_type,
            key,
            key_hash,
        }
    }
}

/// The registry-resident record a DID resolves to.
///
/// Invariants: the DID is unique registry-wide; `keys` is immutable after
/// registration; `nonce` increases monotonically across updates; `active`
/// transitions `true -> false` at most once, and deactivation is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRecord {
    /// The agent's DID.
    pub did: Did,
    /// Human-readable agent name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// The agent's service endpoint URL.
    pub endpoint: String,
    /// Comma-separated capability tags (opaque to the core).
    pub capabilities: String,
    /// The chain account that owns this record.
    pub owner: OwnerAddress,
    /// Registered keys; the first entry is the signing identity.
    pub keys: Vec<AgentKey>,
    /// Unix seconds at registration.
    pub created_at: u64,
    /// Unix seconds of the last update.
    pub updated_at: u64,
    /// Whether the record is active. Deactivation is terminal.
    pub active: bool,
    /// Monotonic update counter, used in update signing preimages.
    pub nonce: u64,
}

impl AgentRecord {
    /// The first registered key, which is the agent's signing identity.
    pub fn identity_key(&self) -> Option<&AgentKey> {
        self.keys.first()
    }

    /// The first key of the given type, if any.
    pub fn key_of_type(&self, key_type: KeyType) -> Option<&AgentKey> {
        self.keys.iter().find(|k| k.key_type == key_type)
    }

    /// Derives the 32-byte agent id: Keccak-256 over the framed encoding of
    /// the DID string and the first key's raw bytes.
    pub fn agent_id(&self) -> Result<AgentId, DidError> {
        let first = self
            .identity_key()
            .ok_or_else(|| DidError::Invalid("agent record has no keys".to_string()))?;
        Ok(derive_agent_id(&self.did, &first.key))
    }

    /// Checks the record-level key constraints (non-empty, bounded count).
    pub fn validate_keys(&self) -> Result<(), DidError> {
        if self.keys.is_empty() {
            return Err(DidError::Invalid("agent record has no keys".to_string()));
        }
        if self.keys.len() > MAX_AGENT_KEYS {
            return Err(DidError::Invalid(format!(
                "agent record has {} keys, maximum is {MAX_AGENT_KEYS}",
                self.keys.len()
            )));
        }
        Ok(())
    }
}

/// Derives an agent id from a DID and the raw bytes of its first key.
pub fn derive_agent_id(did: &Did, first_key: &[u8]) -> AgentId {
    let encoded = encode_framed(&[did.to_string().as_bytes(), first_key]);
    Keccak256::digest(&encoded).into()
}

/// An open registration commitment recorded by the contract.
///
/// One commitment may be open per `(committer, commit_hash)`; re-submitting
/// the identical commitment is a no-op for the same committer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationCommitment {
    /// Keccak-256 over the framed `(did, keys, owner, salt, chain_id)`.
    pub commit_hash: [u8; 32],
    /// The stake escrowed with the commitment (deployment parameter).
    pub stake_amount: u128,
    /// Unix seconds when the commitment landed.
    pub committed_at: u64,
    /// The committing chain account.
    pub committer: OwnerAddress,
}

/// The reveal payload for `register_agent_with_params`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationParams {
    /// The DID being registered.
    pub did: Did,
    /// The keys to register; order is preserved and the first is identity.
    pub keys: Vec<AgentKey>,
    /// Per-key ownership proofs, index-aligned with `keys`.
    pub signatures: Vec<Vec<u8>>,
    /// The 32-byte commitment salt.
    pub salt: [u8; 32],
    /// Agent name.
    pub name: String,
    /// Agent description.
    pub description: String,
    /// Agent endpoint URL.
    pub endpoint: String,
    /// Capability tags.
    pub capabilities: String,
}

/// The receipt returned by a successful registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationReceipt {
    /// Transaction hash of the reveal.
    pub tx_hash: [u8; 32],
    /// Block the reveal landed in.
    pub block_number: u64,
    /// The derived agent id.
    pub agent_id: AgentId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::did::Network;

    fn record() -> AgentRecord {
        AgentRecord {
            did: Did::new(Network::Ethereum, "agent-1").unwrap(),
            name: "agent".into(),
            description: String::new(),
            endpoint: "https://agent.example".into(),
            capabilities: "chat".into(),
            owner: [0x11; 20],
            keys: vec![AgentKey::new(KeyType::Ed25519, vec![7u8; 32])],
            created_at: 1,
            updated_at: 1,
            active: true,
            nonce: 0,
        }
    }

    #[test]
    fn agent_id_is_deterministic_and_key_bound() {
        let a = record();
        let mut b = record();
        assert_eq!(a.agent_id().unwrap(), b.agent_id().unwrap());

        b.keys[0] = AgentKey::new(KeyType::Ed25519, vec![8u8; 32]);
        assert_ne!(a.agent_id().unwrap(), b.agent_id().unwrap());
    }

    #[test]
    fn key_count_is_bounded() {
        let mut r = record();
        r.keys = (0..=MAX_AGENT_KEYS)
            .map(|i| AgentKey::new(KeyType::Ed25519, vec![i as u8; 32]))
            .collect();
        assert!(r.validate_keys().is_err());

        r.keys.truncate(MAX_AGENT_KEYS);
        assert!(r.validate_keys().is_ok());
    }

    #[test]
    fn key_hash_matches_keccak() {
        let k = AgentKey::new(KeyType::X25519, vec![1, 2, 3]);
        let expected: [u8; 32] = Keccak256::digest([1u8, 2, 3]).into();
        assert_eq!(k.key_hash, expected);
    }
}
