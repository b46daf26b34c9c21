// Path: crates/test-utils/src/fixtures.rs
//! Deterministic agent fixtures.

use sage_crypto::keys::ed25519::Ed25519KeyPair;
use sage_crypto::keys::secp256k1::Secp256k1KeyPair;
use sage_crypto::keys::x25519::X25519KeyPair;
use sage_crypto::KeyPair;
use sage_types::agent::{AgentKey, AgentRecord, KeyType, OwnerAddress};
use sage_types::did::{Did, Network};

/// A fully keyed test agent.
pub struct AgentFixture {
    /// The agent's DID.
    pub did: Did,
    /// The Ed25519 signing identity.
    pub identity: KeyPair,
    /// The X25519 KEM key.
    pub kem: X25519KeyPair,
    /// The owning chain account key (secp256k1).
    pub owner_key: KeyPair,
    /// The owner's address.
    pub owner: OwnerAddress,
}

impl AgentFixture {
    /// Builds an agent from a deterministic seed byte.
    ///
    /// The same seed always yields the same keys and DID, so fixtures are
    /// reproducible across test runs without shipping key files.
    pub fn from_seed(name: &str, seed: u8) -> Self {
        let identity = KeyPair::Ed25519(
            Ed25519KeyPair::from_seed(&[seed; 32]).unwrap_or_else(|_| Ed25519KeyPair::generate()),
        );
        let kem = X25519KeyPair::from_secret_bytes(&[seed.wrapping_add(1); 32])
            .unwrap_or_else(|_| X25519KeyPair::generate());
        let mut owner_scalar = [seed.wrapping_add(2); 32];
        // A scalar of repeated bytes is always in range for secp256k1, but
        // keep a fallback for the zero seed.
        owner_scalar[31] = owner_scalar[31].wrapping_add(1);
        let owner_key = KeyPair::EcdsaSecp256k1(
            Secp256k1KeyPair::from_private_scalar(&owner_scalar)
                .unwrap_or_else(|_| Secp256k1KeyPair::generate()),
        );
        let owner = sage_did::commit::owner_address(&owner_key)
            .unwrap_or([0u8; 20]);
        Self {
            did: Did::new(Network::Ethereum, name).unwrap_or_else(|_| Did::generate(Network::Ethereum)),
            identity,
            kem,
            owner_key,
            owner,
        }
    }

    /// The registry record for this agent (identity key first), suitable
    /// for [`crate::MockRegistryContract::install_record`].
    pub fn record(&self) -> AgentRecord {
        AgentRecord {
            did: self.did.clone(),
            name: self.did.identifier().to_string(),
            description: String::new(),
            endpoint: format!("https://{}.example", self.did.identifier()),
            capabilities: "messaging".into(),
            owner: self.owner,
            keys: vec![
                AgentKey::new(
                    KeyType::Ed25519,
                    self.identity.public_key().as_bytes().to_vec(),
                ),
                AgentKey::new(KeyType::X25519, self.kem.public_key_bytes().to_vec()),
            ],
            created_at: 1_700_000_000,
            updated_at: 1_700_000_000,
            active: true,
            nonce: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockRegistryContract;
    use sage_api::registry::RegistryContract;

    #[test]
    fn fixtures_are_deterministic() {
        let a = AgentFixture::from_seed("alice", 7);
        let b = AgentFixture::from_seed("alice", 7);
        assert_eq!(a.did, b.did);
        assert_eq!(a.owner, b.owner);
        assert_eq!(a.record(), b.record());

        let c = AgentFixture::from_seed("alice", 8);
        assert_ne!(a.owner, c.owner);
    }

    #[tokio::test]
    async fn installed_records_resolve() {
        let contract = MockRegistryContract::new();
        let fixture = AgentFixture::from_seed("bob", 3);
        contract.install_record(fixture.record());
        let record = contract.get_agent_by_did(&fixture.did).await.unwrap();
        assert_eq!(record.keys.len(), 2);
        assert!(record.active);
    }
}
