// Path: crates/did/src/commit.rs
//! Commitment hashing and per-key ownership proofs.
//!
//! The commit hash binds the DID, the full key set, the owner, a fresh
//! salt, and the chain id, so a front-runner observing the commit learns
//! nothing it can reuse. Ownership proofs bind each key to the registering
//! address, the registry contract, and the chain, so a proof cannot be
//! replayed on another network or by another address.

use sage_crypto::address::EthereumAddress;
use sage_crypto::KeyPair;
use sage_types::agent::{AgentKey, KeyType, OwnerAddress, RegistrationParams};
use sage_types::codec::encode_framed;
use sage_types::config::RegistryConfig;
use sage_types::did::Did;
use sage_types::error::{CryptoError, RegistryError};
use sage_types::MAX_AGENT_KEYS;
use sha3::{Digest, Keccak256};

/// Domain prefix of ECDSA and Ed25519 self-proofs.
pub const REGISTRATION_PROOF_PREFIX: &[u8] = b"SAGE Agent Registration:";
/// Domain prefix of owner proofs for non-signing X25519 keys.
pub const X25519_PROOF_PREFIX: &[u8] = b"SAGE X25519 Ownership:";

/// A prepared registration: the reveal payload plus the commit-phase
/// values the client must retain between the two transactions.
#[derive(Debug)]
pub struct PreparedRegistration {
    /// The reveal payload.
    pub params: RegistrationParams,
    /// Keccak-256 commitment over `(did, keys, owner, salt, chain_id)`.
    pub commit_hash: [u8; 32],
    /// The registering chain account.
    pub owner: OwnerAddress,
}

/// What a caller supplies to register an agent.
pub struct RegistrationRequest {
    /// The DID to register.
    pub did: Did,
    /// Agent name.
    pub name: String,
    /// Agent description.
    pub description: String,
    /// Agent endpoint URL.
    pub endpoint: String,
    /// Capability tags.
    pub capabilities: String,
    /// The keys to register, identity first. At most [`MAX_AGENT_KEYS`].
    pub keys: Vec<KeyPair>,
}

/// Computes the registration commitment hash.
pub fn commitment_hash(
    did: &Did,
    keys: &[AgentKey],
    owner: &OwnerAddress,
    salt: &[u8; 32],
    chain_id: u64,
) -> [u8; 32] {
    let did_string = did.to_string();
    let mut fields: Vec<&[u8]> = Vec::with_capacity(3 + keys.len() * 2);
    let type_codes: Vec<[u8; 1]> = keys.iter().map(|k| [k.key_type.code()]).collect();
    fields.push(did_string.as_bytes());
    for (key, code) in keys.iter().zip(&type_codes) {
        fields.push(code);
        fields.push(&key.key);
    }
    fields.push(owner);
    fields.push(salt);
    let chain = chain_id.to_be_bytes();
    fields.push(&chain);
    Keccak256::digest(encode_framed(&fields)).into()
}

/// The preimage an ECDSA or Ed25519 key self-signs to prove ownership.
pub fn registration_proof_preimage(
    chain_id: u64,
    registry_address: &[u8; 20],
    owner: &OwnerAddress,
) -> Vec<u8> {
    encode_framed(&[
        REGISTRATION_PROOF_PREFIX,
        &chain_id.to_be_bytes(),
        registry_address,
        owner,
    ])
}

/// The preimage the owner signs to prove control of an X25519 key.
pub fn x25519_proof_preimage(
    public_key: &[u8],
    chain_id: u64,
    registry_address: &[u8; 20],
    owner: &OwnerAddress,
) -> Vec<u8> {
    encode_framed(&[
        X25519_PROOF_PREFIX,
        public_key,
        &chain_id.to_be_bytes(),
        registry_address,
        owner,
    ])
}

/// The registry-level key classification of a key pair.
pub fn key_type_of(keypair: &KeyPair) -> KeyType {
    match keypair {
        KeyPair::Ed25519(_) => KeyType::Ed25519,
        KeyPair::EcdsaP256(_) | KeyPair::EcdsaSecp256k1(_) => KeyType::Ecdsa,
        KeyPair::X25519(_) => KeyType::X25519,
    }
}

/// Builds the ownership proof for one registered key.
///
/// - secp256k1 keys self-sign the registration preimage with Ethereum
///   recoverable semantics, so the contract can `ecrecover` the key.
/// - P-256 keys self-sign the same preimage (verified against the stored
///   key bytes; no recovery on that curve).
/// - Ed25519 keys self-sign; on-chain verification is deferred to
///   off-chain auditors.
/// - X25519 keys cannot sign, so the owner's secp256k1 account key signs
///   the dedicated X25519 preimage recoverably.
pub fn ownership_proof(
    keypair: &KeyPair,
    owner_key: &KeyPair,
    config: &RegistryConfig,
    owner: &OwnerAddress,
) -> Result<Vec<u8>, CryptoError> {
    match keypair {
        KeyPair::EcdsaSecp256k1(_) => keypair.sign_recoverable(&registration_proof_preimage(
            config.chain_id,
            &config.registry_address,
            owner,
        )),
        KeyPair::EcdsaP256(_) | KeyPair::Ed25519(_) => keypair.sign(
            &registration_proof_preimage(config.chain_id, &config.registry_address, owner),
        ),
        KeyPair::X25519(kp) => owner_key.sign_recoverable(&x25519_proof_preimage(
            &kp.public_key_bytes(),
            config.chain_id,
            &config.registry_address,
            owner,
        )),
    }
}

/// Derives the chain account address of the owner key.
pub fn owner_address(owner_key: &KeyPair) -> Result<OwnerAddress, CryptoError> {
    let address: EthereumAddress =
        sage_crypto::address::ethereum_address(&owner_key.public_key())?;
    Ok(*address.as_bytes())
}

/// Assembles the reveal payload and commitment for a request.
pub fn prepare_registration(
    request: &RegistrationRequest,
    owner_key: &KeyPair,
    config: &RegistryConfig,
    salt: [u8; 32],
) -> Result<PreparedRegistration, RegistryError> {
    if request.keys.is_empty() {
        return Err(RegistryError::Rejected("no keys to register".to_string()));
    }
    if request.keys.len() > MAX_AGENT_KEYS {
        return Err(RegistryError::Rejected(format!(
            "{} keys exceeds the maximum of {MAX_AGENT_KEYS}",
            request.keys.len()
        )));
    }
    let first = request.keys.first().ok_or_else(|| {
        RegistryError::Rejected("no keys to register".to_string())
    })?;
    if !first.algorithm().is_signing() {
        return Err(RegistryError::Rejected(
            "the first key is the signing identity and must be able to sign".to_string(),
        ));
    }

    let owner = owner_address(owner_key)?;
    let keys: Vec<AgentKey> = request
        .keys
        .iter()
        .map(|kp| AgentKey::new(key_type_of(kp), kp.public_key().as_bytes().to_vec()))
        .collect();
    let signatures = request
        .keys
        .iter()
        .map(|kp| ownership_proof(kp, owner_key, config, &owner))
        .collect::<Result<Vec<_>, _>>()?;
    let commit_hash = commitment_hash(&request.did, &keys, &owner, &salt, config.chain_id);

    Ok(PreparedRegistration {
        params: RegistrationParams {
            did: request.did.clone(),
            keys,
            signatures,
            salt,
            name: request.name.clone(),
            description: request.description.clone(),
            endpoint: request.endpoint.clone(),
            capabilities: request.capabilities.clone(),
        },
        commit_hash,
        owner,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sage_types::did::Network;
    use sage_types::message::KeyAlgorithm;

    fn request() -> (RegistrationRequest, KeyPair) {
        let owner_key = KeyPair::generate(KeyAlgorithm::EcdsaSecp256k1);
        let request = RegistrationRequest {
            did: Did::new(Network::Ethereum, "agent-1").unwrap(),
            name: "agent".into(),
            description: "test agent".into(),
            endpoint: "https://agent.example".into(),
            capabilities: "messaging".into(),
            keys: vec![
                KeyPair::generate(KeyAlgorithm::Ed25519),
                KeyPair::generate(KeyAlgorithm::X25519),
            ],
        };
        (request, owner_key)
    }

    #[test]
    fn commitment_binds_every_input() {
        let (request, owner_key) = request();
        let config = RegistryConfig::default();
        let prepared = prepare_registration(&request, &owner_key, &config, [1u8; 32]).unwrap();

        // Different salt, different hash.
        let other = prepare_registration(&request, &owner_key, &config, [2u8; 32]).unwrap();
        assert_ne!(prepared.commit_hash, other.commit_hash);

        // Different chain, different hash.
        let other_chain = RegistryConfig {
            chain_id: 5,
            ..RegistryConfig::default()
        };
        let other = prepare_registration(&request, &owner_key, &other_chain, [1u8; 32]).unwrap();
        assert_ne!(prepared.commit_hash, other.commit_hash);

        // Same inputs, same hash.
        let again = prepare_registration(&request, &owner_key, &config, [1u8; 32]).unwrap();
        assert_eq!(prepared.commit_hash, again.commit_hash);
    }

    #[test]
    fn proofs_are_index_aligned_and_verifiable() {
        let (request, owner_key) = request();
        let config = RegistryConfig::default();
        let prepared = prepare_registration(&request, &owner_key, &config, [1u8; 32]).unwrap();
        assert_eq!(prepared.params.keys.len(), prepared.params.signatures.len());

        // The Ed25519 self-proof verifies against the registered key bytes.
        let preimage =
            registration_proof_preimage(config.chain_id, &config.registry_address, &prepared.owner);
        sage_crypto::keys::ed25519::verify(
            &prepared.params.keys[0].key,
            &preimage,
            &prepared.params.signatures[0],
        )
        .unwrap();

        // The X25519 proof recovers to the owner address.
        let x_preimage = x25519_proof_preimage(
            &prepared.params.keys[1].key,
            config.chain_id,
            &config.registry_address,
            &prepared.owner,
        );
        let recovered = sage_crypto::keys::secp256k1::recover_public_key(
            &x_preimage,
            &prepared.params.signatures[1],
        )
        .unwrap();
        let address =
            sage_crypto::address::ethereum_address_from_uncompressed(&recovered).unwrap();
        assert_eq!(address.as_bytes(), &prepared.owner);
    }

    #[test]
    fn kem_only_identity_is_rejected() {
        let (mut request, owner_key) = request();
        request.keys = vec![KeyPair::generate(KeyAlgorithm::X25519)];
        let err =
            prepare_registration(&request, &owner_key, &RegistryConfig::default(), [0u8; 32])
                .unwrap_err();
        assert!(matches!(err, RegistryError::Rejected(_)));
    }

    #[test]
    fn key_budget_is_enforced() {
        let (mut request, owner_key) = request();
        request.keys = (0..=MAX_AGENT_KEYS)
            .map(|_| KeyPair::generate(KeyAlgorithm::Ed25519))
            .collect();
        assert!(prepare_registration(
            &request,
            &owner_key,
            &RegistryConfig::default(),
            [0u8; 32]
        )
        .is_err());
    }
}
