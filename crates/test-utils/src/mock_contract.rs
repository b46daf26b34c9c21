// Path: crates/test-utils/src/mock_contract.rs
//! An in-memory registry contract.
//!
//! Implements the full on-chain semantics the client relies on: commitment
//! windows, commitment idempotency per committer, DID uniqueness, ownership
//! proof checks, nonce increments, and terminal deactivation. Windows are
//! wall-clock based and default to zero delay so tests run instantly.

use async_trait::async_trait;
use sage_api::registry::{RegistryContract, RegistryEvent, TxReceipt};
use sage_crypto::address::{ethereum_address, ethereum_address_from_uncompressed};
use sage_crypto::keys::secp256k1::recover_public_key;
use sage_crypto::PublicKey;
use sage_did::client::{deactivate_message, update_message};
use sage_did::commit::{
    commitment_hash, registration_proof_preimage, x25519_proof_preimage,
};
use sage_types::agent::{
    AgentId, AgentKey, AgentRecord, KeyType, OwnerAddress, RegistrationCommitment,
    RegistrationParams,
};
use sage_types::did::Did;
use sage_types::error::RegistryError;
use sage_types::message::KeyAlgorithm;
use sha3::{Digest, Keccak256};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

struct OpenCommitment {
    commitment: RegistrationCommitment,
    committed: Instant,
}

struct State {
    commitments: HashMap<(OwnerAddress, [u8; 32]), OpenCommitment>,
    records: HashMap<String, AgentRecord>,
    block_number: u64,
}

/// The in-memory contract.
pub struct MockRegistryContract {
    state: Mutex<State>,
    chain_id: u64,
    registry_address: [u8; 20],
    required_stake: u128,
    min_reveal_delay: Duration,
    max_reveal_window: Duration,
    nonce_supported: bool,
    latency: Duration,
    /// When set, every call fails with a transport error (outage testing).
    offline: Mutex<bool>,
}

impl Default for MockRegistryContract {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRegistryContract {
    /// A contract with zero reveal delay and no stake requirement.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                commitments: HashMap::new(),
                records: HashMap::new(),
                block_number: 0,
            }),
            chain_id: 1,
            registry_address: [0u8; 20],
            required_stake: 0,
            min_reveal_delay: Duration::ZERO,
            max_reveal_window: Duration::from_secs(600),
            nonce_supported: true,
            latency: Duration::ZERO,
            offline: Mutex::new(false),
        }
    }

    /// Adds artificial latency to every call (deadline testing).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Sets the commitment window bounds.
    pub fn with_reveal_window(mut self, min_delay: Duration, max_window: Duration) -> Self {
        self.min_reveal_delay = min_delay;
        self.max_reveal_window = max_window;
        self
    }

    /// Sets the required stake for commitments.
    pub fn with_required_stake(mut self, stake: u128) -> Self {
        self.required_stake = stake;
        self
    }

    /// Simulates a pre-nonce contract (`getNonce` reverts).
    pub fn without_nonce_support(mut self) -> Self {
        self.nonce_supported = false;
        self
    }

    /// Toggles a simulated transport outage.
    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut flag) = self.offline.lock() {
            *flag = offline;
        }
    }

    /// Directly installs a record, bypassing commit–reveal (fixture setup).
    pub fn install_record(&self, record: AgentRecord) {
        if let Ok(mut state) = self.state.lock() {
            state.records.insert(record.did.to_string(), record);
        }
    }

    /// The number of open commitments.
    pub fn open_commitments(&self) -> usize {
        self.state.lock().map(|s| s.commitments.len()).unwrap_or(0)
    }

    async fn check_online(&self) -> Result<(), RegistryError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let offline = self.offline.lock().map(|f| *f).unwrap_or(false);
        if offline {
            Err(RegistryError::Transport("registry unreachable".into()))
        } else {
            Ok(())
        }
    }

    fn receipt(state: &mut State, seed: &[u8], events: Vec<RegistryEvent>) -> TxReceipt {
        state.block_number += 1;
        let mut hasher = Keccak256::new();
        hasher.update(seed);
        hasher.update(state.block_number.to_be_bytes());
        TxReceipt {
            tx_hash: hasher.finalize().into(),
            block_number: state.block_number,
            events,
        }
    }

    fn unix_now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    fn find_by_agent_id(state: &State, agent_id: &AgentId) -> Option<String> {
        state
            .records
            .values()
            .find(|r| r.agent_id().ok().as_ref() == Some(agent_id))
            .map(|r| r.did.to_string())
    }

    /// A recoverable secp256k1 signature must trace back to `expected`.
    fn check_recovered_address(
        preimage: &[u8],
        signature: &[u8],
        expected: &OwnerAddress,
        what: &str,
    ) -> Result<(), RegistryError> {
        let recovered = recover_public_key(preimage, signature)
            .map_err(|e| RegistryError::Rejected(format!("{what}: {e}")))?;
        let address = ethereum_address_from_uncompressed(&recovered)
            .map_err(|e| RegistryError::Rejected(format!("{what}: {e}")))?;
        if address.as_bytes() != expected {
            return Err(RegistryError::Rejected(format!(
                "{what}: recovered 0x{} but expected 0x{}",
                hex::encode(address.as_bytes()),
                hex::encode(expected)
            )));
        }
        Ok(())
    }

    fn check_ownership_proof(
        &self,
        key: &AgentKey,
        signature: &[u8],
        committer: &OwnerAddress,
    ) -> Result<(), RegistryError> {
        match key.key_type {
            KeyType::Ecdsa => {
                let preimage =
                    registration_proof_preimage(self.chain_id, &self.registry_address, committer);
                if signature.len() == 65 {
                    // secp256k1 self-proof: the recovered key must be the
                    // registered key itself.
                    let recovered = recover_public_key(&preimage, signature)
                        .map_err(|e| RegistryError::Rejected(format!("key proof: {e}")))?;
                    let recovered_addr = ethereum_address_from_uncompressed(&recovered)
                        .map_err(|e| RegistryError::Rejected(format!("key proof: {e}")))?;
                    let stated = PublicKey::from_bytes(KeyAlgorithm::EcdsaSecp256k1, &key.key)
                        .and_then(|pk| ethereum_address(&pk))
                        .map_err(|e| RegistryError::Rejected(format!("key proof: {e}")))?;
                    if recovered_addr != stated {
                        return Err(RegistryError::Rejected(
                            "key proof does not match registered key".into(),
                        ));
                    }
                    Ok(())
                } else {
                    // P-256 self-proof: direct verification against the
                    // stored bytes (no recovery on that curve).
                    sage_crypto::keys::p256::verify(&key.key, &preimage, signature)
                        .map_err(|e| RegistryError::Rejected(format!("key proof: {e}")))
                }
            }
            // Ed25519 proofs are stored; on-chain verification is deferred
            // to off-chain auditors.
            KeyType::Ed25519 => Ok(()),
            KeyType::X25519 => {
                let preimage = x25519_proof_preimage(
                    &key.key,
                    self.chain_id,
                    &self.registry_address,
                    committer,
                );
                Self::check_recovered_address(&preimage, signature, committer, "x25519 proof")
            }
        }
    }
}

#[async_trait]
impl RegistryContract for MockRegistryContract {
    async fn commit_registration(
        &self,
        committer: OwnerAddress,
        commit_hash: [u8; 32],
        stake_amount: u128,
    ) -> Result<TxReceipt, RegistryError> {
        self.check_online().await?;
        if stake_amount < self.required_stake {
            return Err(RegistryError::Rejected(format!(
                "stake {stake_amount} below required {}",
                self.required_stake
            )));
        }
        let mut state = self
            .state
            .lock()
            .map_err(|_| RegistryError::Transport("state poisoned".into()))?;
        // Re-submitting an identical commitment from the same committer is
        // a no-op.
        state
            .commitments
            .entry((committer, commit_hash))
            .or_insert_with(|| OpenCommitment {
                commitment: RegistrationCommitment {
                    commit_hash,
                    stake_amount,
                    committed_at: Self::unix_now(),
                    committer,
                },
                committed: Instant::now(),
            });
        Ok(Self::receipt(&mut state, &commit_hash, Vec::new()))
    }

    async fn register_agent_with_params(
        &self,
        committer: OwnerAddress,
        params: RegistrationParams,
    ) -> Result<TxReceipt, RegistryError> {
        self.check_online().await?;
        let mut state = self
            .state
            .lock()
            .map_err(|_| RegistryError::Transport("state poisoned".into()))?;

        let commit_hash = commitment_hash(
            &params.did,
            &params.keys,
            &committer,
            &params.salt,
            self.chain_id,
        );
        let open = state
            .commitments
            .get(&(committer, commit_hash))
            .ok_or(RegistryError::CommitNotFound)?;
        let age = open.committed.elapsed();
        if age < self.min_reveal_delay || age > self.max_reveal_window {
            return Err(RegistryError::CommitExpired);
        }

        if state.records.contains_key(&params.did.to_string()) {
            return Err(RegistryError::DidTaken(params.did.to_string()));
        }
        if params.keys.len() != params.signatures.len() {
            return Err(RegistryError::Rejected(
                "signature count does not match key count".into(),
            ));
        }
        for (key, signature) in params.keys.iter().zip(&params.signatures) {
            self.check_ownership_proof(key, signature, &committer)?;
        }

        let now = Self::unix_now();
        let record = AgentRecord {
            did: params.did.clone(),
            name: params.name,
            description: params.description,
            endpoint: params.endpoint,
            capabilities: params.capabilities,
            owner: committer,
            keys: params.keys,
            created_at: now,
            updated_at: now,
            active: true,
            nonce: 0,
        };
        record.validate_keys()?;
        let agent_id = record.agent_id()?;
        let stake = open.commitment.stake_amount;
        state.commitments.remove(&(committer, commit_hash));
        state.records.insert(params.did.to_string(), record);
        log::debug!(
            "[MockRegistry] registered {} (stake {stake}) as 0x{}",
            params.did,
            hex::encode(agent_id)
        );

        let did_string = params.did.to_string();
        Ok(Self::receipt(
            &mut state,
            did_string.as_bytes(),
            vec![RegistryEvent::AgentRegistered {
                agent_id,
                owner: committer,
                did: did_string.clone(),
            }],
        ))
    }

    async fn update_agent(
        &self,
        agent_id: AgentId,
        name: String,
        description: String,
        endpoint: String,
        capabilities: String,
        signature: Vec<u8>,
    ) -> Result<TxReceipt, RegistryError> {
        self.check_online().await?;
        let mut state = self
            .state
            .lock()
            .map_err(|_| RegistryError::Transport("state poisoned".into()))?;
        let did = Self::find_by_agent_id(&state, &agent_id)
            .ok_or_else(|| RegistryError::NotFound(hex::encode(agent_id)))?;
        let record = state
            .records
            .get(&did)
            .ok_or_else(|| RegistryError::NotFound(did.clone()))?;
        if !record.active {
            return Err(RegistryError::Rejected("agent is deactivated".into()));
        }

        let digest = update_message(
            &agent_id,
            &name,
            &description,
            &endpoint,
            &capabilities,
            &record.owner,
            record.nonce,
        );
        Self::check_recovered_address(&digest, &signature, &record.owner, "update signature")?;

        let record = state
            .records
            .get_mut(&did)
            .ok_or_else(|| RegistryError::NotFound(did.clone()))?;
        record.name = name;
        record.description = description;
        record.endpoint = endpoint;
        record.capabilities = capabilities;
        record.nonce += 1;
        record.updated_at = Self::unix_now();

        Ok(Self::receipt(
            &mut state,
            &agent_id,
            vec![RegistryEvent::AgentUpdated { agent_id }],
        ))
    }

    async fn deactivate_agent(
        &self,
        agent_id: AgentId,
        signature: Vec<u8>,
    ) -> Result<TxReceipt, RegistryError> {
        self.check_online().await?;
        let mut state = self
            .state
            .lock()
            .map_err(|_| RegistryError::Transport("state poisoned".into()))?;
        let did = Self::find_by_agent_id(&state, &agent_id)
            .ok_or_else(|| RegistryError::NotFound(hex::encode(agent_id)))?;
        let record = state
            .records
            .get(&did)
            .ok_or_else(|| RegistryError::NotFound(did.clone()))?;
        if !record.active {
            return Err(RegistryError::Rejected("agent already deactivated".into()));
        }

        let digest = deactivate_message(&agent_id, &record.owner, record.nonce);
        Self::check_recovered_address(&digest, &signature, &record.owner, "deactivate signature")?;

        let record = state
            .records
            .get_mut(&did)
            .ok_or_else(|| RegistryError::NotFound(did.clone()))?;
        record.active = false;
        record.nonce += 1;
        record.updated_at = Self::unix_now();

        Ok(Self::receipt(
            &mut state,
            &agent_id,
            vec![RegistryEvent::AgentDeactivated { agent_id }],
        ))
    }

    async fn get_agent_by_did(&self, did: &Did) -> Result<AgentRecord, RegistryError> {
        self.check_online().await?;
        let state = self
            .state
            .lock()
            .map_err(|_| RegistryError::Transport("state poisoned".into()))?;
        state
            .records
            .get(&did.to_string())
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(did.to_string()))
    }

    async fn get_nonce(&self, agent_id: AgentId) -> Result<u64, RegistryError> {
        self.check_online().await?;
        if !self.nonce_supported {
            return Err(RegistryError::Rejected("getNonce not supported".into()));
        }
        let state = self
            .state
            .lock()
            .map_err(|_| RegistryError::Transport("state poisoned".into()))?;
        let did = Self::find_by_agent_id(&state, &agent_id)
            .ok_or_else(|| RegistryError::NotFound(hex::encode(agent_id)))?;
        state
            .records
            .get(&did)
            .map(|r| r.nonce)
            .ok_or_else(|| RegistryError::NotFound(did))
    }
}
