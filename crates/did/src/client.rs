// Path: crates/did/src/client.rs
//! The Ethereum-flavoured registry client.

use crate::commit::{commitment_hash, owner_address, prepare_registration, RegistrationRequest};
use async_trait::async_trait;
use rand::RngCore;
use sage_api::registry::{AgentUpdate, RegistryClient, RegistryContract, TxReceipt};
use sage_crypto::KeyPair;
use sage_types::agent::{
    derive_agent_id, AgentId, AgentRecord, OwnerAddress, RegistrationParams, RegistrationReceipt,
};
use sage_types::codec::encode_framed;
use sage_types::config::RegistryConfig;
use sage_types::did::Did;
use sage_types::error::RegistryError;
use sha3::{Digest, Keccak256};
use std::sync::Arc;
use std::time::Duration;

/// The message digest signed for `updateAgent`.
pub fn update_message(
    agent_id: &AgentId,
    name: &str,
    description: &str,
    endpoint: &str,
    capabilities: &str,
    signer: &OwnerAddress,
    nonce: u64,
) -> [u8; 32] {
    Keccak256::digest(encode_framed(&[
        agent_id,
        name.as_bytes(),
        description.as_bytes(),
        endpoint.as_bytes(),
        capabilities.as_bytes(),
        signer,
        &nonce.to_be_bytes(),
    ]))
    .into()
}

/// The message digest signed for `deactivateAgent`.
pub fn deactivate_message(agent_id: &AgentId, signer: &OwnerAddress, nonce: u64) -> [u8; 32] {
    Keccak256::digest(encode_framed(&[
        agent_id,
        b"deactivate",
        signer,
        &nonce.to_be_bytes(),
    ]))
    .into()
}

/// A registry client bound to one owner account on one deployed registry.
///
/// The contract handle is an explicit constructor dependency; swapping in
/// the in-memory mock is how the whole layer is tested.
pub struct EthereumRegistry {
    contract: Arc<dyn RegistryContract>,
    config: RegistryConfig,
    owner_key: KeyPair,
    owner: OwnerAddress,
}

impl EthereumRegistry {
    /// Builds a client. `owner_key` must be the secp256k1 key of the chain
    /// account that owns (or will own) the agent records.
    pub fn new(
        contract: Arc<dyn RegistryContract>,
        config: RegistryConfig,
        owner_key: KeyPair,
    ) -> Result<Self, RegistryError> {
        let owner = owner_address(&owner_key)?;
        Ok(Self {
            contract,
            config,
            owner_key,
            owner,
        })
    }

    /// The owning chain account address.
    pub fn owner(&self) -> &OwnerAddress {
        &self.owner
    }

    /// Prepares and registers a request in one call: builds the key set
    /// and ownership proofs, then runs the commit–reveal flow.
    pub async fn register_agent(
        &self,
        request: &RegistrationRequest,
    ) -> Result<RegistrationReceipt, RegistryError> {
        let mut salt = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut salt);
        let prepared = prepare_registration(request, &self.owner_key, &self.config, salt)?;
        self.register(prepared.params).await
    }

    async fn resolve_with_deadline(
        &self,
        did: &Did,
        deadline: Duration,
    ) -> Result<AgentRecord, RegistryError> {
        tokio::time::timeout(deadline, self.contract.get_agent_by_did(did))
            .await
            .map_err(|_| RegistryError::DeadlineExceeded)?
    }

    async fn nonce_or_zero(&self, agent_id: AgentId) -> Result<u64, RegistryError> {
        match self.contract.get_nonce(agent_id).await {
            Ok(nonce) => Ok(nonce),
            // Pre-nonce contracts reject the call; fall back to 0.
            Err(RegistryError::Rejected(_)) => Ok(0),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl RegistryClient for EthereumRegistry {
    async fn resolve(&self, did: &Did, deadline: Duration) -> Result<AgentRecord, RegistryError> {
        self.resolve_with_deadline(did, deadline).await
    }

    async fn register(
        &self,
        params: RegistrationParams,
    ) -> Result<RegistrationReceipt, RegistryError> {
        // Pre-registration duplicate check: a doomed reveal costs gas the
        // resolve saves.
        match self
            .resolve_with_deadline(&params.did, self.config.resolve_deadline())
            .await
        {
            Ok(existing) => {
                log::warn!(
                    "[EthereumRegistry] {} already registered to 0x{}",
                    params.did,
                    hex::encode(existing.owner)
                );
                return Err(RegistryError::DidTaken(params.did.to_string()));
            }
            Err(RegistryError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let commit_hash = commitment_hash(
            &params.did,
            &params.keys,
            &self.owner,
            &params.salt,
            self.config.chain_id,
        );
        self.contract
            .commit_registration(self.owner, commit_hash, u128::from(self.config.stake_amount))
            .await?;
        log::debug!(
            "[EthereumRegistry] committed 0x{} for {}",
            hex::encode(commit_hash),
            params.did
        );

        // The contract refuses reveals before the minimum delay.
        tokio::time::sleep(self.config.min_reveal_delay()).await;

        let did = params.did.clone();
        let first_key = params
            .keys
            .first()
            .map(|k| k.key.clone())
            .ok_or_else(|| RegistryError::Rejected("no keys to register".to_string()))?;
        let receipt = self
            .contract
            .register_agent_with_params(self.owner, params)
            .await?;
        let agent_id = derive_agent_id(&did, &first_key);
        log::info!(
            "[EthereumRegistry] registered {} as 0x{} in block {}",
            did,
            hex::encode(agent_id),
            receipt.block_number
        );
        Ok(RegistrationReceipt {
            tx_hash: receipt.tx_hash,
            block_number: receipt.block_number,
            agent_id,
        })
    }

    async fn update(&self, did: &Did, update: AgentUpdate) -> Result<TxReceipt, RegistryError> {
        let record = self
            .resolve_with_deadline(did, self.config.resolve_deadline())
            .await?;
        let agent_id = record.agent_id()?;
        let nonce = self.nonce_or_zero(agent_id).await?;

        // Partial update: unchanged fields carry their current values.
        let name = update.name.unwrap_or_else(|| record.name.clone());
        let description = update
            .description
            .unwrap_or_else(|| record.description.clone());
        let endpoint = update.endpoint.unwrap_or_else(|| record.endpoint.clone());
        let capabilities = update
            .capabilities
            .unwrap_or_else(|| record.capabilities.clone());

        let digest = update_message(
            &agent_id,
            &name,
            &description,
            &endpoint,
            &capabilities,
            &self.owner,
            nonce,
        );
        let signature = self.owner_key.sign_recoverable(&digest)?;
        self.contract
            .update_agent(agent_id, name, description, endpoint, capabilities, signature)
            .await
    }

    async fn deactivate(&self, did: &Did) -> Result<TxReceipt, RegistryError> {
        let record = self
            .resolve_with_deadline(did, self.config.resolve_deadline())
            .await?;
        let agent_id = record.agent_id()?;
        let nonce = self.nonce_or_zero(agent_id).await?;
        let digest = deactivate_message(&agent_id, &self.owner, nonce);
        let signature = self.owner_key.sign_recoverable(&digest)?;
        self.contract.deactivate_agent(agent_id, signature).await
    }

    async fn get_nonce(&self, agent_id: AgentId) -> Result<u64, RegistryError> {
        self.nonce_or_zero(agent_id).await
    }
}
