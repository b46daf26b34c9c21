// Path: crates/api/src/registry.rs

//! The chain-agnostic registry seams.
//!
//! [`RegistryContract`] mirrors the on-chain surface one-to-one and is the
//! boundary behind which the actual blockchain transport lives (out of scope
//! for the core; mocked in tests). [`RegistryClient`] is the capability set
//! the rest of the system consumes; `sage-did` ships the Ethereum-flavoured
//! implementation that maps one onto the other.

use async_trait::async_trait;
use sage_types::agent::{
    AgentId, AgentRecord, OwnerAddress, RegistrationParams, RegistrationReceipt,
};
use sage_types::did::Did;
use sage_types::error::RegistryError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// An event emitted by the registry contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryEvent {
    /// A new agent was registered.
    AgentRegistered {
        /// The derived agent id.
        agent_id: AgentId,
        /// The owning chain account.
        owner: OwnerAddress,
        /// The registered DID string.
        did: String,
    },
    /// An existing agent's mutable fields were updated.
    AgentUpdated {
        /// The agent id.
        agent_id: AgentId,
    },
    /// An agent was deactivated (terminal).
    AgentDeactivated {
        /// The agent id.
        agent_id: AgentId,
    },
}

/// The receipt for a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// Transaction hash.
    pub tx_hash: [u8; 32],
    /// Block number the transaction landed in.
    pub block_number: u64,
    /// Events emitted by the transaction.
    pub events: Vec<RegistryEvent>,
}

/// The on-chain registry surface the core requires, method for method.
///
/// Implementations submit transactions and run view calls against one
/// deployed registry; they do not add semantics. Commit submissions are
/// deduplicated by commit hash, keeping retries idempotent.
#[async_trait]
pub trait RegistryContract: Send + Sync {
    /// Submits `commitRegistration(commitHash)` with the required stake.
    async fn commit_registration(
        &self,
        committer: OwnerAddress,
        commit_hash: [u8; 32],
        stake_amount: u128,
    ) -> Result<TxReceipt, RegistryError>;

    /// Submits the reveal, `registerAgentWithParams(params)`.
    async fn register_agent_with_params(
        &self,
        committer: OwnerAddress,
        params: RegistrationParams,
    ) -> Result<TxReceipt, RegistryError>;

    /// Submits `updateAgent(agentId, name, desc, endpoint, caps, sig)`.
    #[allow(clippy::too_many_arguments)]
    async fn update_agent(
        &self,
        agent_id: AgentId,
        name: String,
        description: String,
        endpoint: String,
        capabilities: String,
        signature: Vec<u8>,
    ) -> Result<TxReceipt, RegistryError>;

    /// Submits `deactivateAgent(agentId, sig)`.
    async fn deactivate_agent(
        &self,
        agent_id: AgentId,
        signature: Vec<u8>,
    ) -> Result<TxReceipt, RegistryError>;

    /// View call `getAgentByDID(did)`.
    async fn get_agent_by_did(&self, did: &Did) -> Result<AgentRecord, RegistryError>;

    /// View call `getNonce(agentId)`. Contracts without nonce support
    /// return [`RegistryError::Rejected`]; clients fall back to 0.
    async fn get_nonce(&self, agent_id: AgentId) -> Result<u64, RegistryError>;
}

/// A partial update of an agent record's mutable fields.
///
/// `None` fields keep their current on-chain values; the client fills them
/// in from the resolved record before signing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentUpdate {
    /// New name, if changing.
    pub name: Option<String>,
    /// New description, if changing.
    pub description: Option<String>,
    /// New endpoint, if changing.
    pub endpoint: Option<String>,
    /// New capability tags, if changing.
    pub capabilities: Option<String>,
}

/// The capability set the core consumes: resolve, register, update,
/// deactivate, and nonce queries, all bounded by a caller deadline.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Resolves a DID to its agent record. Idempotent and read-only.
    async fn resolve(&self, did: &Did, deadline: Duration) -> Result<AgentRecord, RegistryError>;

    /// Runs the full commit–reveal registration for a prepared request.
    async fn register(
        &self,
        params: RegistrationParams,
    ) -> Result<RegistrationReceipt, RegistryError>;

    /// Applies a signed partial update to the agent's mutable fields.
    async fn update(&self, did: &Did, update: AgentUpdate) -> Result<TxReceipt, RegistryError>;

    /// Deactivates the agent. Irreversible.
    async fn deactivate(&self, did: &Did) -> Result<TxReceipt, RegistryError>;

    /// Fetches the agent's update nonce, falling back to 0 on contracts
    /// that predate nonce support.
    async fn get_nonce(&self, agent_id: AgentId) -> Result<u64, RegistryError>;
}
