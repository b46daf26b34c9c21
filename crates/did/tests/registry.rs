// Path: crates/did/tests/registry.rs
//! Registry client scenarios against the in-memory contract.

use sage_api::registry::{AgentUpdate, RegistryClient, RegistryContract};
use sage_crypto::KeyPair;
use sage_did::client::EthereumRegistry;
use sage_did::commit::{prepare_registration, RegistrationRequest};
use sage_did::resolver::DidResolver;
use sage_test_utils::MockRegistryContract;
use sage_api::resolver::{AgentResolver, KeyResolver};
use sage_types::config::RegistryConfig;
use sage_types::did::{Did, Network};
use sage_types::error::{ErrorCode, RegistryError};
use sage_types::message::KeyAlgorithm;
use std::sync::Arc;
use std::time::Duration;

fn fast_config() -> RegistryConfig {
    RegistryConfig {
        min_reveal_delay_secs: 0,
        resolve_deadline_secs: 5,
        ..RegistryConfig::default()
    }
}

fn request(name: &str) -> RegistrationRequest {
    RegistrationRequest {
        did: Did::new(Network::Ethereum, name).unwrap(),
        name: name.into(),
        description: "test agent".into(),
        endpoint: format!("https://{name}.example"),
        capabilities: "messaging,payment".into(),
        keys: vec![
            KeyPair::generate(KeyAlgorithm::Ed25519),
            KeyPair::generate(KeyAlgorithm::EcdsaSecp256k1),
            KeyPair::generate(KeyAlgorithm::X25519),
        ],
    }
}

fn client(contract: &Arc<MockRegistryContract>) -> EthereumRegistry {
    EthereumRegistry::new(
        Arc::clone(contract) as Arc<dyn RegistryContract>,
        fast_config(),
        KeyPair::generate(KeyAlgorithm::EcdsaSecp256k1),
    )
    .unwrap()
}

#[tokio::test]
async fn commit_reveal_registration_round_trips() {
    let contract = Arc::new(MockRegistryContract::new());
    let registry = client(&contract);
    let req = request("agent-a");

    let receipt = registry.register_agent(&req).await.unwrap();
    assert_eq!(contract.open_commitments(), 0);

    let record = registry
        .resolve(&req.did, Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(record.did, req.did);
    assert_eq!(record.keys.len(), 3);
    assert_eq!(&record.owner, registry.owner());
    assert!(record.active);
    assert_eq!(record.nonce, 0);
    assert_eq!(record.agent_id().unwrap(), receipt.agent_id);
}

#[tokio::test]
async fn duplicate_did_aborts_before_reveal_gas() {
    let contract = Arc::new(MockRegistryContract::new());
    let agent_a = client(&contract);
    let agent_b = client(&contract);
    let req = request("shared-did");

    agent_a.register_agent(&req).await.unwrap();

    // B's pre-registration resolve sees the record and aborts: no
    // commitment is ever submitted, saving the doomed reveal.
    let err = agent_b.register_agent(&req).await.unwrap_err();
    assert_eq!(err.code(), "DID_TAKEN");
    assert_eq!(contract.open_commitments(), 0);
}

#[tokio::test]
async fn duplicate_did_is_rejected_at_reveal_by_the_contract() {
    let contract = Arc::new(MockRegistryContract::new());
    let agent_a = client(&contract);
    let req = request("raced-did");
    agent_a.register_agent(&req).await.unwrap();

    // B skips the pre-resolve and goes straight to commit + reveal; the
    // contract itself must then reject the duplicate.
    let owner_b = KeyPair::generate(KeyAlgorithm::EcdsaSecp256k1);
    let prepared =
        prepare_registration(&request("raced-did"), &owner_b, &fast_config(), [9u8; 32]).unwrap();
    contract
        .commit_registration(prepared.owner, prepared.commit_hash, 0)
        .await
        .unwrap();
    let err = contract
        .register_agent_with_params(prepared.owner, prepared.params)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("DID already registered"));
}

#[tokio::test]
async fn early_reveal_is_refused_by_the_commitment_window() {
    let contract = Arc::new(
        MockRegistryContract::new()
            .with_reveal_window(Duration::from_secs(60), Duration::from_secs(600)),
    );
    // The client's own delay is zero, so the reveal lands inside the
    // contract's minimum delay and must bounce.
    let registry = client(&contract);
    let err = registry.register_agent(&request("hasty")).await.unwrap_err();
    assert_eq!(err.code(), "COMMIT_EXPIRED");
    // The commitment survives for a later, correctly timed reveal.
    assert_eq!(contract.open_commitments(), 1);
}

#[tokio::test]
async fn reveal_without_commit_is_refused() {
    let contract = Arc::new(MockRegistryContract::new());
    let owner = KeyPair::generate(KeyAlgorithm::EcdsaSecp256k1);
    let prepared =
        prepare_registration(&request("no-commit"), &owner, &fast_config(), [3u8; 32]).unwrap();
    let err = contract
        .register_agent_with_params(prepared.owner, prepared.params)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::CommitNotFound));
}

#[tokio::test]
async fn commitments_are_idempotent_per_committer() {
    let contract = Arc::new(MockRegistryContract::new());
    let owner = KeyPair::generate(KeyAlgorithm::EcdsaSecp256k1);
    let prepared =
        prepare_registration(&request("twice"), &owner, &fast_config(), [4u8; 32]).unwrap();
    contract
        .commit_registration(prepared.owner, prepared.commit_hash, 0)
        .await
        .unwrap();
    contract
        .commit_registration(prepared.owner, prepared.commit_hash, 0)
        .await
        .unwrap();
    assert_eq!(contract.open_commitments(), 1);
}

#[tokio::test]
async fn partial_update_carries_current_values_and_bumps_nonce() {
    let contract = Arc::new(MockRegistryContract::new());
    let registry = client(&contract);
    let req = request("updatable");
    let receipt = registry.register_agent(&req).await.unwrap();

    registry
        .update(
            &req.did,
            AgentUpdate {
                endpoint: Some("https://moved.example".into()),
                ..AgentUpdate::default()
            },
        )
        .await
        .unwrap();

    let record = registry
        .resolve(&req.did, Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(record.endpoint, "https://moved.example");
    assert_eq!(record.name, "updatable"); // unchanged field carried over
    assert_eq!(record.nonce, 1);
    assert_eq!(registry.get_nonce(receipt.agent_id).await.unwrap(), 1);

    // A second update signs with the bumped nonce.
    registry
        .update(
            &req.did,
            AgentUpdate {
                name: Some("renamed".into()),
                ..AgentUpdate::default()
            },
        )
        .await
        .unwrap();
    let record = registry
        .resolve(&req.did, Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(record.name, "renamed");
    assert_eq!(record.nonce, 2);
}

#[tokio::test]
async fn pre_nonce_contracts_fall_back_to_zero() {
    let contract = Arc::new(MockRegistryContract::new().without_nonce_support());
    let registry = client(&contract);
    let req = request("legacy");
    let receipt = registry.register_agent(&req).await.unwrap();

    assert_eq!(registry.get_nonce(receipt.agent_id).await.unwrap(), 0);
    // The first update still succeeds because the record's nonce is 0.
    registry
        .update(
            &req.did,
            AgentUpdate {
                description: Some("updated".into()),
                ..AgentUpdate::default()
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn deactivation_is_terminal() {
    let contract = Arc::new(MockRegistryContract::new());
    let registry = client(&contract);
    let req = request("mortal");
    registry.register_agent(&req).await.unwrap();

    registry.deactivate(&req.did).await.unwrap();
    let record = registry
        .resolve(&req.did, Duration::from_secs(5))
        .await
        .unwrap();
    assert!(!record.active);

    let err = registry.deactivate(&req.did).await.unwrap_err();
    assert!(matches!(err, RegistryError::Rejected(_)));
}

#[tokio::test]
async fn foreign_owner_cannot_update() {
    let contract = Arc::new(MockRegistryContract::new());
    let owner = client(&contract);
    let intruder = client(&contract);
    let req = request("guarded");
    owner.register_agent(&req).await.unwrap();

    let err = intruder
        .update(
            &req.did,
            AgentUpdate {
                endpoint: Some("https://evil.example".into()),
                ..AgentUpdate::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Rejected(_)));
}

#[tokio::test]
async fn slow_transport_hits_the_resolve_deadline() {
    let contract =
        Arc::new(MockRegistryContract::new().with_latency(Duration::from_millis(200)));
    let registry = client(&contract);
    let err = registry
        .resolve(
            &Did::new(Network::Ethereum, "anyone").unwrap(),
            Duration::from_millis(20),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "DEADLINE_EXCEEDED");
}

#[tokio::test]
async fn resolver_adapter_maps_identity_keys_and_hides_inactive_agents() {
    let contract = Arc::new(MockRegistryContract::new());
    let registry = Arc::new(client(&contract));
    let req = request("resolvable");
    registry.register_agent(&req).await.unwrap();

    let resolver = DidResolver::new(
        Arc::clone(&registry) as Arc<dyn RegistryClient>,
        Duration::from_secs(5),
    );
    let record = resolver.resolve(&req.did).await.unwrap();
    assert_eq!(record.did, req.did);

    let key = resolver.resolve_key(&req.did.to_string()).await.unwrap();
    assert_eq!(key.algorithm, KeyAlgorithm::Ed25519);
    assert_eq!(
        key.public_key,
        req.keys[0].public_key().as_bytes().to_vec()
    );

    registry.deactivate(&req.did).await.unwrap();
    let err = resolver.resolve(&req.did).await.unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
}
