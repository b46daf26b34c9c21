// Path: crates/health/src/probes.rs
//! Probes over the core components.

use async_trait::async_trait;
use sage_api::health::{HealthCheck, HealthStatus};
use sage_api::registry::RegistryClient;
use sage_session::SessionManager;
use sage_types::did::Did;
use sage_types::error::RegistryError;
use sage_validation::MessageValidator;
use std::sync::Arc;
use std::time::Duration;

/// Probes registry reachability with a deadline-bounded sentinel resolve.
///
/// `NotFound` counts as healthy (the registry answered); only transport
/// failures and deadline overruns are outages.
pub struct RegistryProbe {
    client: Arc<dyn RegistryClient>,
    sentinel: Did,
    deadline: Duration,
}

impl RegistryProbe {
    /// Builds a probe resolving `sentinel` within `deadline`.
    pub fn new(client: Arc<dyn RegistryClient>, sentinel: Did, deadline: Duration) -> Self {
        Self {
            client,
            sentinel,
            deadline,
        }
    }
}

#[async_trait]
impl HealthCheck for RegistryProbe {
    fn name(&self) -> &str {
        "registry"
    }

    async fn check(&self) -> HealthStatus {
        match self.client.resolve(&self.sentinel, self.deadline).await {
            Ok(_) | Err(RegistryError::NotFound(_)) => HealthStatus::healthy("registry reachable"),
            Err(e) => HealthStatus::unhealthy(format!("registry unreachable: {e}")),
        }
    }
}

/// Reports the session manager's live-session count.
pub struct SessionManagerProbe {
    manager: Arc<SessionManager>,
}

impl SessionManagerProbe {
    /// Builds a probe over the manager.
    pub fn new(manager: Arc<SessionManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl HealthCheck for SessionManagerProbe {
    fn name(&self) -> &str {
        "sessions"
    }

    async fn check(&self) -> HealthStatus {
        HealthStatus::healthy(format!("{} live sessions", self.manager.live_sessions()))
    }
}

/// Reports the validator's ledger sizes.
pub struct ValidatorProbe {
    validator: Arc<MessageValidator>,
}

impl ValidatorProbe {
    /// Builds a probe over the validator.
    pub fn new(validator: Arc<MessageValidator>) -> Self {
        Self { validator }
    }
}

#[async_trait]
impl HealthCheck for ValidatorProbe {
    fn name(&self) -> &str {
        "validator"
    }

    async fn check(&self) -> HealthStatus {
        let stats = self.validator.stats();
        HealthStatus::healthy(format!(
            "{} nonces, {} packets, {} sessions tracked",
            stats.tracked_nonces, stats.tracked_packets, stats.tracked_sessions
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::CompositeHealthChecker;
    use sage_crypto::KeyPair;
    use sage_did::client::EthereumRegistry;
    use sage_test_utils::MockRegistryContract;
    use sage_types::config::{
        DedupeConfig, NonceConfig, OrderConfig, RegistryConfig, SessionConfig, ValidatorConfig,
    };
    use sage_types::did::Network;
    use sage_types::message::KeyAlgorithm;
    use sage_validation::{DedupeDetector, NonceManager, OrderManager};

    fn registry(contract: &Arc<MockRegistryContract>) -> Arc<EthereumRegistry> {
        Arc::new(
            EthereumRegistry::new(
                Arc::clone(contract) as Arc<dyn sage_api::registry::RegistryContract>,
                RegistryConfig::default(),
                KeyPair::generate(KeyAlgorithm::EcdsaSecp256k1),
            )
            .unwrap(),
        )
    }

    fn validator() -> Arc<MessageValidator> {
        Arc::new(MessageValidator::new(
            &ValidatorConfig::default(),
            Arc::new(NonceManager::new(&NonceConfig::default())),
            Arc::new(OrderManager::new(&OrderConfig::default())),
            Arc::new(DedupeDetector::new(&DedupeConfig::default())),
        ))
    }

    #[tokio::test]
    async fn full_stack_report_is_healthy() {
        let contract = Arc::new(MockRegistryContract::new());
        let checker = CompositeHealthChecker::new()
            .register(Arc::new(RegistryProbe::new(
                registry(&contract),
                Did::new(Network::Ethereum, "sentinel").unwrap(),
                Duration::from_secs(1),
            )))
            .register(Arc::new(SessionManagerProbe::new(Arc::new(
                SessionManager::new(SessionConfig::default()),
            ))))
            .register(Arc::new(ValidatorProbe::new(validator())));

        let report = checker.check_all().await;
        assert!(report.healthy, "{report:?}");
        assert_eq!(report.components.len(), 3);
    }

    #[tokio::test]
    async fn registry_outage_is_reported() {
        let contract = Arc::new(MockRegistryContract::new());
        contract.set_offline(true);
        let probe = RegistryProbe::new(
            registry(&contract),
            Did::new(Network::Ethereum, "sentinel").unwrap(),
            Duration::from_secs(1),
        );
        let status = probe.check().await;
        assert!(!status.healthy);
        assert!(status.detail.contains("unreachable"));
    }
}
