// Path: crates/health/src/composite.rs
//! Aggregation of component probes into one report.

use sage_api::health::{HealthCheck, HealthStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One component's entry in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// The component name.
    pub name: String,
    /// The probe outcome.
    pub status: HealthStatus,
}

/// The aggregated outcome of every registered probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    /// True iff every component reported healthy.
    pub healthy: bool,
    /// Per-component outcomes, in registration order.
    pub components: Vec<ComponentHealth>,
}

/// Runs a set of [`HealthCheck`]s and aggregates their results.
#[derive(Default)]
pub struct CompositeHealthChecker {
    checks: Vec<Arc<dyn HealthCheck>>,
}

impl CompositeHealthChecker {
    /// An empty checker.
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// Registers a probe.
    pub fn register(mut self, check: Arc<dyn HealthCheck>) -> Self {
        self.checks.push(check);
        self
    }

    /// Runs every probe in registration order.
    pub async fn check_all(&self) -> HealthReport {
        let mut components = Vec::with_capacity(self.checks.len());
        let mut healthy = true;
        for check in &self.checks {
            let status = check.check().await;
            if !status.healthy {
                log::warn!(
                    "[Health] component {} unhealthy: {}",
                    check.name(),
                    status.detail
                );
                healthy = false;
            }
            components.push(ComponentHealth {
                name: check.name().to_string(),
                status,
            });
        }
        HealthReport {
            healthy,
            components,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Fixed(&'static str, bool);

    #[async_trait]
    impl HealthCheck for Fixed {
        fn name(&self) -> &str {
            self.0
        }
        async fn check(&self) -> HealthStatus {
            if self.1 {
                HealthStatus::healthy("ok")
            } else {
                HealthStatus::unhealthy("down")
            }
        }
    }

    #[tokio::test]
    async fn report_aggregates_all_components() {
        let checker = CompositeHealthChecker::new()
            .register(Arc::new(Fixed("alpha", true)))
            .register(Arc::new(Fixed("beta", true)));
        let report = checker.check_all().await;
        assert!(report.healthy);
        assert_eq!(report.components.len(), 2);
        assert_eq!(report.components[0].name, "alpha");
    }

    #[tokio::test]
    async fn one_failure_fails_the_report() {
        let checker = CompositeHealthChecker::new()
            .register(Arc::new(Fixed("alpha", true)))
            .register(Arc::new(Fixed("beta", false)));
        let report = checker.check_all().await;
        assert!(!report.healthy);
        assert!(report.components[1].status.detail.contains("down"));
    }
}
