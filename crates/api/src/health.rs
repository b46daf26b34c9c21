// Path: crates/api/src/health.rs

//! Health-probe traits.
//!
//! Components expose a cheap, side-effect-free [`HealthCheck`]; operational
//! probes aggregate them (see `sage-health`) and translate the report into
//! whatever surface they serve (`/healthz`, exit codes, ...).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The outcome of a single component probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Whether the component considers itself serviceable.
    pub healthy: bool,
    /// Operator-readable detail (counts, last error, ...).
    pub detail: String,
}

impl HealthStatus {
    /// A healthy status with the given detail.
    pub fn healthy(detail: impl Into<String>) -> Self {
        Self {
            healthy: true,
            detail: detail.into(),
        }
    }

    /// An unhealthy status with the given detail.
    pub fn unhealthy(detail: impl Into<String>) -> Self {
        Self {
            healthy: false,
            detail: detail.into(),
        }
    }
}

/// A cheap liveness/readiness probe over one component.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// A stable component name for the report.
    fn name(&self) -> &str;

    /// Runs the probe. Must not mutate component state.
    async fn check(&self) -> HealthStatus;
}
