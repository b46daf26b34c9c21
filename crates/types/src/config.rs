// Path: crates/types/src/config.rs

//! Shared configuration structures for the SAGE core components.
//!
//! Every field has a serde default equal to the documented default, so a
//! partial TOML file (or an empty one) deserializes to a valid configuration.
//! Durations are plain integers (seconds or milliseconds, named accordingly)
//! with `Duration` accessors.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the single-use nonce ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceConfig {
    /// How long a consumed nonce stays in the ledger.
    #[serde(default = "default_freshness_ttl_secs")]
    pub ttl_secs: u64,
    /// Period of the background sweep.
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

impl NonceConfig {
    /// The nonce TTL as a [`Duration`].
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// The sweep period as a [`Duration`].
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

impl Default for NonceConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_freshness_ttl_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

/// Configuration for the content-hash dedupe ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupeConfig {
    /// How long a seen content hash stays in the ledger.
    #[serde(default = "default_freshness_ttl_secs")]
    pub ttl_secs: u64,
    /// Period of the background sweep.
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

impl DedupeConfig {
    /// The dedupe TTL as a [`Duration`].
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// The sweep period as a [`Duration`].
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

impl Default for DedupeConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_freshness_ttl_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

/// Configuration for per-session sequence/timestamp ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfig {
    /// How far (milliseconds) a timestamp may trail the session's last
    /// accepted timestamp. 0 is strict ordering.
    #[serde(default)]
    pub max_out_of_order_window_ms: u64,
}

impl OrderConfig {
    /// The out-of-order window as a [`Duration`].
    pub fn max_out_of_order_window(&self) -> Duration {
        Duration::from_millis(self.max_out_of_order_window_ms)
    }
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            max_out_of_order_window_ms: 0, // strict
        }
    }
}

/// Configuration for the composite message validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Accepted distance between a message timestamp and the local clock.
    #[serde(default = "default_timestamp_tolerance_secs")]
    pub timestamp_tolerance_secs: u64,
}

impl ValidatorConfig {
    /// The timestamp tolerance as a [`Duration`].
    pub fn timestamp_tolerance(&self) -> Duration {
        Duration::from_secs(self.timestamp_tolerance_secs)
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            timestamp_tolerance_secs: default_timestamp_tolerance_secs(),
        }
    }
}

/// Configuration for AEAD sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Hard lifetime limit from creation.
    #[serde(default = "default_session_max_age_secs")]
    pub max_age_secs: u64,
    /// Idle limit since last successful use, milliseconds.
    #[serde(default = "default_session_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
    /// Total message budget across both directions.
    #[serde(default = "default_session_max_messages")]
    pub max_messages: u64,
}

impl SessionConfig {
    /// The hard lifetime limit as a [`Duration`].
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }

    /// The idle limit as a [`Duration`].
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_age_secs: default_session_max_age_secs(),
            idle_timeout_ms: default_session_idle_timeout_ms(),
            max_messages: default_session_max_messages(),
        }
    }
}

/// Configuration for the registry client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Deadline for a single `resolve` round trip.
    #[serde(default = "default_resolve_deadline_secs")]
    pub resolve_deadline_secs: u64,
    /// Minimum delay between commit and reveal.
    #[serde(default = "default_min_reveal_delay_secs")]
    pub min_reveal_delay_secs: u64,
    /// Window after commit within which the reveal must land.
    #[serde(default = "default_max_reveal_window_secs")]
    pub max_reveal_window_secs: u64,
    /// Chain id bound into commitment hashes and ownership proofs.
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Registry contract address, bound into ownership proofs.
    #[serde(default)]
    pub registry_address: [u8; 20],
    /// Stake escrowed with a commitment, in the chain's base unit.
    /// Deployment parameter, not a protocol constant.
    #[serde(default)]
    pub stake_amount: u64,
}

impl RegistryConfig {
    /// The resolve deadline as a [`Duration`].
    pub fn resolve_deadline(&self) -> Duration {
        Duration::from_secs(self.resolve_deadline_secs)
    }

    /// The minimum reveal delay as a [`Duration`].
    pub fn min_reveal_delay(&self) -> Duration {
        Duration::from_secs(self.min_reveal_delay_secs)
    }

    /// The maximum reveal window as a [`Duration`].
    pub fn max_reveal_window(&self) -> Duration {
        Duration::from_secs(self.max_reveal_window_secs)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            resolve_deadline_secs: default_resolve_deadline_secs(),
            min_reveal_delay_secs: default_min_reveal_delay_secs(),
            max_reveal_window_secs: default_max_reveal_window_secs(),
            chain_id: default_chain_id(),
            registry_address: [0u8; 20],
            stake_amount: 0,
        }
    }
}

/// Configuration for the encrypted key vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// PBKDF2-HMAC-SHA-256 iteration count for the KEK.
    #[serde(default = "default_pbkdf2_iterations")]
    pub pbkdf2_iterations: u32,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            pbkdf2_iterations: default_pbkdf2_iterations(),
        }
    }
}

/// The aggregated configuration for every SAGE core component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SageConfig {
    /// Nonce ledger settings.
    #[serde(default)]
    pub nonce: NonceConfig,
    /// Dedupe ledger settings.
    #[serde(default)]
    pub dedupe: DedupeConfig,
    /// Ordering settings.
    #[serde(default)]
    pub order: OrderConfig,
    /// Composite validator settings.
    #[serde(default)]
    pub validator: ValidatorConfig,
    /// Session layer settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Registry client settings.
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Vault settings.
    #[serde(default)]
    pub vault: VaultConfig,
}

impl SageConfig {
    /// Parses a configuration from TOML text; absent keys take defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

fn default_freshness_ttl_secs() -> u64 {
    300 // 5m
}
fn default_cleanup_interval_secs() -> u64 {
    60 // 1m
}
fn default_timestamp_tolerance_secs() -> u64 {
    300 // 5m
}
fn default_session_max_age_secs() -> u64 {
    3600 // 1h
}
fn default_session_idle_timeout_ms() -> u64 {
    600_000 // 10m
}
fn default_session_max_messages() -> u64 {
    1000
}
fn default_resolve_deadline_secs() -> u64 {
    30
}
fn default_min_reveal_delay_secs() -> u64 {
    60
}
fn default_max_reveal_window_secs() -> u64 {
    600 // 10m
}
fn default_chain_id() -> u64 {
    1
}
fn default_pbkdf2_iterations() -> u32 {
    100_000
}
