// Path: crates/telemetry/src/init.rs
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// How a SAGE process identifies itself in its log stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetrySettings {
    /// Service name stamped on the startup event (`sage-agent`,
    /// `sage-registry-gw`, ...).
    #[serde(default = "default_service")]
    pub service: String,
    /// Filter directive applied when `RUST_LOG` is unset. The default
    /// keeps foreign crates at `info` while the `sage_*` crates log at
    /// `debug`, which is where the handshake and validator breadcrumbs
    /// live.
    #[serde(default = "default_directive")]
    pub default_directive: String,
}

fn default_service() -> String {
    "sage".to_string()
}

fn default_directive() -> String {
    "info,sage_handshake=debug,sage_validation=debug,sage_session=debug".to_string()
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            service: default_service(),
            default_directive: default_directive(),
        }
    }
}

/// Installs the global `tracing` subscriber for a SAGE process.
///
/// JSON events go to stderr with span context attached (the spans from
/// [`crate::span`] flatten into every event inside them), `log` records
/// from the component crates are bridged into `tracing`, and the filter
/// comes from `RUST_LOG` with the settings' directive as fallback. Fails
/// if a global subscriber is already installed.
pub fn init_tracing(settings: &TelemetrySettings) -> Result<(), anyhow::Error> {
    let fmt_layer = fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_current_span(true)
        .with_span_list(false);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.default_directive));
    let subscriber = Registry::default().with(filter).with(fmt_layer);
    tracing_log::LogTracer::init()?;
    tracing::subscriber::set_global_default(subscriber)?;
    tracing::info!(
        service = %settings.service,
        version = env!("CARGO_PKG_VERSION"),
        "telemetry initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_sage_crates_at_debug() {
        let settings = TelemetrySettings::default();
        assert_eq!(settings.service, "sage");
        assert!(settings.default_directive.contains("sage_handshake=debug"));
        assert!(settings.default_directive.starts_with("info"));
    }

    #[test]
    fn settings_deserialize_with_partial_input() {
        let settings: TelemetrySettings =
            serde_json::from_str(r#"{"service":"sage-agent"}"#).unwrap();
        assert_eq!(settings.service, "sage-agent");
        assert_eq!(settings.default_directive, default_directive());
    }

    #[test]
    fn second_install_is_an_error() {
        let settings = TelemetrySettings::default();
        // The first call owns the global subscriber; the second must fail
        // rather than silently swap it out.
        init_tracing(&settings).unwrap();
        assert!(init_tracing(&settings).is_err());
    }
}
