// Path: crates/telemetry/src/span.rs
//! Span constructors for the pipeline's domain operations.
//!
//! Every span pins the identifiers an operator correlates on. Entering
//! one around a handshake, a session operation, or a registry call puts
//! `ctx` / `session_id` / `did` on each event emitted inside it, from any
//! crate, without that crate knowing about tracing at all (its `log`
//! records are bridged in by [`crate::init::init_tracing`]).

use sage_types::did::Did;
use tracing::{info_span, Span};

/// A span covering one handshake attempt, from initiate to accept.
pub fn handshake_span(context_id: &str, initiator: &Did, responder: &Did) -> Span {
    info_span!(
        "handshake",
        ctx = %context_id,
        init = %initiator,
        resp = %responder,
    )
}

/// A span covering work on one established session.
pub fn session_span(session_id: &str) -> Span {
    info_span!("session", session_id = %session_id)
}

/// A span covering one registry operation against a DID.
pub fn registry_span(operation: &str, did: &Did) -> Span {
    info_span!("registry", op = %operation, did = %did)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sage_types::did::Network;

    #[test]
    fn spans_carry_their_operation_names() {
        // Without a subscriber the spans are disabled but still typed;
        // the constructors must not panic on any DID shape.
        let did = Did::new(Network::Ethereum, "alice").unwrap();
        let sol = Did::new(Network::Solana, "urn:agent:42").unwrap();
        let _ = handshake_span("ctx-1", &did, &sol);
        let _ = session_span("AAAAAAAAAAAAAAAAAAAAAA");
        let _ = registry_span("resolve", &did);
    }
}
