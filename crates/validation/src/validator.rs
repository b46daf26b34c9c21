// Path: crates/validation/src/validator.rs
//! The composite message validator.
//!
//! Pipeline order, short-circuiting on the first failure:
//! timestamp skew -> nonce replay -> sequence/timestamp order -> content
//! dedupe. Sub-ledgers are only updated once every check has passed, and a
//! commit that loses a race is rolled back, so a rejected message never
//! leaves observable effects.

use crate::dedupe::DedupeDetector;
use crate::nonce::NonceManager;
use crate::order::OrderManager;
use crate::unix_now_ms;
use sage_types::config::ValidatorConfig;
use sage_types::error::ValidationError;
use sage_types::message::MessageHeader;
use std::sync::Arc;

/// The outcome of validating one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// Whether the message passed every check.
    pub valid: bool,
    /// The nonce was already consumed.
    pub is_replay: bool,
    /// The content hash was already seen.
    pub is_duplicate: bool,
    /// Sequence/timestamp ordering failed.
    pub is_out_of_order: bool,
    /// The failing check's error, if any.
    pub error: Option<ValidationError>,
}

impl ValidationOutcome {
    fn ok() -> Self {
        Self {
            valid: true,
            is_replay: false,
            is_duplicate: false,
            is_out_of_order: false,
            error: None,
        }
    }

    fn rejected(error: ValidationError) -> Self {
        let (is_replay, is_duplicate, is_out_of_order) = match &error {
            ValidationError::Replay(_) => (true, false, false),
            ValidationError::Duplicate => (false, true, false),
            ValidationError::OutOfOrder | ValidationError::InvalidSequence { .. } => {
                (false, false, true)
            }
            ValidationError::TimestampSkew { .. } => (false, false, false),
        };
        Self {
            valid: false,
            is_replay,
            is_duplicate,
            is_out_of_order,
            error: Some(error),
        }
    }
}

/// Observability counters over the validator's ledgers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorStats {
    /// Entries in the nonce ledger.
    pub tracked_nonces: usize,
    /// Entries in the dedupe ledger.
    pub tracked_packets: usize,
    /// Sessions with ordering state.
    pub tracked_sessions: usize,
}

/// Runs every freshness check behind one call.
///
/// The validator holds its sub-ledgers as shared handles: callers that need
/// direct access (the RFC 9421 verifier consumes the nonce ledger, the
/// session layer retires ordering state) share the same instances.
pub struct MessageValidator {
    nonces: Arc<NonceManager>,
    order: Arc<OrderManager>,
    dedupe: Arc<DedupeDetector>,
    tolerance_ms: u64,
}

impl MessageValidator {
    /// Builds a validator over existing ledgers.
    pub fn new(
        config: &ValidatorConfig,
        nonces: Arc<NonceManager>,
        order: Arc<OrderManager>,
        dedupe: Arc<DedupeDetector>,
    ) -> Self {
        Self {
            nonces,
            order,
            dedupe,
            tolerance_ms: config.timestamp_tolerance_secs.saturating_mul(1000),
        }
    }

    /// The shared nonce ledger.
    pub fn nonces(&self) -> &Arc<NonceManager> {
        &self.nonces
    }

    /// The shared order manager.
    pub fn order(&self) -> &Arc<OrderManager> {
        &self.order
    }

    /// The shared dedupe detector.
    pub fn dedupe(&self) -> &Arc<DedupeDetector> {
        &self.dedupe
    }

    /// Validates a message header, updating the ledgers only on acceptance.
    ///
    /// The ordering state is keyed by the sender DID; callers multiplexing
    /// several logical streams per sender should use
    /// [`MessageValidator::validate_for_session`].
    pub fn validate_message(&self, header: &MessageHeader) -> ValidationOutcome {
        self.validate_for_session(&header.agent_did.to_string(), header)
    }

    /// Validates a message header against an explicit session's ordering
    /// state.
    pub fn validate_for_session(
        &self,
        session_id: &str,
        header: &MessageHeader,
    ) -> ValidationOutcome {
        // (i) Wall-clock skew.
        let now = unix_now_ms();
        let delta_ms = now.abs_diff(header.timestamp_ms);
        if delta_ms > self.tolerance_ms {
            return ValidationOutcome::rejected(ValidationError::TimestampSkew { delta_ms });
        }

        // (ii)-(iv) Read-only admission checks, cheapest rejection first.
        if self.nonces.is_used(&header.nonce) {
            return ValidationOutcome::rejected(ValidationError::Replay(header.nonce.clone()));
        }
        if let Err(e) = self.order.peek(session_id, header.sequence, header.timestamp_ms) {
            return ValidationOutcome::rejected(e);
        }
        if self.dedupe.is_duplicate(header) {
            return ValidationOutcome::rejected(ValidationError::Duplicate);
        }

        // Commit. Each step is a CAS; a lost race rolls back the earlier
        // commits so the losing message leaves no trace.
        if let Err(e) = self.nonces.mark_used(&header.nonce) {
            return ValidationOutcome::rejected(e);
        }
        if let Err(e) = self.dedupe.mark_packet_seen(header) {
            self.nonces.release(&header.nonce);
            return ValidationOutcome::rejected(e);
        }
        if let Err(e) = self
            .order
            .process_message(session_id, header.sequence, header.timestamp_ms)
        {
            self.dedupe.release(header);
            self.nonces.release(&header.nonce);
            return ValidationOutcome::rejected(e);
        }

        ValidationOutcome::ok()
    }

    /// Current ledger sizes.
    pub fn stats(&self) -> ValidatorStats {
        ValidatorStats {
            tracked_nonces: self.nonces.tracked(),
            tracked_packets: self.dedupe.tracked(),
            tracked_sessions: self.order.tracked_sessions(),
        }
    }
}
