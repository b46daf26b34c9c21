// Path: crates/validation/src/order.rs
//! Per-session sequence and timestamp ordering.
//!
//! A message is accepted iff its sequence strictly advances the session's
//! last accepted sequence AND its timestamp is no more than the configured
//! window behind the last accepted timestamp. The first accepted message
//! establishes the baseline. State advances only on accept and never
//! regresses.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sage_types::config::OrderConfig;
use sage_types::error::ValidationError;

#[derive(Debug, Clone, Copy)]
struct OrderState {
    last_sequence: u64,
    last_timestamp_ms: u64,
}

/// Tracks ordering state per session.
pub struct OrderManager {
    sessions: DashMap<String, OrderState>,
    window_ms: u64,
}

impl OrderManager {
    /// Builds an order manager from configuration.
    pub fn new(config: &OrderConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            window_ms: config.max_out_of_order_window_ms,
        }
    }

    /// Read-only admission check, leaving state untouched.
    pub fn peek(
        &self,
        session_id: &str,
        sequence: u64,
        timestamp_ms: u64,
    ) -> Result<(), ValidationError> {
        match self.sessions.get(session_id) {
            Some(state) => Self::admit(&state, self.window_ms, sequence, timestamp_ms),
            None => Ok(()),
        }
    }

    /// Checks the message against the session state and, on accept,
    /// advances it. Check and update are atomic per session.
    pub fn process_message(
        &self,
        session_id: &str,
        sequence: u64,
        timestamp_ms: u64,
    ) -> Result<(), ValidationError> {
        match self.sessions.entry(session_id.to_string()) {
            Entry::Occupied(mut entry) => {
                let state = *entry.get();
                Self::admit(&state, self.window_ms, sequence, timestamp_ms)?;
                entry.insert(OrderState {
                    last_sequence: sequence,
                    last_timestamp_ms: state.last_timestamp_ms.max(timestamp_ms),
                });
                Ok(())
            }
            Entry::Vacant(entry) => {
                // Initial accept establishes the baseline.
                entry.insert(OrderState {
                    last_sequence: sequence,
                    last_timestamp_ms: timestamp_ms,
                });
                Ok(())
            }
        }
    }

    fn admit(
        state: &OrderState,
        window_ms: u64,
        sequence: u64,
        timestamp_ms: u64,
    ) -> Result<(), ValidationError> {
        if sequence <= state.last_sequence {
            return Err(ValidationError::InvalidSequence {
                got: sequence,
                last: state.last_sequence,
            });
        }
        if timestamp_ms.saturating_add(window_ms) < state.last_timestamp_ms {
            return Err(ValidationError::OutOfOrder);
        }
        Ok(())
    }

    /// Drops a session's ordering state (e.g. when the session is removed).
    pub fn remove_session(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }

    /// Number of sessions with tracked ordering state.
    pub fn tracked_sessions(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict() -> OrderManager {
        OrderManager::new(&OrderConfig {
            max_out_of_order_window_ms: 0,
        })
    }

    #[test]
    fn baseline_then_monotonic() {
        let m = strict();
        m.process_message("s", 5, 1_000).unwrap();
        m.process_message("s", 6, 1_001).unwrap();

        assert_eq!(
            m.process_message("s", 6, 2_000),
            Err(ValidationError::InvalidSequence { got: 6, last: 6 })
        );
        assert_eq!(
            m.process_message("s", 2, 2_000),
            Err(ValidationError::InvalidSequence { got: 2, last: 6 })
        );
    }

    #[test]
    fn strict_mode_rejects_any_timestamp_regression() {
        let m = strict();
        m.process_message("s", 1, 1_000).unwrap();
        assert_eq!(
            m.process_message("s", 2, 999),
            Err(ValidationError::OutOfOrder)
        );
        // Equal timestamps are fine.
        m.process_message("s", 2, 1_000).unwrap();
    }

    #[test]
    fn window_allows_bounded_regression() {
        let m = OrderManager::new(&OrderConfig {
            max_out_of_order_window_ms: 50,
        });
        m.process_message("s", 1, 1_000).unwrap();
        m.process_message("s", 2, 960).unwrap(); // within 50ms window
        assert_eq!(
            m.process_message("s", 3, 900),
            Err(ValidationError::OutOfOrder)
        );
    }

    #[test]
    fn timestamp_never_regresses_on_accept() {
        let m = OrderManager::new(&OrderConfig {
            max_out_of_order_window_ms: 100,
        });
        m.process_message("s", 1, 1_000).unwrap();
        m.process_message("s", 2, 950).unwrap();
        // last_timestamp stayed at 1000, so 890 is still judged against it.
        assert_eq!(
            m.process_message("s", 3, 890),
            Err(ValidationError::OutOfOrder)
        );
    }

    #[test]
    fn sessions_are_independent() {
        let m = strict();
        m.process_message("a", 10, 1_000).unwrap();
        m.process_message("b", 1, 500).unwrap();
        assert_eq!(m.tracked_sessions(), 2);

        m.remove_session("a");
        assert_eq!(m.tracked_sessions(), 1);
        // A removed session starts from a fresh baseline.
        m.process_message("a", 1, 1).unwrap();
    }

    #[test]
    fn rejection_leaves_state_untouched() {
        let m = strict();
        m.process_message("s", 5, 1_000).unwrap();
        let _ = m.process_message("s", 4, 2_000);
        // Sequence 6 must still be judged against 5, not 4.
        m.process_message("s", 6, 1_000).unwrap();
    }
}
