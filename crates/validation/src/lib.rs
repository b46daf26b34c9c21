// Path: crates/validation/src/lib.rs
//! # SAGE Validation
//!
//! The message-freshness pipeline: a single-use nonce ledger, per-session
//! sequence/timestamp ordering, content-hash deduplication, and the
//! composite validator that runs all three behind one call.
//!
//! Every ledger is individually thread-safe (sharded maps with
//! compare-and-set updates), so a racing pair of identical messages
//! produces exactly one acceptance. Background sweeping is opt-in via
//! [`sweeper::SweeperHandle`]-returning spawn methods and always terminates
//! cleanly on shutdown.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]

pub mod dedupe;
pub mod nonce;
pub mod order;
pub mod sweeper;
pub mod validator;

pub use dedupe::DedupeDetector;
pub use nonce::NonceManager;
pub use order::OrderManager;
pub use validator::{MessageValidator, ValidationOutcome, ValidatorStats};

/// The current unix time in milliseconds.
pub(crate) fn unix_now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
