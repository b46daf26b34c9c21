// Path: crates/validation/src/nonce.rs
//! The single-use nonce ledger.
//!
//! A nonce is a 22-character base64url token of 16 random bytes. Once
//! marked used it stays in the ledger for the configured TTL; within that
//! window any further mark attempt fails with `REPLAY`. Eviction is lazy on
//! access plus an optional periodic sweep.

use crate::sweeper::{self, SweeperHandle};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::RngCore;
use sage_types::config::NonceConfig;
use sage_types::error::ValidationError;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Raw entropy per generated nonce.
const NONCE_LEN: usize = 16;

/// The single-use nonce ledger.
pub struct NonceManager {
    entries: DashMap<String, Instant>,
    ttl: Duration,
    cleanup_interval: Duration,
}

impl NonceManager {
    /// Builds a ledger from configuration.
    pub fn new(config: &NonceConfig) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: config.ttl(),
            cleanup_interval: config.cleanup_interval(),
        }
    }

    /// Generates a fresh 22-character base64url nonce.
    pub fn generate(&self) -> String {
        let mut bytes = [0u8; NONCE_LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Whether the nonce was consumed within the TTL. Expired entries are
    /// evicted on the way out.
    pub fn is_used(&self, nonce: &str) -> bool {
        match self.entries.entry(nonce.to_string()) {
            Entry::Occupied(entry) => {
                if entry.get().elapsed() > self.ttl {
                    entry.remove();
                    false
                } else {
                    true
                }
            }
            Entry::Vacant(_) => false,
        }
    }

    /// Atomically consumes the nonce.
    ///
    /// Under a race on the same value, exactly one caller succeeds and the
    /// rest observe [`ValidationError::Replay`].
    pub fn mark_used(&self, nonce: &str) -> Result<(), ValidationError> {
        match self.entries.entry(nonce.to_string()) {
            Entry::Occupied(mut entry) => {
                if entry.get().elapsed() > self.ttl {
                    entry.insert(Instant::now());
                    Ok(())
                } else {
                    Err(ValidationError::Replay(nonce.to_string()))
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(Instant::now());
                Ok(())
            }
        }
    }

    /// Rolls back a provisional mark when a later pipeline stage rejects
    /// the message. Only the composite validator calls this.
    pub(crate) fn release(&self, nonce: &str) {
        self.entries.remove(nonce);
    }

    /// Evicts every expired entry, returning the count removed.
    pub fn sweep(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, seen_at| seen_at.elapsed() <= self.ttl);
        before.saturating_sub(self.entries.len())
    }

    /// Number of tracked (possibly stale) entries.
    pub fn tracked(&self) -> usize {
        self.entries.len()
    }

    /// Starts the periodic sweeper for this ledger.
    pub fn spawn_sweeper(self: &Arc<Self>) -> SweeperHandle {
        let this = Arc::clone(self);
        sweeper::spawn("NonceManager", self.cleanup_interval, move || this.sweep())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn manager(ttl_secs: u64) -> NonceManager {
        NonceManager::new(&NonceConfig {
            ttl_secs,
            cleanup_interval_secs: 60,
        })
    }

    #[test]
    fn generated_nonces_are_22_chars_and_unique() {
        let m = manager(300);
        let a = m.generate();
        let b = m.generate();
        assert_eq!(a.len(), 22);
        assert_ne!(a, b);
    }

    #[test]
    fn single_use_within_ttl() {
        let m = manager(300);
        let n = m.generate();
        assert!(!m.is_used(&n));
        m.mark_used(&n).unwrap();
        assert!(m.is_used(&n));
        assert_eq!(
            m.mark_used(&n),
            Err(ValidationError::Replay(n.clone()))
        );
    }

    #[test]
    fn replay_error_message_contains_phrase() {
        let m = manager(300);
        m.mark_used("nAnLbQTxYlXOQC9VgZ-uWg").unwrap();
        let err = m.mark_used("nAnLbQTxYlXOQC9VgZ-uWg").unwrap_err();
        assert!(err.to_string().contains("nonce has been used"));
    }

    #[test]
    fn expired_nonces_are_reusable_and_lazily_evicted() {
        let m = manager(0); // immediate expiry
        let n = m.generate();
        m.mark_used(&n).unwrap();
        thread::sleep(Duration::from_millis(5));
        assert!(!m.is_used(&n));
        assert!(m.mark_used(&n).is_ok());
    }

    #[test]
    fn concurrent_mark_used_has_exactly_one_winner() {
        let m = Arc::new(manager(300));
        let nonce = m.generate();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let m = Arc::clone(&m);
            let nonce = nonce.clone();
            handles.push(thread::spawn(move || m.mark_used(&nonce).is_ok()));
        }
        let wins: usize = handles
            .into_iter()
            .map(|h| usize::from(h.join().unwrap()))
            .sum();
        assert_eq!(wins, 1);
    }

    #[test]
    fn sweep_removes_only_expired() {
        let m = manager(0);
        m.mark_used("a").unwrap();
        m.mark_used("b").unwrap();
        thread::sleep(Duration::from_millis(5));
        assert_eq!(m.sweep(), 2);
        assert_eq!(m.tracked(), 0);

        let m = manager(300);
        m.mark_used("c").unwrap();
        assert_eq!(m.sweep(), 0);
        assert_eq!(m.tracked(), 1);
    }
}
