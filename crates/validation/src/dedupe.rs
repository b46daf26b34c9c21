// Path: crates/validation/src/dedupe.rs
//! Content-hash deduplication.
//!
//! The content hash is SHA-256 over `sequence || nonce || timestamp`
//! (fixed-width big-endian integers, so the concatenation is unambiguous).
//! Seen hashes live in a TTL map with the same lazy + periodic eviction as
//! the nonce ledger.

use crate::sweeper::{self, SweeperHandle};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sage_types::config::DedupeConfig;
use sage_types::error::ValidationError;
use sage_types::message::MessageHeader;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A 32-byte message content hash.
pub type ContentHash = [u8; 32];

/// Computes the dedupe hash of a message header.
pub fn content_hash(header: &MessageHeader) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(header.sequence.to_be_bytes());
    hasher.update(header.nonce.as_bytes());
    hasher.update(header.timestamp_ms.to_be_bytes());
    hasher.finalize().into()
}

/// The seen-content ledger.
pub struct DedupeDetector {
    seen: DashMap<ContentHash, Instant>,
    ttl: Duration,
    cleanup_interval: Duration,
}

impl DedupeDetector {
    /// Builds a detector from configuration.
    pub fn new(config: &DedupeConfig) -> Self {
        Self {
            seen: DashMap::new(),
            ttl: config.ttl(),
            cleanup_interval: config.cleanup_interval(),
        }
    }

    /// Whether this header's content hash was seen within the TTL. Expired
    /// entries are evicted on the way out.
    pub fn is_duplicate(&self, header: &MessageHeader) -> bool {
        match self.seen.entry(content_hash(header)) {
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

    /// Atomically records the header's content hash. A fresh duplicate
    /// fails with [`ValidationError::Duplicate`].
    pub fn mark_packet_seen(&self, header: &MessageHeader) -> Result<(), ValidationError> {
        match self.seen.entry(content_hash(header)) {
            Entry::Occupied(mut entry) => {
                if entry.get().elapsed() > self.ttl {
                    entry.insert(Instant::now());
                    Ok(())
                } else {
                    Err(ValidationError::Duplicate)
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
    pub(crate) fn release(&self, header: &MessageHeader) {
        self.seen.remove(&content_hash(header));
    }

    /// Evicts every expired entry, returning the count removed.
    pub fn sweep(&self) -> usize {
        let before = self.seen.len();
        self.seen.retain(|_, seen_at| seen_at.elapsed() <= self.ttl);
        before.saturating_sub(self.seen.len())
    }

    /// Number of tracked (possibly stale) entries.
    pub fn tracked(&self) -> usize {
        self.seen.len()
    }

    /// Starts the periodic sweeper for this ledger.
    pub fn spawn_sweeper(self: &Arc<Self>) -> SweeperHandle {
        let this = Arc::clone(self);
        sweeper::spawn("DedupeDetector", self.cleanup_interval, move || {
            this.sweep()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sage_types::did::{Did, Network};

    fn header(sequence: u64, nonce: &str, timestamp_ms: u64) -> MessageHeader {
        MessageHeader {
            agent_did: Did::new(Network::Ethereum, "sender").unwrap(),
            message_id: "m-1".into(),
            timestamp_ms,
            nonce: nonce.into(),
            sequence,
        }
    }

    fn detector(ttl_secs: u64) -> DedupeDetector {
        DedupeDetector::new(&DedupeConfig {
            ttl_secs,
            cleanup_interval_secs: 60,
        })
    }

    #[test]
    fn duplicate_only_after_mark() {
        let d = detector(300);
        let h = header(1, "n", 10);
        assert!(!d.is_duplicate(&h));
        d.mark_packet_seen(&h).unwrap();
        assert!(d.is_duplicate(&h));
        assert_eq!(d.mark_packet_seen(&h), Err(ValidationError::Duplicate));
    }

    #[test]
    fn hash_covers_all_three_fields() {
        let base = header(1, "n", 10);
        assert_ne!(content_hash(&base), content_hash(&header(2, "n", 10)));
        assert_ne!(content_hash(&base), content_hash(&header(1, "m", 10)));
        assert_ne!(content_hash(&base), content_hash(&header(1, "n", 11)));
        // Fields that are not part of the content identity do not count.
        let mut other_sender = header(1, "n", 10);
        other_sender.message_id = "m-2".into();
        assert_eq!(content_hash(&base), content_hash(&other_sender));
    }

    #[test]
    fn expiry_clears_duplicates() {
        let d = detector(0);
        let h = header(1, "n", 10);
        d.mark_packet_seen(&h).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        assert!(!d.is_duplicate(&h));
        assert!(d.mark_packet_seen(&h).is_ok());
    }

    #[test]
    fn sweep_counts_evictions() {
        let d = detector(0);
        d.mark_packet_seen(&header(1, "a", 1)).unwrap();
        d.mark_packet_seen(&header(2, "b", 2)).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(d.sweep(), 2);
        assert_eq!(d.tracked(), 0);
    }
}
