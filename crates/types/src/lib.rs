// Path: crates/types/src/lib.rs
#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! # SAGE Types
//!
//! This crate is the foundational library for SAGE (Secure Agent Guarantee
//! Engine), containing the core data model, configuration objects, and the
//! unified error taxonomy.
//!
//! ## Architectural Role
//!
//! As the base crate, `sage-types` has minimal dependencies and is itself a
//! dependency for almost every other crate in the workspace. This structure
//! prevents circular dependencies and provides a stable, canonical definition
//! for shared types like [`did::Did`], [`agent::AgentRecord`], and the error
//! enums with their stable machine-readable codes.

/// Registry-resident agent records, keys, and registration commitments.
pub mod agent;
/// The canonical, deterministic byte framing used for hashes and signing preimages.
pub mod codec;
/// Shared configuration structures with the documented defaults.
pub mod config;
/// DID syntax, parsing, and generation (`did:sage:<network>:<identifier>`).
pub mod did;
/// A unified set of all error types used across the workspace.
pub mod error;
/// Application-level message shapes and signature parameters.
pub mod message;

/// The maximum number of keys an agent record may carry (deployment-fixed).
pub const MAX_AGENT_KEYS: usize = 10;
