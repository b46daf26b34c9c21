// Path: crates/api/src/lib.rs
#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! # SAGE API
//!
//! Trait seams shared across the SAGE workspace. Components depend on these
//! abstractions rather than on each other's concrete types, which keeps the
//! dependency graph acyclic and makes every externally-blocking collaborator
//! (the chain registry above all) mockable in tests.
//!
//! Chain providers are explicit constructor parameters everywhere; there is
//! no process-global provider registry.

/// Health-probe traits consumed by operational tooling.
pub mod health;
/// The chain-agnostic registry contract and client seams.
pub mod registry;
/// DID and key resolution seams used by verification and the handshake.
pub mod resolver;
