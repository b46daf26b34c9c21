// Path: crates/crypto/src/error.rs
//! Local error types for the `sage-crypto` crate.

// Re-export the canonical error types from the base crate.
pub use sage_types::error::{CryptoError, VaultError};
