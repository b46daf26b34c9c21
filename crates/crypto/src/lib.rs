// Path: crates/crypto/src/lib.rs
//! # SAGE Crypto Crate Lints
//!
//! This crate enforces a strict set of lints to ensure high-quality,
//! panic-free, and well-documented code. Panics are disallowed in non-test
//! code to promote robust error handling.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]
//! # SAGE Cryptography
//!
//! Key material for the SAGE message-security pipeline: typed key pairs
//! over the closed algorithm set (Ed25519, ECDSA P-256, ECDSA secp256k1,
//! X25519), JWK and PKCS#8 PEM serialization, the encrypted key vault, and
//! Ethereum address derivation.

pub mod address;
pub mod error;
pub mod jwk;
pub mod keys;
pub mod pem;
pub mod vault;

pub use keys::{KeyPair, PublicKey};
