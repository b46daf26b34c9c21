// Path: crates/did/src/lib.rs
//! # SAGE DID
//!
//! The chain-facing identity layer: commit–reveal registration, record
//! resolution, updates, and deactivation against the multi-key registry
//! contract surface defined in `sage-api`.
//!
//! The blockchain transport itself is out of scope; everything here runs
//! against an `Arc<dyn RegistryContract>` handed to the constructor (no
//! process-global provider lookup), which is what makes the whole layer
//! testable against an in-memory contract.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]

pub mod client;
pub mod commit;
pub mod resolver;

pub use client::EthereumRegistry;
pub use commit::RegistrationRequest;
pub use resolver::DidResolver;
