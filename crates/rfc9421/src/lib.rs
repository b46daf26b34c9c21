// Path: crates/rfc9421/src/lib.rs
//! # SAGE RFC 9421 Engine
//!
//! HTTP Message Signatures (RFC 9421) for agent-to-agent calls: canonical
//! signature-base construction, `Signature-Input` / `Signature` header
//! emission and parsing, and multi-algorithm sign/verify keyed by DID.
//!
//! # Module layout
//! - [`message`]: the abstract HTTP message view the engine signs.
//! - [`component`]: covered-component identifiers (`@method`, headers, ...).
//! - [`base`]: canonical signature-base construction (RFC 9421 §2.3).
//! - [`wire`]: the two signature headers, emission and parsing.
//! - [`digest`]: `content-digest` helpers for body coverage.
//! - [`signer`] / [`verifier`]: the high-level entry points.
//! - [`signed_message`]: the structured application-message shape.
//!
//! Signature bytes ride in the `Signature` header as an RFC 8941 byte
//! sequence (`:base64:`); ECDSA signatures are the raw 64-byte `r || s`
//! form for both `es256` and `es256k`.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]

pub mod base;
pub mod component;
pub mod digest;
pub mod message;
pub mod signed_message;
pub mod signer;
pub mod verifier;
pub mod wire;

pub use message::HttpMessage;
pub use signer::{sign, SignatureOptions};
pub use verifier::{verify, Verifier};
