// Path: crates/session/src/lib.rs
//! # SAGE Session Layer
//!
//! AEAD sessions derived from an HPKE exporter secret. A session is a
//! ChaCha20-Poly1305 key plus a nonce base; frames are
//! `nonce(12) || ct || tag(16)` with associated data binding the session id
//! and the message counter. Expiry is the disjunction of a hard age limit,
//! an idle limit, and a message budget.
//!
//! The [`SessionManager`] owns every live session; callers hold cheap
//! `Arc` handles and the manager garbage-collects expired records on
//! access and via a sweeper.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]

pub mod manager;
pub mod session;

pub use manager::{SessionManager, SessionParams};
pub use session::{derive_session_id, Role, SecureSession, SESSION_ID_LEN};
