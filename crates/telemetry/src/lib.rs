// Path: crates/telemetry/src/lib.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # SAGE Telemetry
//!
//! Structured logging for the message-security pipeline. Library crates
//! log through the `log` facade and never install a global subscriber;
//! binaries and test harnesses call [`init::init_tracing`] once at
//! startup with their [`init::TelemetrySettings`].
//!
//! The [`span`] module carries the SAGE vocabulary: handshake, session,
//! and registry operations each get a span constructor that pins the
//! identifiers an operator greps for (`ctx`, `session_id`, `did`), so the
//! same fields appear on every event regardless of which crate emitted it.

/// The initialization routine for global structured logging.
pub mod init;
/// Span constructors for the pipeline's domain operations.
pub mod span;

pub use init::{init_tracing, TelemetrySettings};
pub use span::{handshake_span, registry_span, session_span};
