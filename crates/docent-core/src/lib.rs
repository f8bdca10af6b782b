//! Domain layer for docent, an interactive document comprehension client.
//!
//! Everything in this crate is I/O-free: immutable values received from the
//! backend, the session identity rules, the history ledger, the shared
//! grading thresholds, and the async port traits the application layer is
//! wired against. The reqwest-backed implementation of the ports lives in
//! `docent-interaction`.

pub mod challenge;
pub mod document;
pub mod error;
pub mod grade;
pub mod message;
pub mod ports;
pub mod session;

// Re-export common error type
pub use error::{BackendError, BackendResult};
