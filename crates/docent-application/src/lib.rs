//! Application layer for docent.
//!
//! This crate holds the per-session interaction engines and the workbench
//! that coordinates them. Everything talks to the backend through the port
//! traits in `docent-core`, so the layer is fully testable with in-memory
//! mocks.

pub mod challenge;
pub mod conversation;
pub mod workbench;

pub use challenge::{ChallengeEngine, ChallengeOutcome, ChallengePhase};
pub use conversation::{AskOutcome, ConversationEngine};
pub use workbench::{DocumentSession, View, Workbench};
