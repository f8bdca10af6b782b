//! Session identity and the ledger of opened documents.
//!
//! # Module Structure
//!
//! - `id`: Session token derivation from upload timestamps (`SessionId`)
//! - `history`: Ledger of opened documents and the active selection
//!   (`DocumentHistory`, `HistoryEntry`, `ActiveSelection`)

mod history;
mod id;

// Re-export public API
pub use history::{ActiveSelection, DocumentHistory, HistoryEntry};
pub use id::SessionId;
