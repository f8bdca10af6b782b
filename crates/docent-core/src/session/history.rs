//! Ledger of previously opened documents.

use super::SessionId;
use crate::document::Document;
use serde::{Deserialize, Serialize};

/// One previously opened document and its session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub document: Document,
    pub session_id: SessionId,
}

/// The document/session pair currently shown in the analysis view.
///
/// Held as an `Option` by the owner: `None` means no document is loaded and
/// the upload view is shown. Whenever present, `session_id` matches a live
/// ledger entry; removing that entry must clear the selection too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSelection {
    pub document: Document,
    pub session_id: SessionId,
}

impl From<HistoryEntry> for ActiveSelection {
    fn from(entry: HistoryEntry) -> Self {
        Self {
            document: entry.document,
            session_id: entry.session_id,
        }
    }
}

/// Ordered record of opened documents, newest first, unique by session id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentHistory {
    entries: Vec<HistoryEntry>,
}

impl DocumentHistory {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or moves the entry for `session_id` to the front.
    ///
    /// Any prior entry with the same session id is removed first, so one
    /// session never appears twice and the order stays most-recently-opened.
    pub fn record(&mut self, document: Document, session_id: SessionId) {
        self.entries.retain(|entry| entry.session_id != session_id);
        self.entries.insert(
            0,
            HistoryEntry {
                document,
                session_id,
            },
        );
    }

    /// Removes the entry for `session_id`; silently does nothing when the
    /// id is unknown.
    pub fn remove(&mut self, session_id: &SessionId) {
        self.entries.retain(|entry| entry.session_id != *session_id);
    }

    /// Looks up an entry without touching the order.
    pub fn select(&self, session_id: &SessionId) -> Option<&HistoryEntry> {
        self.entries
            .iter()
            .find(|entry| entry.session_id == *session_id)
    }

    /// Check if the ledger holds an entry for `session_id`.
    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.select(session_id).is_some()
    }

    /// Entries, newest first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
