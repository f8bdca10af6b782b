//! Document metadata returned by the upload collaborator.

use serde::{Deserialize, Serialize};

/// Metadata for one uploaded document.
///
/// Immutable once received. `upload_time` keeps the backend's raw ISO 8601
/// text rather than a parsed timestamp; session identity is derived from
/// that exact string (see [`crate::session::SessionId`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Original filename as uploaded.
    pub filename: String,
    /// Backend-generated summary, around 150 words by backend contract.
    pub summary: String,
    /// Upload timestamp exactly as the backend sent it.
    pub upload_time: String,
}
