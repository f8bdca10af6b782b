//! Session token derivation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque token correlating ask, challenge, and evaluate calls to one
/// uploaded document.
///
/// Derived purely from the document's `upload_time` text, never issued by
/// the server. Two uploads that share a timestamp down to the second
/// yield the same token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Derives the session token from an upload timestamp.
    ///
    /// Strips every `-`, `:` and `T`, then drops the sub-second fraction:
    /// everything from the first `.` on, provided at least one character
    /// follows it. `"2024-01-15T10:30:00.123456"` becomes
    /// `"20240115103000"`.
    ///
    /// The input is not validated; a malformed timestamp yields a token
    /// that is meaningless but still usable as a key.
    pub fn from_upload_time(upload_time: &str) -> Self {
        let compact: String = upload_time
            .chars()
            .filter(|c| !matches!(c, '-' | ':' | 'T'))
            .collect();
        let token = match compact.find('.') {
            Some(idx) if idx + 1 < compact.len() => compact[..idx].to_string(),
            _ => compact,
        };
        Self(token)
    }

    /// Wraps an already-derived token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
