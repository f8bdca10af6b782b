//! Error types for backend collaborator calls.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a call to the document comprehension backend.
///
/// The engines never propagate these upward; each engine turns the error
/// into its single user-visible message via [`BackendError::detail_or`] and
/// keeps running.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum BackendError {
    /// The backend answered with an error payload carrying a human-readable
    /// detail string. The detail is shown to the user verbatim.
    #[error("{detail}")]
    Rejected { detail: String },

    /// The call produced no usable response: connect failure, timeout, or a
    /// body that failed to decode.
    #[error("transport failure: {message}")]
    Transport { message: String },
}

impl BackendError {
    /// Creates a Rejected error from a backend detail string.
    pub fn rejected(detail: impl Into<String>) -> Self {
        Self::Rejected {
            detail: detail.into(),
        }
    }

    /// Creates a Transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Check if the backend itself rejected the request.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// The backend-supplied detail string, when one is present.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Rejected { detail } => Some(detail),
            Self::Transport { .. } => None,
        }
    }

    /// The message to surface to the user: the backend detail verbatim when
    /// present, otherwise the caller's operation-specific fallback.
    pub fn detail_or(&self, fallback: &str) -> String {
        match self.detail() {
            Some(detail) => detail.to_string(),
            None => fallback.to_string(),
        }
    }
}

/// A type alias for `Result<T, BackendError>`.
pub type BackendResult<T> = std::result::Result<T, BackendError>;
