//! Conversation message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single message in an Ask Anything conversation.
///
/// The two arms carry different payloads: the assistant arm keeps the
/// grounding fields the backend returns next to the answer itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    /// Question typed by the user.
    User {
        content: String,
        timestamp: DateTime<Utc>,
    },
    /// Answer returned by the backend.
    Assistant {
        content: String,
        /// The backend's reasoning for the answer.
        justification: String,
        /// Supporting excerpt quoted from the document.
        highlighted_text: String,
        /// Reliability of the answer in `[0, 1]`.
        confidence: f32,
        timestamp: DateTime<Utc>,
    },
}

impl Message {
    /// Creates a user message stamped with the current time.
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// `true` for the user arm.
    pub fn is_user(&self) -> bool {
        matches!(self, Self::User { .. })
    }

    /// `true` for the assistant arm.
    pub fn is_assistant(&self) -> bool {
        matches!(self, Self::Assistant { .. })
    }

    /// The display body of either arm.
    pub fn content(&self) -> &str {
        match self {
            Self::User { content, .. } | Self::Assistant { content, .. } => content,
        }
    }

    /// When the message was appended.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::User { timestamp, .. } | Self::Assistant { timestamp, .. } => *timestamp,
        }
    }
}
