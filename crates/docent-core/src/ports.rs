//! Collaborator boundaries for the document comprehension backend.
//!
//! The application layer depends only on these traits. The reqwest-backed
//! client in `docent-interaction` is the production implementation; tests
//! substitute in-memory mocks.

use crate::challenge::{ChallengeQuestion, Evaluation};
use crate::document::Document;
use crate::error::BackendResult;
use crate::message::Message;
use crate::session::SessionId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Payload of a successful ask call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub answer: String,
    pub justification: String,
    pub highlighted_text: String,
    /// Reliability in `[0, 1]`, bucketed for display only.
    pub confidence: f32,
}

impl From<QueryAnswer> for Message {
    /// Builds the assistant message for a received answer, stamped with the
    /// current time.
    fn from(answer: QueryAnswer) -> Self {
        Self::Assistant {
            content: answer.answer,
            justification: answer.justification,
            highlighted_text: answer.highlighted_text,
            confidence: answer.confidence,
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Accepts one document and returns its metadata and summary.
///
/// The backend enforces type and size limits; callers may pre-filter on
/// extension but must not rely on it.
#[async_trait]
pub trait UploadService: Send + Sync {
    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> BackendResult<Document>;
}

/// Answers free-form questions grounded in one session's document.
#[async_trait]
pub trait QueryService: Send + Sync {
    async fn ask(&self, question: &str, session_id: &SessionId) -> BackendResult<QueryAnswer>;
}

/// Generates and grades challenge questions for one session.
#[async_trait]
pub trait ChallengeService: Send + Sync {
    async fn generate_questions(
        &self,
        session_id: &SessionId,
    ) -> BackendResult<Vec<ChallengeQuestion>>;

    async fn evaluate_answer(
        &self,
        question: &str,
        user_answer: &str,
        session_id: &SessionId,
    ) -> BackendResult<Evaluation>;
}
