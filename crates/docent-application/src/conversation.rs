//! Ask Anything conversation flow for one session.

use docent_core::message::Message;
use docent_core::ports::QueryService;
use docent_core::session::SessionId;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

const ASK_FALLBACK_ERROR: &str = "Failed to get answer";

/// Outcome of a [`ConversationEngine::ask`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AskOutcome {
    /// The round trip completed; a user and an assistant message were
    /// appended.
    Answered,
    /// The input was empty or another ask was in flight; nothing changed.
    Rejected,
    /// The backend call failed; the optimistic user message was rolled
    /// back and the error message was set.
    Failed,
    /// The conversation was cleared while the call was outstanding; the
    /// completion was dropped.
    Superseded,
}

struct ConversationState {
    messages: Vec<Message>,
    error: Option<String>,
    /// Bumped by `clear` so an outstanding ask can detect staleness.
    generation: u64,
}

/// Conversation state and ask flow for one session.
///
/// Methods take `&self`; state lives behind a lock so the engine can be
/// shared as an `Arc` between the REPL loop and background tasks. One ask
/// is in flight at a time; overlapping calls are rejected, not queued.
pub struct ConversationEngine {
    session_id: SessionId,
    query_service: Arc<dyn QueryService>,
    state: RwLock<ConversationState>,
    in_flight: AtomicBool,
}

impl ConversationEngine {
    /// Creates an empty conversation bound to `session_id`.
    pub fn new(session_id: SessionId, query_service: Arc<dyn QueryService>) -> Self {
        Self {
            session_id,
            query_service,
            state: RwLock::new(ConversationState {
                messages: Vec::new(),
                error: None,
                generation: 0,
            }),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Sends `question` to the backend and appends the exchange.
    ///
    /// The user message is appended before the call so the question is
    /// visible during the round trip. A failed call removes it again and
    /// stores the error instead; the log never keeps an unanswered
    /// question. Empty input and overlapping calls are rejected without
    /// touching state.
    pub async fn ask(&self, question: &str) -> AskOutcome {
        let question = question.trim();
        if question.is_empty() {
            return AskOutcome::Rejected;
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!(
                "[ConversationEngine] ask rejected, a request is already in flight for session {}",
                self.session_id
            );
            return AskOutcome::Rejected;
        }

        let generation = {
            let mut state = self.state.write().await;
            state.error = None;
            state.messages.push(Message::user(question));
            state.generation
        };

        let result = self.query_service.ask(question, &self.session_id).await;

        let outcome = {
            let mut state = self.state.write().await;
            if state.generation != generation {
                // A clear ran while the call was outstanding; the optimistic
                // message is already gone, so the completion is dropped whole.
                tracing::debug!(
                    "[ConversationEngine] dropped stale completion for session {}",
                    self.session_id
                );
                AskOutcome::Superseded
            } else {
                match result {
                    Ok(answer) => {
                        state.messages.push(answer.into());
                        AskOutcome::Answered
                    }
                    Err(err) => {
                        state.messages.pop();
                        state.error = Some(err.detail_or(ASK_FALLBACK_ERROR));
                        AskOutcome::Failed
                    }
                }
            }
        };

        self.in_flight.store(false, Ordering::SeqCst);
        outcome
    }

    /// Empties the conversation and error and marks any outstanding ask
    /// stale. The network call itself is not aborted.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.generation += 1;
        state.messages.clear();
        state.error = None;
        tracing::info!(
            "[ConversationEngine] cleared conversation for session {}",
            self.session_id
        );
    }

    /// Snapshot of the messages, oldest first.
    pub async fn messages(&self) -> Vec<Message> {
        self.state.read().await.messages.clone()
    }

    /// The current error message, set by the last failed ask.
    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    /// `true` while an ask is outstanding.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }
}

#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;
