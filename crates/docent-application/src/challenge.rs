//! Challenge quiz engine.
//!
//! Drives one quiz attempt per document session through a linear phase
//! machine: questions are generated once, answered strictly in order, and
//! each answer is graded before the next question opens. `Completed` is
//! terminal; only [`ChallengeEngine::reset`] starts a fresh attempt.

use std::sync::Arc;

use docent_core::challenge::{ChallengeQuestion, ChallengeResult, aggregate_score};
use docent_core::ports::ChallengeService;
use docent_core::session::SessionId;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Shown when a question fetch fails without a backend detail message.
const GENERATE_FALLBACK_ERROR: &str = "Failed to generate questions";
/// Shown when grading fails without a backend detail message.
const EVALUATE_FALLBACK_ERROR: &str = "Failed to evaluate answer";

/// Where a quiz attempt currently stands.
///
/// `Answering` and `Evaluating` carry the zero-based index of the question
/// being worked on; the index always points inside the question list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengePhase {
    /// No questions yet, or the last attempt was discarded.
    Idle,
    /// A question fetch is in flight.
    Generating,
    /// Waiting for the user's answer to question `index`.
    Answering { index: usize },
    /// Grading of question `index` is in flight.
    Evaluating { index: usize },
    /// Every question has been graded.
    Completed,
}

/// What a call to the engine did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeOutcome {
    /// The phase machine moved forward.
    Advanced,
    /// The call was invalid in the current phase and changed nothing.
    Rejected,
    /// The backend call failed; the error is readable via [`ChallengeEngine::error`].
    Failed,
    /// A reset happened while the call was in flight; its result was dropped.
    Superseded,
}

struct ChallengeState {
    phase: ChallengePhase,
    questions: Vec<ChallengeQuestion>,
    results: Vec<ChallengeResult>,
    error: Option<String>,
    preserved_answer: Option<String>,
    generation: u64,
}

impl Default for ChallengeState {
    fn default() -> Self {
        Self {
            phase: ChallengePhase::Idle,
            questions: Vec::new(),
            results: Vec::new(),
            error: None,
            preserved_answer: None,
            generation: 0,
        }
    }
}

/// Quiz state for one document session.
///
/// All mutation goes through `&self`; the engine is shared behind an `Arc`
/// and callers from different tasks see one consistent attempt. A reset
/// bumps an internal generation counter so that a fetch or grading call
/// still in flight cannot write into the new attempt.
pub struct ChallengeEngine {
    session_id: SessionId,
    challenge_service: Arc<dyn ChallengeService>,
    state: RwLock<ChallengeState>,
}

impl ChallengeEngine {
    pub fn new(session_id: SessionId, challenge_service: Arc<dyn ChallengeService>) -> Self {
        Self {
            session_id,
            challenge_service,
            state: RwLock::new(ChallengeState::default()),
        }
    }

    /// Fetches a question set and opens the first question.
    ///
    /// Only valid while `Idle`; any other phase rejects the call so an
    /// attempt in progress is never clobbered. On failure the engine
    /// returns to `Idle` with the error set, ready for a retry.
    pub async fn generate(&self) -> ChallengeOutcome {
        let generation = {
            let mut state = self.state.write().await;
            if state.phase != ChallengePhase::Idle {
                debug!(
                    "[ChallengeEngine] generate ignored in phase {:?}",
                    state.phase
                );
                return ChallengeOutcome::Rejected;
            }
            state.phase = ChallengePhase::Generating;
            state.questions.clear();
            state.results.clear();
            state.error = None;
            state.preserved_answer = None;
            state.generation
        };

        let fetched = self
            .challenge_service
            .generate_questions(&self.session_id)
            .await;

        let mut state = self.state.write().await;
        if state.generation != generation {
            debug!("[ChallengeEngine] dropped stale question set");
            return ChallengeOutcome::Superseded;
        }
        match fetched {
            Ok(questions) if questions.is_empty() => {
                debug!("[ChallengeEngine] backend returned no questions");
                state.phase = ChallengePhase::Idle;
                ChallengeOutcome::Advanced
            }
            Ok(questions) => {
                info!(
                    "[ChallengeEngine] generated {} questions for session {}",
                    questions.len(),
                    self.session_id
                );
                state.questions = questions;
                state.phase = ChallengePhase::Answering { index: 0 };
                ChallengeOutcome::Advanced
            }
            Err(err) => {
                state.error = Some(err.detail_or(GENERATE_FALLBACK_ERROR));
                state.phase = ChallengePhase::Idle;
                ChallengeOutcome::Failed
            }
        }
    }

    /// Grades `answer` against the current question.
    ///
    /// Empty or whitespace-only answers are rejected without touching
    /// state. On a grading failure the engine stays on the same question
    /// and keeps the submitted text in [`ChallengeEngine::preserved_answer`]
    /// so the user can retry without retyping it.
    pub async fn submit(&self, answer: &str) -> ChallengeOutcome {
        let answer = answer.trim();
        if answer.is_empty() {
            return ChallengeOutcome::Rejected;
        }

        let (generation, index, question) = {
            let mut state = self.state.write().await;
            let ChallengePhase::Answering { index } = state.phase else {
                debug!(
                    "[ChallengeEngine] submit ignored in phase {:?}",
                    state.phase
                );
                return ChallengeOutcome::Rejected;
            };
            let Some(question) = state.questions.get(index).cloned() else {
                return ChallengeOutcome::Rejected;
            };
            state.phase = ChallengePhase::Evaluating { index };
            state.error = None;
            (state.generation, index, question)
        };

        let evaluated = self
            .challenge_service
            .evaluate_answer(&question.question, answer, &self.session_id)
            .await;

        let mut state = self.state.write().await;
        if state.generation != generation {
            debug!("[ChallengeEngine] dropped stale evaluation");
            return ChallengeOutcome::Superseded;
        }
        match evaluated {
            Ok(evaluation) => {
                state.results.push(ChallengeResult {
                    question: question.question,
                    user_answer: answer.to_string(),
                    difficulty: question.difficulty,
                    evaluation,
                });
                state.preserved_answer = None;
                let next = index + 1;
                if next < state.questions.len() {
                    state.phase = ChallengePhase::Answering { index: next };
                } else {
                    info!(
                        "[ChallengeEngine] challenge completed for session {}",
                        self.session_id
                    );
                    state.phase = ChallengePhase::Completed;
                }
                ChallengeOutcome::Advanced
            }
            Err(err) => {
                state.error = Some(err.detail_or(EVALUATE_FALLBACK_ERROR));
                state.preserved_answer = Some(answer.to_string());
                state.phase = ChallengePhase::Answering { index };
                ChallengeOutcome::Failed
            }
        }
    }

    /// Discards the current attempt and starts a new one.
    ///
    /// Any fetch or grading call still in flight is invalidated before the
    /// new question set is requested.
    pub async fn reset(&self) -> ChallengeOutcome {
        {
            let mut state = self.state.write().await;
            state.generation += 1;
            state.phase = ChallengePhase::Idle;
            state.questions.clear();
            state.results.clear();
            state.error = None;
            state.preserved_answer = None;
        }
        info!(
            "[ChallengeEngine] restarting challenge for session {}",
            self.session_id
        );
        self.generate().await
    }

    pub async fn phase(&self) -> ChallengePhase {
        self.state.read().await.phase
    }

    pub async fn questions(&self) -> Vec<ChallengeQuestion> {
        self.state.read().await.questions.clone()
    }

    pub async fn results(&self) -> Vec<ChallengeResult> {
        self.state.read().await.results.clone()
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    /// Answer text kept from a submission whose grading failed.
    pub async fn preserved_answer(&self) -> Option<String> {
        self.state.read().await.preserved_answer.clone()
    }

    /// Mean score over the graded answers so far; `0.0` before any grading.
    pub async fn aggregate_score(&self) -> f32 {
        aggregate_score(&self.state.read().await.results)
    }

    /// The question currently being answered or graded, with its index.
    pub async fn current_question(&self) -> Option<(usize, ChallengeQuestion)> {
        let state = self.state.read().await;
        let index = match state.phase {
            ChallengePhase::Answering { index } | ChallengePhase::Evaluating { index } => index,
            _ => return None,
        };
        state
            .questions
            .get(index)
            .cloned()
            .map(|question| (index, question))
    }

    /// `(graded, total)` question counts for progress display.
    pub async fn progress(&self) -> (usize, usize) {
        let state = self.state.read().await;
        (state.results.len(), state.questions.len())
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }
}

#[cfg(test)]
#[path = "challenge_test.rs"]
mod tests;
