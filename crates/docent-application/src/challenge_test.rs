use super::*;
use async_trait::async_trait;
use docent_core::challenge::{Difficulty, Evaluation};
use docent_core::error::{BackendError, BackendResult};
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::Notify;

fn sid() -> SessionId {
    SessionId::new("20240115103000")
}

fn question(text: &str, difficulty: Difficulty) -> ChallengeQuestion {
    ChallengeQuestion {
        question: text.to_string(),
        difficulty,
    }
}

fn questions3() -> Vec<ChallengeQuestion> {
    vec![
        question("What problem does the paper address?", Difficulty::Easy),
        question("Summarize the evaluation setup.", Difficulty::Medium),
        question("Which limitation is left unaddressed?", Difficulty::Hard),
    ]
}

fn evaluation(score: f32) -> Evaluation {
    Evaluation {
        score,
        feedback: "Covers the key points.".to_string(),
    }
}

// Mock ChallengeService popping scripted responses; falls back to a fixed
// three-question set and a 0.8 grade once a script runs out.
struct MockChallengeService {
    question_sets: Mutex<VecDeque<BackendResult<Vec<ChallengeQuestion>>>>,
    evaluations: Mutex<VecDeque<BackendResult<Evaluation>>>,
}

impl MockChallengeService {
    fn new(
        question_sets: Vec<BackendResult<Vec<ChallengeQuestion>>>,
        evaluations: Vec<BackendResult<Evaluation>>,
    ) -> Self {
        Self {
            question_sets: Mutex::new(question_sets.into()),
            evaluations: Mutex::new(evaluations.into()),
        }
    }
}

#[async_trait]
impl ChallengeService for MockChallengeService {
    async fn generate_questions(
        &self,
        _session_id: &SessionId,
    ) -> BackendResult<Vec<ChallengeQuestion>> {
        self.question_sets
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(questions3()))
    }

    async fn evaluate_answer(
        &self,
        _question: &str,
        _user_answer: &str,
        _session_id: &SessionId,
    ) -> BackendResult<Evaluation> {
        self.evaluations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(evaluation(0.8)))
    }
}

// ChallengeService whose question fetch blocks until the test releases it.
struct GatedGenerateService {
    entered: Notify,
    release: Notify,
}

impl GatedGenerateService {
    fn new() -> Self {
        Self {
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl ChallengeService for GatedGenerateService {
    async fn generate_questions(
        &self,
        _session_id: &SessionId,
    ) -> BackendResult<Vec<ChallengeQuestion>> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(questions3())
    }

    async fn evaluate_answer(
        &self,
        _question: &str,
        _user_answer: &str,
        _session_id: &SessionId,
    ) -> BackendResult<Evaluation> {
        Ok(evaluation(0.8))
    }
}

// ChallengeService whose grading call blocks until the test releases it.
struct GatedEvaluateService {
    entered: Notify,
    release: Notify,
}

impl GatedEvaluateService {
    fn new() -> Self {
        Self {
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl ChallengeService for GatedEvaluateService {
    async fn generate_questions(
        &self,
        _session_id: &SessionId,
    ) -> BackendResult<Vec<ChallengeQuestion>> {
        Ok(questions3())
    }

    async fn evaluate_answer(
        &self,
        _question: &str,
        _user_answer: &str,
        _session_id: &SessionId,
    ) -> BackendResult<Evaluation> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(evaluation(0.5))
    }
}

#[tokio::test]
async fn test_generate_opens_the_first_question() {
    let engine = ChallengeEngine::new(sid(), Arc::new(MockChallengeService::new(vec![], vec![])));

    let outcome = engine.generate().await;

    assert_eq!(outcome, ChallengeOutcome::Advanced);
    assert_eq!(engine.phase().await, ChallengePhase::Answering { index: 0 });
    assert_eq!(engine.questions().await.len(), 3);
    assert_eq!(engine.progress().await, (0, 3));

    let (index, current) = engine.current_question().await.unwrap();
    assert_eq!(index, 0);
    assert_eq!(current.question, "What problem does the paper address?");
    assert_eq!(current.difficulty, Difficulty::Easy);
}

#[tokio::test]
async fn test_generate_failure_returns_to_idle_with_error() {
    let service = MockChallengeService::new(
        vec![Err(BackendError::transport("connect timed out"))],
        vec![],
    );
    let engine = ChallengeEngine::new(sid(), Arc::new(service));

    let outcome = engine.generate().await;

    assert_eq!(outcome, ChallengeOutcome::Failed);
    assert_eq!(engine.phase().await, ChallengePhase::Idle);
    assert_eq!(
        engine.error().await,
        Some("Failed to generate questions".to_string())
    );

    // Idle again, so a manual retry goes through and clears the error.
    assert_eq!(engine.generate().await, ChallengeOutcome::Advanced);
    assert_eq!(engine.error().await, None);
    assert_eq!(engine.phase().await, ChallengePhase::Answering { index: 0 });
}

#[tokio::test]
async fn test_generate_with_empty_set_stays_idle() {
    let service = MockChallengeService::new(vec![Ok(vec![])], vec![]);
    let engine = ChallengeEngine::new(sid(), Arc::new(service));

    let outcome = engine.generate().await;

    assert_eq!(outcome, ChallengeOutcome::Advanced);
    assert_eq!(engine.phase().await, ChallengePhase::Idle);
    assert!(engine.questions().await.is_empty());
    assert_eq!(engine.error().await, None);
}

#[tokio::test]
async fn test_generate_is_rejected_unless_idle() {
    let engine = ChallengeEngine::new(sid(), Arc::new(MockChallengeService::new(vec![], vec![])));

    engine.generate().await;
    assert_eq!(
        engine.generate().await,
        ChallengeOutcome::Rejected,
        "Should not clobber an attempt in progress"
    );
    assert_eq!(engine.phase().await, ChallengePhase::Answering { index: 0 });

    for answer in ["a", "b", "c"] {
        engine.submit(answer).await;
    }
    assert_eq!(engine.phase().await, ChallengePhase::Completed);
    assert_eq!(
        engine.generate().await,
        ChallengeOutcome::Rejected,
        "Completed is terminal without an explicit reset"
    );
}

#[tokio::test]
async fn test_submit_rejects_empty_answer() {
    let engine = ChallengeEngine::new(sid(), Arc::new(MockChallengeService::new(vec![], vec![])));
    engine.generate().await;

    assert_eq!(engine.submit("").await, ChallengeOutcome::Rejected);
    assert_eq!(engine.submit("   \t").await, ChallengeOutcome::Rejected);

    assert_eq!(engine.phase().await, ChallengePhase::Answering { index: 0 });
    assert!(engine.results().await.is_empty());
    assert_eq!(engine.preserved_answer().await, None);
}

#[tokio::test]
async fn test_submit_advances_through_all_questions() {
    let service = MockChallengeService::new(
        vec![],
        vec![
            Ok(evaluation(0.9)),
            Ok(evaluation(0.5)),
            Ok(evaluation(0.7)),
        ],
    );
    let engine = ChallengeEngine::new(sid(), Arc::new(service));
    engine.generate().await;

    assert_eq!(engine.submit("first").await, ChallengeOutcome::Advanced);
    assert_eq!(engine.phase().await, ChallengePhase::Answering { index: 1 });
    assert_eq!(engine.progress().await, (1, 3));

    assert_eq!(engine.submit("second").await, ChallengeOutcome::Advanced);
    assert_eq!(engine.phase().await, ChallengePhase::Answering { index: 2 });

    assert_eq!(engine.submit("third").await, ChallengeOutcome::Advanced);
    assert_eq!(engine.phase().await, ChallengePhase::Completed);
    assert_eq!(engine.progress().await, (3, 3));

    let results = engine.results().await;
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].question, "What problem does the paper address?");
    assert_eq!(results[0].user_answer, "first");
    assert_eq!(results[0].difficulty, Difficulty::Easy);
    assert!((results[0].evaluation.score - 0.9).abs() < 1e-6);
    assert_eq!(results[2].difficulty, Difficulty::Hard);
}

#[tokio::test]
async fn test_submit_after_completion_has_no_effect() {
    let engine = ChallengeEngine::new(sid(), Arc::new(MockChallengeService::new(vec![], vec![])));
    engine.generate().await;
    for answer in ["a", "b", "c"] {
        engine.submit(answer).await;
    }
    assert_eq!(engine.phase().await, ChallengePhase::Completed);

    assert_eq!(engine.submit("extra").await, ChallengeOutcome::Rejected);
    assert_eq!(engine.results().await.len(), 3);
    assert_eq!(engine.phase().await, ChallengePhase::Completed);
}

#[tokio::test]
async fn test_failed_evaluation_preserves_answer_and_position() {
    let service = MockChallengeService::new(
        vec![],
        vec![
            Err(BackendError::rejected("Grader offline")),
            Err(BackendError::transport("boom")),
            Ok(evaluation(0.9)),
        ],
    );
    let engine = ChallengeEngine::new(sid(), Arc::new(service));
    engine.generate().await;

    let outcome = engine.submit("my first answer").await;
    assert_eq!(outcome, ChallengeOutcome::Failed);
    assert_eq!(engine.phase().await, ChallengePhase::Answering { index: 0 });
    assert_eq!(
        engine.preserved_answer().await,
        Some("my first answer".to_string()),
        "Failed grading should keep the typed answer for retry"
    );
    assert_eq!(engine.error().await, Some("Grader offline".to_string()));
    assert!(engine.results().await.is_empty());

    // Transport failure falls back to the generic message.
    assert_eq!(
        engine.submit("my first answer").await,
        ChallengeOutcome::Failed
    );
    assert_eq!(
        engine.error().await,
        Some("Failed to evaluate answer".to_string())
    );

    // A successful retry clears both the error and the preserved answer.
    assert_eq!(
        engine.submit("my first answer").await,
        ChallengeOutcome::Advanced
    );
    assert_eq!(engine.phase().await, ChallengePhase::Answering { index: 1 });
    assert_eq!(engine.preserved_answer().await, None);
    assert_eq!(engine.error().await, None);
    assert_eq!(engine.results().await.len(), 1);
}

#[tokio::test]
async fn test_submit_is_rejected_while_generating() {
    let service = Arc::new(GatedGenerateService::new());
    let engine = Arc::new(ChallengeEngine::new(sid(), service.clone()));

    let pending = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.generate().await })
    };
    service.entered.notified().await;

    assert_eq!(engine.phase().await, ChallengePhase::Generating);
    assert_eq!(engine.submit("too early").await, ChallengeOutcome::Rejected);

    service.release.notify_one();
    assert_eq!(pending.await.unwrap(), ChallengeOutcome::Advanced);
    assert_eq!(engine.phase().await, ChallengePhase::Answering { index: 0 });
}

#[tokio::test]
async fn test_reset_discards_results_and_regenerates() {
    let engine = ChallengeEngine::new(sid(), Arc::new(MockChallengeService::new(vec![], vec![])));
    engine.generate().await;
    engine.submit("first").await;
    assert_eq!(engine.results().await.len(), 1);

    let outcome = engine.reset().await;

    assert_eq!(outcome, ChallengeOutcome::Advanced);
    assert_eq!(engine.phase().await, ChallengePhase::Answering { index: 0 });
    assert!(engine.results().await.is_empty());
    assert_eq!(engine.progress().await, (0, 3));
    assert_eq!(engine.preserved_answer().await, None);
}

#[tokio::test]
async fn test_reset_drops_stale_evaluation() {
    let service = Arc::new(GatedEvaluateService::new());
    let engine = Arc::new(ChallengeEngine::new(sid(), service.clone()));
    engine.generate().await;

    let pending = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.submit("will become stale").await })
    };
    service.entered.notified().await;

    assert_eq!(engine.reset().await, ChallengeOutcome::Advanced);
    service.release.notify_one();

    assert_eq!(pending.await.unwrap(), ChallengeOutcome::Superseded);
    assert!(
        engine.results().await.is_empty(),
        "A stale grade must not land in the fresh attempt"
    );
    assert_eq!(engine.phase().await, ChallengePhase::Answering { index: 0 });
    assert_eq!(engine.error().await, None);
}

#[tokio::test]
async fn test_aggregate_score_follows_graded_answers() {
    let service = MockChallengeService::new(
        vec![Ok(vec![
            question("Q1", Difficulty::Easy),
            question("Q2", Difficulty::Hard),
        ])],
        vec![Ok(evaluation(0.9)), Ok(evaluation(0.5))],
    );
    let engine = ChallengeEngine::new(sid(), Arc::new(service));
    engine.generate().await;

    assert_eq!(engine.aggregate_score().await, 0.0);

    engine.submit("a1").await;
    engine.submit("a2").await;

    assert_eq!(engine.phase().await, ChallengePhase::Completed);
    let aggregate = engine.aggregate_score().await;
    assert!((aggregate - 0.7).abs() < 1e-6);
}
