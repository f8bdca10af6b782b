//! End-to-end flows over the workbench with a scripted backend.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use docent_application::{
    AskOutcome, ChallengeEngine, ChallengeOutcome, ChallengePhase, View, Workbench,
};
use docent_core::BackendResult;
use docent_core::challenge::{ChallengeQuestion, Difficulty, Evaluation};
use docent_core::document::Document;
use docent_core::ports::{ChallengeService, QueryAnswer, QueryService, UploadService};
use docent_core::session::SessionId;

// One backend standing in for all three service ports, the way the real
// HTTP client does. Upload times and grades are scripted per call.
struct ScriptedBackend {
    upload_times: Mutex<VecDeque<&'static str>>,
    evaluations: Mutex<VecDeque<Evaluation>>,
}

impl ScriptedBackend {
    fn new(upload_times: Vec<&'static str>, scores: Vec<f32>) -> Self {
        Self {
            upload_times: Mutex::new(upload_times.into()),
            evaluations: Mutex::new(
                scores
                    .into_iter()
                    .map(|score| Evaluation {
                        score,
                        feedback: "Covers the main point.".to_string(),
                    })
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl UploadService for ScriptedBackend {
    async fn upload(&self, filename: &str, _bytes: Vec<u8>) -> BackendResult<Document> {
        let upload_time = self
            .upload_times
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or("2024-01-15T10:30:00.123456");
        Ok(Document {
            filename: filename.to_string(),
            summary: "A short study of retrieval models.".to_string(),
            upload_time: upload_time.to_string(),
        })
    }
}

#[async_trait]
impl QueryService for ScriptedBackend {
    async fn ask(&self, question: &str, _session_id: &SessionId) -> BackendResult<QueryAnswer> {
        Ok(QueryAnswer {
            answer: format!("Answer to: {}", question),
            justification: "Stated in section 2.".to_string(),
            highlighted_text: "the three models are compared".to_string(),
            confidence: 0.85,
        })
    }
}

#[async_trait]
impl ChallengeService for ScriptedBackend {
    async fn generate_questions(
        &self,
        _session_id: &SessionId,
    ) -> BackendResult<Vec<ChallengeQuestion>> {
        Ok(vec![
            ChallengeQuestion {
                question: "What is compared in the study?".to_string(),
                difficulty: Difficulty::Easy,
            },
            ChallengeQuestion {
                question: "Why is the comparison meaningful?".to_string(),
                difficulty: Difficulty::Hard,
            },
        ])
    }

    async fn evaluate_answer(
        &self,
        _question: &str,
        _user_answer: &str,
        _session_id: &SessionId,
    ) -> BackendResult<Evaluation> {
        Ok(self
            .evaluations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Evaluation {
                score: 0.8,
                feedback: "ok".to_string(),
            }))
    }
}

// Question generation is kicked off in the background when a session opens;
// poll until the engine lands in the expected phase.
async fn wait_for_phase(engine: &ChallengeEngine, expected: ChallengePhase) {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if engine.phase().await == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("Timed out waiting for challenge phase");
}

#[tokio::test]
async fn test_document_flow_through_completion() {
    let backend = Arc::new(ScriptedBackend::new(
        vec!["2024-01-15T10:30:00.123456"],
        vec![0.9, 0.5],
    ));
    let workbench = Workbench::new(backend.clone(), backend.clone());

    let document = backend
        .upload("paper.pdf", b"%PDF-1.4 stub".to_vec())
        .await
        .expect("Upload should succeed");
    let session_id = workbench.document_uploaded(document).await;
    assert_eq!(session_id.as_str(), "20240115103000");

    let session = workbench
        .active_session()
        .await
        .expect("Upload should open a session");

    assert_eq!(
        session.conversation().ask("What is the goal?").await,
        AskOutcome::Answered
    );
    assert_eq!(
        session.conversation().ask("What are the findings?").await,
        AskOutcome::Answered
    );
    assert_eq!(session.conversation().messages().await.len(), 4);

    wait_for_phase(session.challenge(), ChallengePhase::Answering { index: 0 }).await;
    assert_eq!(session.challenge().progress().await, (0, 2));

    assert_eq!(
        session.challenge().submit("The retrieval models.").await,
        ChallengeOutcome::Advanced
    );
    assert_eq!(
        session.challenge().submit("It guides model choice.").await,
        ChallengeOutcome::Advanced
    );

    assert_eq!(session.challenge().phase().await, ChallengePhase::Completed);
    let aggregate = session.challenge().aggregate_score().await;
    assert!((aggregate - 0.7).abs() < 1e-6);
}

#[tokio::test]
async fn test_history_switching_keeps_engine_state() {
    let backend = Arc::new(ScriptedBackend::new(
        vec!["2024-01-15T10:30:00.123456", "2024-01-15T11:00:00.000001"],
        vec![],
    ));
    let workbench = Workbench::new(backend.clone(), backend.clone());

    let first_doc = backend
        .upload("a.pdf", b"a".to_vec())
        .await
        .expect("Upload should succeed");
    let first = workbench.document_uploaded(first_doc).await;
    let session = workbench.active_session().await.unwrap();
    session.conversation().ask("What is chapter one about?").await;
    assert_eq!(session.conversation().messages().await.len(), 2);

    let second_doc = backend
        .upload("b.pdf", b"b".to_vec())
        .await
        .expect("Upload should succeed");
    let second = workbench.document_uploaded(second_doc).await;
    assert_ne!(first, second);
    assert_eq!(workbench.history_entries().await.len(), 2);

    workbench.select(&first).await.expect("Select should work");
    let restored = workbench.active_session().await.unwrap();
    assert_eq!(
        restored.conversation().messages().await.len(),
        2,
        "Parked conversation should survive the switch"
    );

    workbench.remove(&first).await;
    assert_eq!(workbench.view().await, View::Upload);
    assert!(workbench.session(&first).await.is_none());
    assert_eq!(workbench.history_entries().await.len(), 1);

    workbench.select(&second).await.expect("Select should work");
    match workbench.view().await {
        View::Analysis(selection) => assert_eq!(selection.document.filename, "b.pdf"),
        View::Upload => panic!("Should be back on the analysis view"),
    }
}
