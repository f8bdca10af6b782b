//! reqwest client for the document comprehension backend.

use async_trait::async_trait;
use docent_core::challenge::{ChallengeQuestion, Evaluation};
use docent_core::document::Document;
use docent_core::error::{BackendError, BackendResult};
use docent_core::ports::{ChallengeService, QueryAnswer, QueryService, UploadService};
use docent_core::session::SessionId;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::BackendConfig;

#[derive(Debug, Serialize)]
struct AskRequest<'a> {
    question: &'a str,
    session_id: &'a str,
}

#[derive(Debug, Serialize)]
struct ChallengeRequest<'a> {
    session_id: &'a str,
}

#[derive(Debug, Serialize)]
struct EvaluateRequest<'a> {
    question: &'a str,
    user_answer: &'a str,
    session_id: &'a str,
}

/// `POST /challenge` wraps its question list in an object.
#[derive(Debug, Deserialize)]
struct ChallengeResponse {
    questions: Vec<ChallengeQuestion>,
}

/// Error payload the backend sends with non-2xx statuses: `{"detail": "..."}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

/// HTTP implementation of all backend service ports.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    config: BackendConfig,
}

impl BackendClient {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Client configured from the environment.
    pub fn from_env() -> Self {
        Self::new(BackendConfig::from_env())
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Turns a non-2xx response into a [`BackendError`], draining the body.
    async fn error_from_response(response: reqwest::Response) -> BackendError {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        map_error_body(status, &body)
    }
}

/// A body with a JSON `detail` field is a backend-stated rejection whose
/// text is fit to show to the user; anything else is a transport failure.
fn map_error_body(status: StatusCode, body: &str) -> BackendError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => BackendError::rejected(parsed.detail),
        Err(_) => BackendError::transport(format!("HTTP {}: {}", status, body)),
    }
}

#[async_trait]
impl UploadService for BackendClient {
    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> BackendResult<Document> {
        let mime = if filename.to_lowercase().ends_with(".pdf") {
            "application/pdf"
        } else {
            "text/plain"
        };
        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime)
            .map_err(|e| BackendError::transport(format!("Invalid upload payload: {}", e)))?;
        let form = Form::new().part("file", part);

        debug!("[BackendClient] POST /upload ({})", filename);
        let response = self
            .client
            .post(self.endpoint("/upload"))
            .multipart(form)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| BackendError::transport(format!("Upload request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        response
            .json::<Document>()
            .await
            .map_err(|e| BackendError::transport(format!("Invalid upload response: {}", e)))
    }
}

#[async_trait]
impl QueryService for BackendClient {
    async fn ask(&self, question: &str, session_id: &SessionId) -> BackendResult<QueryAnswer> {
        let request = AskRequest {
            question,
            session_id: session_id.as_str(),
        };

        debug!("[BackendClient] POST /ask (session {})", session_id);
        let response = self
            .client
            .post(self.endpoint("/ask"))
            .json(&request)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| BackendError::transport(format!("Ask request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        response
            .json::<QueryAnswer>()
            .await
            .map_err(|e| BackendError::transport(format!("Invalid ask response: {}", e)))
    }
}

#[async_trait]
impl ChallengeService for BackendClient {
    async fn generate_questions(
        &self,
        session_id: &SessionId,
    ) -> BackendResult<Vec<ChallengeQuestion>> {
        let request = ChallengeRequest {
            session_id: session_id.as_str(),
        };

        debug!("[BackendClient] POST /challenge (session {})", session_id);
        let response = self
            .client
            .post(self.endpoint("/challenge"))
            .json(&request)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| BackendError::transport(format!("Challenge request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let parsed = response
            .json::<ChallengeResponse>()
            .await
            .map_err(|e| BackendError::transport(format!("Invalid challenge response: {}", e)))?;
        Ok(parsed.questions)
    }

    async fn evaluate_answer(
        &self,
        question: &str,
        user_answer: &str,
        session_id: &SessionId,
    ) -> BackendResult<Evaluation> {
        let request = EvaluateRequest {
            question,
            user_answer,
            session_id: session_id.as_str(),
        };

        debug!("[BackendClient] POST /evaluate (session {})", session_id);
        let response = self
            .client
            .post(self.endpoint("/evaluate"))
            .json(&request)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| BackendError::transport(format!("Evaluate request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        response
            .json::<Evaluation>()
            .await
            .map_err(|e| BackendError::transport(format!("Invalid evaluate response: {}", e)))
    }
}
