//! Top-level orchestration of documents, sessions, and engines.
//!
//! The [`Workbench`] owns the document ledger, the active selection, and one
//! engine pair per opened session. Engines live as long as their ledger
//! entry: switching documents parks a session without losing its
//! conversation or quiz progress, and only explicit removal discards it.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use docent_core::document::Document;
use docent_core::ports::{ChallengeService, QueryService};
use docent_core::session::{ActiveSelection, DocumentHistory, HistoryEntry, SessionId};
use tokio::sync::RwLock;
use tracing::info;

use crate::challenge::ChallengeEngine;
use crate::conversation::ConversationEngine;

/// Which screen the client should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// No document selected; offer an upload.
    Upload,
    /// A document is selected; show conversation and challenge for it.
    Analysis(ActiveSelection),
}

/// The engine pair backing one opened document.
pub struct DocumentSession {
    conversation: ConversationEngine,
    challenge: ChallengeEngine,
}

impl DocumentSession {
    fn new(
        session_id: SessionId,
        query_service: Arc<dyn QueryService>,
        challenge_service: Arc<dyn ChallengeService>,
    ) -> Self {
        Self {
            conversation: ConversationEngine::new(session_id.clone(), query_service),
            challenge: ChallengeEngine::new(session_id, challenge_service),
        }
    }

    pub fn conversation(&self) -> &ConversationEngine {
        &self.conversation
    }

    pub fn challenge(&self) -> &ChallengeEngine {
        &self.challenge
    }
}

/// Client-side root state: ledger, selection, and per-session engines.
pub struct Workbench {
    query_service: Arc<dyn QueryService>,
    challenge_service: Arc<dyn ChallengeService>,
    history: RwLock<DocumentHistory>,
    active: RwLock<Option<ActiveSelection>>,
    sessions: RwLock<HashMap<SessionId, Arc<DocumentSession>>>,
}

impl Workbench {
    pub fn new(
        query_service: Arc<dyn QueryService>,
        challenge_service: Arc<dyn ChallengeService>,
    ) -> Self {
        Self {
            query_service,
            challenge_service,
            history: RwLock::new(DocumentHistory::new()),
            active: RwLock::new(None),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a completed upload: derives the session token, records the
    /// ledger entry, selects it, and opens its engine pair.
    ///
    /// Uploading a document that maps to a known session reuses the
    /// existing engines, so conversation and quiz progress survive.
    pub async fn document_uploaded(&self, document: Document) -> SessionId {
        let session_id = SessionId::from_upload_time(&document.upload_time);
        info!(
            "[Workbench] opened {} as session {}",
            document.filename, session_id
        );
        self.history
            .write()
            .await
            .record(document.clone(), session_id.clone());
        *self.active.write().await = Some(ActiveSelection {
            document,
            session_id: session_id.clone(),
        });
        self.ensure_session(&session_id).await;
        session_id
    }

    /// Clears the selection so the upload view shows again.
    ///
    /// The ledger and every parked session stay untouched.
    pub async fn start_new(&self) {
        *self.active.write().await = None;
    }

    /// Drops `session_id` from the ledger and discards its engines.
    ///
    /// Removing the selected session also clears the selection. Unknown ids
    /// are ignored.
    pub async fn remove(&self, session_id: &SessionId) {
        self.history.write().await.remove(session_id);
        {
            let mut active = self.active.write().await;
            if active
                .as_ref()
                .is_some_and(|selection| selection.session_id == *session_id)
            {
                *active = None;
            }
        }
        // Explicit removal is the one path that discards engine state.
        self.sessions.write().await.remove(session_id);
        info!("[Workbench] removed session {}", session_id);
    }

    /// Makes a ledger entry the active selection again.
    pub async fn select(&self, session_id: &SessionId) -> Result<()> {
        let entry = {
            let history = self.history.read().await;
            let Some(entry) = history.select(session_id) else {
                return Err(anyhow!("Session not found in history: {}", session_id));
            };
            entry.clone()
        };
        self.ensure_session(session_id).await;
        *self.active.write().await = Some(entry.into());
        info!("[Workbench] switched to session {}", session_id);
        Ok(())
    }

    /// The screen implied by the current selection.
    pub async fn view(&self) -> View {
        match self.active.read().await.clone() {
            Some(selection) => View::Analysis(selection),
            None => View::Upload,
        }
    }

    pub async fn active(&self) -> Option<ActiveSelection> {
        self.active.read().await.clone()
    }

    /// Ledger entries, newest first.
    pub async fn history_entries(&self) -> Vec<HistoryEntry> {
        self.history.read().await.entries().to_vec()
    }

    pub async fn session(&self, session_id: &SessionId) -> Option<Arc<DocumentSession>> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Engines for the selected session, if any.
    pub async fn active_session(&self) -> Option<Arc<DocumentSession>> {
        let session_id = {
            let active = self.active.read().await;
            active.as_ref()?.session_id.clone()
        };
        self.session(&session_id).await
    }

    /// Returns the engine pair for `session_id`, creating it on first use.
    async fn ensure_session(&self, session_id: &SessionId) -> Arc<DocumentSession> {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get(session_id) {
            return session.clone();
        }
        let session = Arc::new(DocumentSession::new(
            session_id.clone(),
            self.query_service.clone(),
            self.challenge_service.clone(),
        ));
        sessions.insert(session_id.clone(), session.clone());
        // Question generation starts as soon as a session opens.
        let spawned = session.clone();
        tokio::spawn(async move {
            spawned.challenge().generate().await;
        });
        session
    }
}
