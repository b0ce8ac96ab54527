//! Resume Editor State — one in-memory session per open document.
//!
//! A session moves through `Uninitialized → Loading → Ready ⇄ Saving`,
//! with `LoadFailed` as the terminal state when the very first load
//! fails and there is no prior document to fall back to. All document
//! mutation goes through the [`SessionStore`], which serializes access
//! behind an async lock; enhance task completions write through the
//! same door.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::editor::enhance::{EnhanceKey, EnhanceStatus};
use crate::errors::AppError;
use crate::models::resume::ResumeDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Uninitialized,
    Loading,
    Ready,
    Saving,
    LoadFailed,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Uninitialized => "uninitialized",
            SessionPhase::Loading => "loading",
            SessionPhase::Ready => "ready",
            SessionPhase::Saving => "saving",
            SessionPhase::LoadFailed => "load_failed",
        }
    }
}

/// The form-bound, in-memory representation of one resume document.
/// The session id doubles as the document id.
#[derive(Debug, Clone)]
pub struct EditorSession {
    pub id: String,
    pub phase: SessionPhase,
    pub document: Option<ResumeDocument>,
    pub enhance: HashMap<EnhanceKey, EnhanceStatus>,
    pub load_error: Option<String>,
}

impl EditorSession {
    pub fn new(id: &str) -> Self {
        EditorSession {
            id: id.to_string(),
            phase: SessionPhase::Uninitialized,
            document: None,
            enhance: HashMap::new(),
            load_error: None,
        }
    }

    /// A session born `Ready` around a freshly created blank document.
    pub fn ready_with(document: ResumeDocument) -> Self {
        EditorSession {
            id: document.id.clone(),
            phase: SessionPhase::Ready,
            document: Some(document),
            enhance: HashMap::new(),
            load_error: None,
        }
    }

    /// `Uninitialized → Loading`, entered by "load by id" or "seed from
    /// extracted text".
    pub fn begin_loading(&mut self) {
        debug_assert_eq!(self.phase, SessionPhase::Uninitialized);
        self.phase = SessionPhase::Loading;
    }

    /// `Loading → Ready`: the fetched or remotely-parsed data passed
    /// schema validation and becomes the current document.
    pub fn complete_load(&mut self, document: ResumeDocument) {
        self.document = Some(document);
        self.load_error = None;
        self.phase = SessionPhase::Ready;
    }

    /// Load failure. Terminal `LoadFailed` when there is no prior valid
    /// document to fall back to; otherwise an excursion back to `Ready`
    /// with the previous document intact.
    pub fn fail_load(&mut self, reason: &str) {
        if self.document.is_some() {
            self.phase = SessionPhase::Ready;
        } else {
            self.load_error = Some(reason.to_string());
            self.phase = SessionPhase::LoadFailed;
        }
    }

    /// Mutable access to the document, only while `Ready`.
    pub fn ready_document(&mut self) -> Result<&mut ResumeDocument, AppError> {
        if self.phase != SessionPhase::Ready {
            return Err(AppError::Conflict(format!(
                "session {} is {}, not ready",
                self.id,
                self.phase.as_str()
            )));
        }
        self.document
            .as_mut()
            .ok_or_else(|| AppError::Conflict(format!("session {} has no document", self.id)))
    }

    /// `Ready → Saving`; returns a snapshot of the document to send.
    pub fn begin_save(&mut self) -> Result<ResumeDocument, AppError> {
        let snapshot = self.ready_document()?.clone();
        self.phase = SessionPhase::Saving;
        Ok(snapshot)
    }

    /// `Saving → Ready` on success: adopt the server-acknowledged
    /// timestamps. Only the timestamps are touched, so enhance
    /// completions that landed mid-save survive.
    pub fn complete_save(&mut self, created_at: String, updated_at: String) {
        if let Some(doc) = self.document.as_mut() {
            doc.created_at = created_at;
            doc.updated_at = updated_at;
        }
        self.phase = SessionPhase::Ready;
    }

    /// `Saving → Ready` on failure, pre-save document intact.
    pub fn abort_save(&mut self) {
        self.phase = SessionPhase::Ready;
    }
}

/// Shared map of live editor sessions.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, EditorSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: EditorSession) {
        self.inner
            .write()
            .await
            .insert(session.id.clone(), session);
    }

    /// A point-in-time copy of the session, if it exists.
    pub async fn snapshot(&self, id: &str) -> Option<EditorSession> {
        self.inner.read().await.get(id).cloned()
    }

    /// Runs `f` with exclusive access to the session. The closure's
    /// error is passed through; an unknown id is `NotFound`.
    pub async fn modify<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut EditorSession) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut sessions = self.inner.write().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
        f(session)
    }
}
