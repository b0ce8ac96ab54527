use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::dashboard::handlers::interchange_attachment;
use crate::editor::enhance::{spawn_enhance, EnhanceKey, EnhanceSection, EnhanceStatus};
use crate::editor::session::{EditorSession, SessionPhase};
use crate::errors::AppError;
use crate::models::resume::{
    now_timestamp, EducationEntry, ExperienceEntry, ResumeDocument,
};
use crate::remote::RemoteError;
use crate::schema;
use crate::state::AppState;

const DEFAULT_TITLE: &str = "Untitled Resume";

// ────────────────────────────────────────────────────────────────────────────
// Request / response shapes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResponse {
    pub media_type: String,
    pub characters: usize,
    pub text: String,
}

/// One creation call covers all three modes. `extractedText` is the
/// explicit handoff payload from the upload flow: it travels inside the
/// request and is owned by this call, never by an ambient shared slot.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub title: Option<String>,
    pub resume_id: Option<String>,
    pub extracted_text: Option<String>,
}

/// Whole-form sync of the editable fields. Identity and timestamps are
/// never writable this way; `suggestion` only changes through the
/// suggest operation.
#[derive(Debug, Deserialize)]
pub struct UpdateDocumentRequest {
    pub title: String,
    pub name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddSkillRequest {
    pub skill: String,
}

#[derive(Debug, Deserialize)]
pub struct EnhanceRequest {
    pub section: EnhanceSection,
    pub index: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: String,
    pub phase: SessionPhase,
    pub document: Option<ResumeDocument>,
    pub enhancements: Vec<EnhanceTaskView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhanceTaskView {
    pub section: EnhanceSection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EnhanceTaskView {
    fn new(key: EnhanceKey, status: &EnhanceStatus) -> Self {
        let (state, error) = match status {
            EnhanceStatus::Running => ("running", None),
            EnhanceStatus::Done => ("done", None),
            EnhanceStatus::Failed(reason) => ("failed", Some(reason.clone())),
        };
        EnhanceTaskView {
            section: key.section,
            index: key.index,
            state,
            error,
        }
    }

    fn running(key: EnhanceKey) -> Self {
        Self::new(key, &EnhanceStatus::Running)
    }
}

impl From<&EditorSession> for SessionView {
    fn from(session: &EditorSession) -> Self {
        let mut enhancements: Vec<EnhanceTaskView> = session
            .enhance
            .iter()
            .map(|(key, status)| EnhanceTaskView::new(*key, status))
            .collect();
        enhancements.sort_by_key(|task| (section_rank(task.section), task.index));
        SessionView {
            id: session.id.clone(),
            phase: session.phase,
            document: session.document.clone(),
            enhancements,
            load_error: session.load_error.clone(),
        }
    }
}

fn section_rank(section: EnhanceSection) -> u8 {
    match section {
        EnhanceSection::Summary => 0,
        EnhanceSection::Experience => 1,
        EnhanceSection::Suggestion => 2,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// File ingestion
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/files/extract
///
/// Multipart upload boundary: reads the declared content type and raw
/// bytes of the `file` part and routes them through the extraction
/// dispatcher. The returned text is the handoff payload the client
/// passes to session creation.
pub async fn handle_extract_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart payload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let media_type = field
            .content_type()
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::BadRequest("file part is missing a content type".to_string())
            })?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("could not read file part: {e}")))?;

        let text = state.extractors.extract(&media_type, &bytes)?;
        info!(
            "extracted {} characters from {media_type} upload ({} bytes)",
            text.chars().count(),
            bytes.len()
        );
        return Ok(Json(ExtractResponse {
            media_type,
            characters: text.chars().count(),
            text,
        }));
    }

    Err(AppError::BadRequest(
        "multipart upload is missing a \"file\" part".to_string(),
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// Session lifecycle
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let title = match req.title.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => DEFAULT_TITLE.to_string(),
    };

    match (req.resume_id, req.extracted_text) {
        (Some(_), Some(_)) => Err(AppError::BadRequest(
            "resumeId and extractedText are mutually exclusive".to_string(),
        )),
        (Some(resume_id), None) => create_from_existing(&state, resume_id).await,
        (None, Some(text)) => create_from_extracted(&state, title, text).await,
        (None, None) => create_blank(&state, title).await,
    }
}

async fn create_blank(
    state: &AppState,
    title: String,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let session = EditorSession::ready_with(ResumeDocument::blank(&title));
    let view = SessionView::from(&session);
    info!("created blank editor session {}", session.id);
    state.sessions.insert(session).await;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn create_from_existing(
    state: &AppState,
    resume_id: String,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    open_loading_session(state, &resume_id).await?;

    let fetched = state.remote.fetch(&resume_id).await;
    match fetched {
        Ok(Some(value)) => match schema::validate_resume(&value) {
            Ok(doc) => finish_load(state, &resume_id, doc).await,
            Err(e) => {
                fail_load(state, &resume_id, &e.to_string()).await;
                Err(AppError::LoadFailed(format!(
                    "stored resume {resume_id} failed validation: {e}"
                )))
            }
        },
        Ok(None) => {
            fail_load(state, &resume_id, "not found").await;
            Err(AppError::NotFound(format!("Resume {resume_id} not found")))
        }
        Err(e) => {
            fail_load(state, &resume_id, &e.to_string()).await;
            Err(AppError::LoadFailed(format!(
                "could not load resume {resume_id}: {e}"
            )))
        }
    }
}

async fn create_from_extracted(
    state: &AppState,
    title: String,
    text: String,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    if text.trim().is_empty() {
        return Err(AppError::BadRequest(
            "No text content could be extracted from the file.".to_string(),
        ));
    }

    let id = Uuid::new_v4().to_string();
    open_loading_session(state, &id).await?;

    let parsed = match state.remote.parse_resume(text.trim()).await {
        Ok(parsed) => parsed,
        Err(e) => {
            fail_load(state, &id, &e.to_string()).await;
            return Err(AppError::LoadFailed(format!(
                "could not parse extracted text: {e}"
            )));
        }
    };

    let value = seeded_value(&id, &title, &parsed);
    match schema::validate_resume(&value) {
        Ok(doc) => finish_load(state, &id, doc).await,
        Err(e) => {
            fail_load(state, &id, &e.to_string()).await;
            Err(AppError::LoadFailed(format!(
                "parsed resume failed validation: {e}"
            )))
        }
    }
}

/// Inserts a fresh `Loading` session, refusing to clobber one that is
/// already open under the same id.
async fn open_loading_session(state: &AppState, id: &str) -> Result<(), AppError> {
    if state.sessions.snapshot(id).await.is_some() {
        return Err(AppError::Conflict(format!(
            "session {id} is already open"
        )));
    }
    let mut session = EditorSession::new(id);
    session.begin_loading();
    state.sessions.insert(session).await;
    Ok(())
}

async fn finish_load(
    state: &AppState,
    id: &str,
    doc: ResumeDocument,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let view = state
        .sessions
        .modify(id, |session| {
            session.complete_load(doc);
            Ok(SessionView::from(&*session))
        })
        .await?;
    info!("editor session {id} ready");
    Ok((StatusCode::CREATED, Json(view)))
}

async fn fail_load(state: &AppState, id: &str, reason: &str) {
    let _ = state
        .sessions
        .modify(id, |session| {
            session.fail_load(reason);
            Ok(())
        })
        .await;
}

/// The document shape the creation flow builds from remotely-parsed
/// fields, mirroring the blank-form defaults for anything the parser
/// could not fill in.
fn seeded_value(id: &str, title: &str, parsed: &Value) -> Value {
    let now = now_timestamp();
    json!({
        "id": id,
        "title": title,
        "name": parsed.get("name").cloned().unwrap_or_else(|| json!("")),
        "summary": parsed.get("summary").cloned().unwrap_or_else(|| json!("")),
        "experience": parsed.get("experience").cloned().unwrap_or_else(|| json!([])),
        "education": parsed.get("education").cloned().unwrap_or_else(|| json!([])),
        "skills": parsed.get("skills").cloned().unwrap_or_else(|| json!([])),
        "suggestion": "",
        "createdAt": now,
        "updatedAt": now,
    })
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let session = state
        .sessions
        .snapshot(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
    Ok(Json(SessionView::from(&session)))
}

// ────────────────────────────────────────────────────────────────────────────
// Document mutation
// ────────────────────────────────────────────────────────────────────────────

/// PUT /api/v1/sessions/:id/document
pub async fn handle_update_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateDocumentRequest>,
) -> Result<Json<SessionView>, AppError> {
    if let Some(dup) = first_duplicate(&req.skills) {
        return Err(AppError::Conflict(format!("skill \"{dup}\" already exists")));
    }

    let view = state
        .sessions
        .modify(&id, move |session| {
            let doc = session.ready_document()?;
            doc.title = req.title;
            doc.name = req.name;
            doc.summary = req.summary;
            doc.experience = req.experience;
            doc.education = req.education;
            doc.skills = req.skills;
            Ok(SessionView::from(&*session))
        })
        .await?;
    Ok(Json(view))
}

/// POST /api/v1/sessions/:id/skills
pub async fn handle_add_skill(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AddSkillRequest>,
) -> Result<Json<SessionView>, AppError> {
    if req.skill.trim().is_empty() {
        return Err(AppError::BadRequest("skill must not be empty".to_string()));
    }

    let view = state
        .sessions
        .modify(&id, |session| {
            let doc = session.ready_document()?;
            doc.add_skill(&req.skill)
                .map_err(|e| AppError::Conflict(e.to_string()))?;
            Ok(SessionView::from(&*session))
        })
        .await?;
    Ok(Json(view))
}

/// DELETE /api/v1/sessions/:id/skills/:index
pub async fn handle_remove_skill(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, usize)>,
) -> Result<Json<SessionView>, AppError> {
    let view = state
        .sessions
        .modify(&id, |session| {
            let doc = session.ready_document()?;
            doc.remove_skill(index)
                .ok_or_else(|| AppError::NotFound(format!("no skill at index {index}")))?;
            Ok(SessionView::from(&*session))
        })
        .await?;
    Ok(Json(view))
}

fn first_duplicate(skills: &[String]) -> Option<&str> {
    skills
        .iter()
        .enumerate()
        .find(|(i, skill)| skills[..*i].contains(skill))
        .map(|(_, skill)| skill.as_str())
}

// ────────────────────────────────────────────────────────────────────────────
// Enhancement
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/enhance
///
/// Starts an independent enhancement task for one targeted field and
/// answers 202 immediately; progress is visible on the session view.
pub async fn handle_enhance(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<EnhanceRequest>,
) -> Result<(StatusCode, Json<EnhanceTaskView>), AppError> {
    let key = match (req.section, req.index) {
        (EnhanceSection::Summary, None) => EnhanceKey {
            section: EnhanceSection::Summary,
            index: None,
        },
        (EnhanceSection::Summary, Some(_)) => {
            return Err(AppError::BadRequest(
                "summary enhancement takes no index".to_string(),
            ))
        }
        (EnhanceSection::Experience, Some(index)) => EnhanceKey {
            section: EnhanceSection::Experience,
            index: Some(index),
        },
        (EnhanceSection::Experience, None) => {
            return Err(AppError::BadRequest(
                "experience enhancement requires an index".to_string(),
            ))
        }
        (EnhanceSection::Suggestion, _) => {
            return Err(AppError::BadRequest(
                "advisory suggestions go through the suggest operation".to_string(),
            ))
        }
    };

    let content = state
        .sessions
        .modify(&id, |session| {
            let doc = session.ready_document()?;
            let content = match key.index {
                None => doc.summary.clone(),
                Some(index) => doc
                    .experience
                    .get(index)
                    .ok_or_else(|| {
                        AppError::BadRequest(format!("experience index {index} out of range"))
                    })?
                    .description
                    .clone(),
            };
            if content.trim().is_empty() {
                return Err(AppError::BadRequest("Content cannot be empty".to_string()));
            }
            session.enhance.insert(key, EnhanceStatus::Running);
            Ok(content)
        })
        .await?;

    spawn_enhance(
        state.sessions.clone(),
        state.remote.clone(),
        id,
        key,
        content,
    );
    Ok((StatusCode::ACCEPTED, Json(EnhanceTaskView::running(key))))
}

/// POST /api/v1/sessions/:id/suggest
///
/// Sends the whole serialized document for advisory output; the result
/// lands in the `suggestion` field.
pub async fn handle_suggest(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<EnhanceTaskView>), AppError> {
    let key = EnhanceKey {
        section: EnhanceSection::Suggestion,
        index: None,
    };

    let content = state
        .sessions
        .modify(&id, |session| {
            let doc = session.ready_document()?;
            let content =
                serde_json::to_string_pretty(doc).map_err(|e| AppError::Internal(e.into()))?;
            session.enhance.insert(key, EnhanceStatus::Running);
            Ok(content)
        })
        .await?;

    spawn_enhance(
        state.sessions.clone(),
        state.remote.clone(),
        id,
        key,
        content,
    );
    Ok((StatusCode::ACCEPTED, Json(EnhanceTaskView::running(key))))
}

// ────────────────────────────────────────────────────────────────────────────
// Save & export
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/save
///
/// Validates the current document client-side, sends it to the remote
/// service, and adopts the server-acknowledged timestamps. Any failure
/// returns the session to `Ready` with the pre-save document intact.
pub async fn handle_save(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let snapshot = state.sessions.modify(&id, |s| s.begin_save()).await?;

    match persist(&state, &snapshot).await {
        Ok((created_at, updated_at)) => {
            let view = state
                .sessions
                .modify(&id, |session| {
                    session.complete_save(created_at, updated_at);
                    Ok(SessionView::from(&*session))
                })
                .await?;
            info!("saved resume {id}");
            Ok(Json(view))
        }
        Err(e) => {
            let _ = state
                .sessions
                .modify(&id, |session| {
                    session.abort_save();
                    Ok(())
                })
                .await;
            Err(e)
        }
    }
}

async fn persist(state: &AppState, doc: &ResumeDocument) -> Result<(String, String), AppError> {
    let value = serde_json::to_value(doc).map_err(|e| AppError::Internal(e.into()))?;
    schema::validate_resume(&value)?;

    let stored = state.remote.save(doc).await?;
    let stored_doc = schema::validate_resume(&stored).map_err(|e| {
        AppError::Remote(RemoteError::InvalidDocument(e.to_string()))
    })?;
    Ok((stored_doc.created_at, stored_doc.updated_at))
}

/// GET /api/v1/sessions/:id/export
///
/// Serializes the current document to the self-contained interchange
/// format for local download.
pub async fn handle_export(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<axum::response::Response, AppError> {
    let session = state
        .sessions
        .snapshot(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
    let doc = session.document.ok_or_else(|| {
        AppError::Conflict(format!("session {id} has no document to export"))
    })?;
    interchange_attachment(&doc)
}
