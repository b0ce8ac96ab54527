//! Dashboard — summaries of stored resumes and the actions on them.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::warn;

use crate::errors::AppError;
use crate::models::resume::{ResumeDocument, ResumeSummary};
use crate::schema;
use crate::state::AppState;

/// GET /api/v1/resumes
///
/// Lists stored resumes as dashboard summaries. Every stored record
/// passes through the same schema rule set as the editor; a record that
/// fails validation is skipped with a logged warning rather than
/// breaking the whole listing.
pub async fn handle_list_resumes(
    State(state): State<AppState>,
) -> Result<Json<Vec<ResumeSummary>>, AppError> {
    let stored = state.remote.list().await?;

    let mut summaries = Vec::with_capacity(stored.len());
    for value in &stored {
        match schema::validate_resume(value) {
            Ok(doc) => summaries.push(ResumeSummary::from(&doc)),
            Err(e) => {
                let id = value.get("id").and_then(|v| v.as_str()).unwrap_or("?");
                warn!("skipping stored resume {id}: {e}");
            }
        }
    }
    Ok(Json(summaries))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    match state.remote.delete(&id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) if e.status() == Some(404) => {
            Err(AppError::NotFound(format!("Resume {id} not found")))
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /api/v1/resumes/:id/download
pub async fn handle_download_resume(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let value = state
        .remote
        .fetch(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;
    let doc = schema::validate_resume(&value)?;
    interchange_attachment(&doc)
}

/// Serializes a document to the interchange format (pretty JSON that
/// round-trips through schema validation) as a download attachment.
pub fn interchange_attachment(doc: &ResumeDocument) -> Result<Response, AppError> {
    let body = serde_json::to_string_pretty(doc).map_err(|e| AppError::Internal(e.into()))?;
    let filename = attachment_filename(&doc.title);
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}.json\""),
            ),
        ],
        body,
    )
        .into_response())
}

fn attachment_filename(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.' | '\'') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim().to_string();
    if cleaned.is_empty() {
        "resume".to_string()
    } else {
        cleaned
    }
}
