//! Remote Resume Service client — the single point of entry for every
//! call to the external parsing/enhancement/persistence collaborator.
//!
//! No other module may talk to the remote service directly. The client
//! deliberately does NOT retry: a failed call surfaces to the user, who
//! may re-invoke the operation.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::models::resume::ResumeDocument;

const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("remote service returned empty content")]
    EmptyContent,

    #[error("remote service returned an invalid document: {0}")]
    InvalidDocument(String),
}

impl RemoteError {
    /// Status code of an API-level failure, if that is what this is.
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Boundary contract with the Remote Resume Service. Carried in
/// `AppState` as `Arc<dyn ResumeService>` so tests and alternative
/// backends can swap the transport without touching callers.
#[async_trait]
pub trait ResumeService: Send + Sync {
    /// Raw extracted text → structured resume fields (pre-validation).
    async fn parse_resume(&self, content: &str) -> Result<Value, RemoteError>;

    /// Section name + current text → enhanced text for that section.
    async fn enhance(&self, section: &str, content: &str) -> Result<String, RemoteError>;

    /// Full serialized document → advisory suggestion text.
    async fn suggest(&self, content: &str) -> Result<String, RemoteError>;

    /// Persists the document; returns the stored representation carrying
    /// the server-acknowledged timestamps.
    async fn save(&self, document: &ResumeDocument) -> Result<Value, RemoteError>;

    /// All stored documents (pre-validation).
    async fn list(&self) -> Result<Vec<Value>, RemoteError>;

    /// One stored document, or `None` when the service reports it missing.
    async fn fetch(&self, id: &str) -> Result<Option<Value>, RemoteError>;

    async fn delete(&self, id: &str) -> Result<(), RemoteError>;
}

/// Production implementation speaking the service's HTTP dialect.
#[derive(Clone)]
pub struct HttpResumeService {
    client: Client,
    base_url: String,
}

impl HttpResumeService {
    pub fn new(base_url: &str) -> Self {
        HttpResumeService {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl ResumeService for HttpResumeService {
    async fn parse_resume(&self, content: &str) -> Result<Value, RemoteError> {
        let response = self
            .client
            .post(self.url("/parse-resume"))
            .json(&json!({ "content": content }))
            .send()
            .await?;
        let body: Value = check(response).await?.json().await?;
        debug!("parse-resume call succeeded");
        body.get("parsed_data")
            .cloned()
            .ok_or(RemoteError::EmptyContent)
    }

    async fn enhance(&self, section: &str, content: &str) -> Result<String, RemoteError> {
        let response = self
            .client
            .post(self.url("/ai-enhance"))
            .json(&json!({ "section": section, "content": content }))
            .send()
            .await?;
        let body: Value = check(response).await?.json().await?;
        text_field(&body, "enhanced")
    }

    async fn suggest(&self, content: &str) -> Result<String, RemoteError> {
        let response = self
            .client
            .post(self.url("/ai-enhance-suggestions"))
            .json(&json!({ "content": content }))
            .send()
            .await?;
        let body: Value = check(response).await?.json().await?;
        text_field(&body, "suggestions")
    }

    async fn save(&self, document: &ResumeDocument) -> Result<Value, RemoteError> {
        let response = self
            .client
            .post(self.url("/save-resume"))
            .json(document)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn list(&self) -> Result<Vec<Value>, RemoteError> {
        let response = self.client.get(self.url("/resumes")).send().await?;
        let body: Value = check(response).await?.json().await?;
        match body {
            Value::Array(items) => Ok(items),
            _ => Err(RemoteError::EmptyContent),
        }
    }

    async fn fetch(&self, id: &str) -> Result<Option<Value>, RemoteError> {
        let response = self
            .client
            .get(self.url(&format!("/resume/{id}")))
            .send()
            .await?;
        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        let body: Value = check(response).await?.json().await?;
        Ok(found_document(body))
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        let response = self
            .client
            .delete(self.url(&format!("/resume/{id}")))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

/// Converts a non-success response into `RemoteError::Api`, unwrapping
/// the service's `{"detail": ...}` error body shape when present.
async fn check(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Api {
        status: status.as_u16(),
        message: error_detail(&body),
    })
}

fn error_detail(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: Value,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: Value::String(s),
        }) => s,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => body.to_string(),
    }
}

fn text_field(body: &Value, field: &str) -> Result<String, RemoteError> {
    match body.get(field).and_then(Value::as_str) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(RemoteError::EmptyContent),
    }
}

/// The service answers a missing document with `{"found": false, ...}`
/// and a 200 rather than a 404; treat both as absent.
fn found_document(body: Value) -> Option<Value> {
    if body.get("found").and_then(Value::as_bool) == Some(false) {
        return None;
    }
    Some(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    #[test]
    fn test_error_detail_unwraps_string_detail() {
        let body = r#"{"detail": "Content cannot be empty"}"#;
        assert_eq!(error_detail(body), "Content cannot be empty");
    }

    #[test]
    fn test_error_detail_falls_back_to_raw_body() {
        assert_eq!(error_detail("<html>bad gateway</html>"), "<html>bad gateway</html>");
    }

    #[test]
    fn test_found_false_body_is_absent_document() {
        let body = json!({"found": false, "message": "Resume not found"});
        assert_eq!(found_document(body), None);

        let body = json!({"id": "1", "title": "t"});
        assert!(found_document(body).is_some());
    }

    async fn spawn_service(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_parse_resume_returns_parsed_data() {
        let router = Router::new().route(
            "/parse-resume",
            post(|| async {
                Json(json!({"parsed_data": {"name": "Alice", "skills": ["Rust"]}}))
            }),
        );
        let base = spawn_service(router).await;

        let client = HttpResumeService::new(&base);
        let parsed = client.parse_resume("Alice Smith Engineer").await.unwrap();
        assert_eq!(parsed["name"], "Alice");
    }

    #[tokio::test]
    async fn test_enhance_surfaces_service_detail_on_error() {
        let router = Router::new().route(
            "/ai-enhance",
            post(|| async {
                (
                    axum::http::StatusCode::BAD_REQUEST,
                    Json(json!({"detail": "Section must be 'summary' or 'experience'"})),
                )
            }),
        );
        let base = spawn_service(router).await;

        let client = HttpResumeService::new(&base);
        let err = client.enhance("hobbies", "x").await.unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert!(err.to_string().contains("Section must be"));
    }

    #[tokio::test]
    async fn test_save_returns_stored_representation() {
        let router = Router::new().route(
            "/save-resume",
            post(|Json(mut doc): Json<Value>| async move {
                doc["updatedAt"] = json!("2030-01-01T00:00:00.000Z");
                Json(doc)
            }),
        );
        let base = spawn_service(router).await;

        let client = HttpResumeService::new(&base);
        let mut doc = crate::models::resume::ResumeDocument::blank("t");
        doc.name = "Alice".to_string();
        let stored = client.save(&doc).await.unwrap();
        assert_eq!(stored["id"], json!(doc.id));
        assert_eq!(stored["updatedAt"], json!("2030-01-01T00:00:00.000Z"));
    }

    #[tokio::test]
    async fn test_fetch_maps_404_to_none() {
        let router = Router::new().route(
            "/resume/:id",
            get(|| async { (axum::http::StatusCode::NOT_FOUND, "gone") }),
        );
        let base = spawn_service(router).await;

        let client = HttpResumeService::new(&base);
        assert_eq!(client.fetch("missing").await.unwrap(), None);
    }
}
