pub mod health;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::dashboard::handlers as dashboard_handlers;
use crate::editor::handlers as editor_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // File ingestion
        .route(
            "/api/v1/files/extract",
            post(editor_handlers::handle_extract_upload),
        )
        // Editor sessions
        .route(
            "/api/v1/sessions",
            post(editor_handlers::handle_create_session),
        )
        .route(
            "/api/v1/sessions/:id",
            get(editor_handlers::handle_get_session),
        )
        .route(
            "/api/v1/sessions/:id/document",
            put(editor_handlers::handle_update_document),
        )
        .route(
            "/api/v1/sessions/:id/skills",
            post(editor_handlers::handle_add_skill),
        )
        .route(
            "/api/v1/sessions/:id/skills/:index",
            delete(editor_handlers::handle_remove_skill),
        )
        .route(
            "/api/v1/sessions/:id/enhance",
            post(editor_handlers::handle_enhance),
        )
        .route(
            "/api/v1/sessions/:id/suggest",
            post(editor_handlers::handle_suggest),
        )
        .route(
            "/api/v1/sessions/:id/save",
            post(editor_handlers::handle_save),
        )
        .route(
            "/api/v1/sessions/:id/export",
            get(editor_handlers::handle_export),
        )
        // Dashboard
        .route(
            "/api/v1/resumes",
            get(dashboard_handlers::handle_list_resumes),
        )
        .route(
            "/api/v1/resumes/:id",
            delete(dashboard_handlers::handle_delete_resume),
        )
        .route(
            "/api/v1/resumes/:id/download",
            get(dashboard_handlers::handle_download_resume),
        )
        .with_state(state)
}
