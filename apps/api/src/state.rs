use std::sync::Arc;

use crate::config::Config;
use crate::editor::session::SessionStore;
use crate::extract::ExtractorRegistry;
use crate::remote::ResumeService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Live editor sessions, one per open document.
    pub sessions: SessionStore,
    /// The external parsing/enhancement/persistence collaborator.
    /// Trait object so tests and alternative transports can swap it.
    pub remote: Arc<dyn ResumeService>,
    /// Media-type → extractor lookup; new formats register here.
    pub extractors: Arc<ExtractorRegistry>,
    pub config: Config,
}
