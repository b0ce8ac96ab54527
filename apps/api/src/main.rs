mod config;
mod dashboard;
mod editor;
mod errors;
mod extract;
mod models;
mod remote;
mod routes;
mod schema;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::editor::session::SessionStore;
use crate::extract::ExtractorRegistry;
use crate::remote::HttpResumeService;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Folio API v{}", env!("CARGO_PKG_VERSION"));

    // Extraction dispatcher: media type → extractor lookup
    let extractors = Arc::new(ExtractorRegistry::with_default_formats());
    info!(
        "Extraction dispatcher ready ({} formats)",
        extractors.supported_types().len()
    );

    // Remote resume service client
    let remote = Arc::new(HttpResumeService::new(&config.resume_service_url));
    info!(
        "Remote resume service client initialized ({})",
        config.resume_service_url
    );

    // Build app state
    let state = AppState {
        sessions: SessionStore::new(),
        remote,
        extractors,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
