//! Local web server for the RAG assistant.
//!
//! Serves a single page with a chat tab and a document management tab,
//! backed by a JSON API over one shared [`RagAgent`].
//!
//! # Module Structure
//!
//! - `handlers` - HTTP route handlers
//! - `models` - API request/response types (DTOs)
//! - `session` - Agent plus displayed transcript
//! - `templates` - HTML/CSS/JS template rendering

mod handlers;
mod models;
pub(crate) mod session;
mod templates;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use color_eyre::eyre::{Result, WrapErr};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use ragdesk_core::{Config, RagAgent};

use session::Session;

/// Largest accepted upload request.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state for the server.
///
/// The session mutex serializes requests, so each one sees the agent as
/// the previous request left it.
pub struct AppState {
    pub session: Mutex<Session>,
    /// Page title.
    pub title: String,
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Configuration for the assistant server.
pub struct ServeConfig {
    /// Host to bind.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Whether to open the browser automatically.
    pub open_browser: bool,
    /// Page title.
    pub title: String,
}

impl ServeConfig {
    pub fn from_config(config: &Config, open_browser: bool) -> Self {
        Self {
            host: config.server.host.clone(),
            port: config.server.port,
            open_browser,
            title: config.server.title.clone(),
        }
    }
}

// =============================================================================
// Server Entry Point
// =============================================================================

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Main page
        .route("/", get(handlers::index))
        // Chat
        .route("/api/chat", post(handlers::chat))
        .route("/api/chat/clear", post(handlers::clear_chat))
        .route("/api/status", get(handlers::status))
        // Knowledge base
        .route(
            "/api/documents/upload",
            post(handlers::upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/documents/text", post(handlers::add_text))
        .route("/api/documents/search", get(handlers::search))
        .route("/api/documents/clear", post(handlers::clear_documents))
        .layer(CorsLayer::new().allow_origin(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the assistant server and block until it stops.
pub async fn start_server(config: ServeConfig, agent: RagAgent) -> Result<()> {
    let state = Arc::new(AppState {
        session: Mutex::new(Session::new(agent)),
        title: config.title.clone(),
    });

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .wrap_err_with(|| format!("Invalid listen address {}:{}", config.host, config.port))?;
    let browse_host = if config.host == "0.0.0.0" { "localhost" } else { config.host.as_str() };
    let url = format!("http://{}:{}", browse_host, config.port);

    println!("Starting {}...", config.title);
    println!("Interface: {}", url);
    println!("Upload documents in the 'Document Management' tab, then chat in the 'Chat' tab.");
    println!("Press Ctrl+C to stop\n");

    if config.open_browser {
        if let Err(e) = open::that(&url) {
            tracing::warn!("Could not open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("Could not bind {}", addr))?;
    tracing::info!(%addr, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
