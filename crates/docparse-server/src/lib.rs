//! REST API for document field extraction.
//!
//! Routes:
//! - `GET /`, `GET /health`: liveness and configuration
//! - `GET /default-fields`: the built-in field list
//! - `POST /parse`, `POST /parse-with-json`: multipart PDF upload

pub mod error;
pub mod handlers;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use docparse_core::DocumentParser;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Room for the non-file form fields on top of the document size limit.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// API server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub parser: Arc<DocumentParser>,
}

impl AppState {
    pub fn new(parser: DocumentParser) -> Self {
        AppState {
            parser: Arc::new(parser),
        }
    }
}

/// Build the API router with all endpoints
pub fn build_router(state: AppState) -> Router {
    let body_limit = state
        .parser
        .config()
        .max_document_bytes
        .saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/default-fields", get(handlers::default_fields))
        .route("/parse", post(handlers::parse_document))
        .route("/parse-with-json", post(handlers::parse_document_with_json))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the API server and run until Ctrl-C.
pub async fn start_server(addr: &str, state: AppState) -> Result<(), std::io::Error> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
