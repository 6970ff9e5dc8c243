//! API routes for the ingest server

pub mod files;
pub mod ingest;
pub mod progress;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Ingestion - with a larger body limit for file uploads
        .route(
            "/ingest",
            post(ingest::ingest_file).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        // Per-file progress polling
        .route("/progress/:file_id", get(progress::get_progress))
        // Cascading deletion
        .route("/files/:file_id", delete(files::delete_file))
        .route("/sessions/:session_id", delete(files::delete_session))
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "session-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Session-scoped document ingestion and vector indexing",
        "endpoints": {
            "POST /api/ingest": "Upload a file and index it (multipart: file, file_id, session_id, mime_type)",
            "GET /api/progress/:file_id": "Poll ingestion progress for a file",
            "DELETE /api/files/:file_id": "Delete all vectors for a file",
            "DELETE /api/sessions/:session_id": "Delete all vectors for a session",
            "GET /health": "Service health and backend identity"
        }
    }))
}
