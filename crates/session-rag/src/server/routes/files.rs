//! File and session deletion endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{FileDeleteResponse, SessionDeleteResponse};

/// DELETE /api/files/:file_id - Remove every vector written for a file
///
/// Idempotent; an unknown id deletes zero vectors and still succeeds.
pub async fn delete_file(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Json<FileDeleteResponse>> {
    let deleted_count = state.lifecycle().delete_file(&file_id).await?;

    Ok(Json(FileDeleteResponse {
        message: format!("Deleted {} vectors for file '{}'", deleted_count, file_id),
        file_id,
        deleted_count,
    }))
}

/// DELETE /api/sessions/:session_id - Remove every vector in a session
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionDeleteResponse>> {
    let deleted_count = state.lifecycle().delete_session(&session_id).await?;

    Ok(Json(SessionDeleteResponse {
        message: format!(
            "Deleted {} vectors for session '{}'",
            deleted_count, session_id
        ),
        session_id,
        deleted_count,
    }))
}
