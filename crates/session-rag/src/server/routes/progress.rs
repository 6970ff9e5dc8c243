//! Progress polling endpoint

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::ProgressSnapshot;

/// GET /api/progress/:file_id - Snapshot the progress record for a file
///
/// Unknown ids return 404. A completed or failed job keeps its record until
/// eviction or deletion, so pollers see the terminal state at least once.
pub async fn get_progress(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Json<ProgressSnapshot>> {
    let progress = state
        .tracker()
        .get(&file_id)
        .ok_or_else(|| Error::NotFound(format!("no progress for file '{}'", file_id)))?;

    Ok(Json(ProgressSnapshot::from(progress)))
}
