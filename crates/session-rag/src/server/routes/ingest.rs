//! Synchronous ingestion endpoint

use axum::{
    extract::{multipart::Field, Multipart, State},
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{IngestSummary, SourceFile};

/// POST /api/ingest - Upload one file and process it to completion
///
/// Multipart fields: `file` (required, with filename), `file_id` (required),
/// `session_id` (required), `mime_type` (optional, inferred from the
/// extension when absent). Responds with the ingest summary once the file
/// is fully indexed; progress can be polled concurrently under the same
/// `file_id`.
pub async fn ingest_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestSummary>> {
    let mut filename: Option<String> = None;
    let mut data: Option<Vec<u8>> = None;
    let mut file_id: Option<String> = None;
    let mut session_id: Option<String> = None;
    let mut mime_type: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Config(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                filename = field.file_name().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::Config(format!("Failed to read file contents: {}", e)))?;
                data = Some(bytes.to_vec());
            }
            "file_id" => file_id = Some(text_field(field, "file_id").await?),
            "session_id" => session_id = Some(text_field(field, "session_id").await?),
            "mime_type" => mime_type = Some(text_field(field, "mime_type").await?),
            other => {
                tracing::debug!("Ignoring unknown multipart field '{}'", other);
            }
        }
    }

    let data = data.ok_or_else(|| Error::Config("Missing 'file' field".to_string()))?;
    let filename =
        filename.ok_or_else(|| Error::Config("The 'file' field has no filename".to_string()))?;
    let file_id = file_id.ok_or_else(|| Error::Config("Missing 'file_id' field".to_string()))?;
    let session_id =
        session_id.ok_or_else(|| Error::Config("Missing 'session_id' field".to_string()))?;

    tracing::info!(
        "Received '{}' ({} bytes) for file_id={} session_id={}",
        filename,
        data.len(),
        file_id,
        session_id
    );

    let source = SourceFile::new(file_id, session_id, filename, mime_type)?;
    let summary = state.pipeline().ingest(&source, &data).await?;

    Ok(Json(summary))
}

async fn text_field(field: Field<'_>, name: &str) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| Error::Config(format!("Failed to read '{}' field: {}", name, e)))
}
