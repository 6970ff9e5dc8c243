//! Response types for the upload, progress, and deletion boundaries

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::processing::progress::{IngestStage, JobProgress};

/// Per-job summary returned when an upload finishes successfully.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestSummary {
    /// "success"; failures are reported through the error body instead
    pub status: String,
    /// Detected source format, lowercase ("pdf", "csv", "xlsx")
    pub file_type: String,
    /// Chunks actually sent to the index (empty-content chunks excluded)
    pub chunks_created: usize,
    pub chunking_time_seconds: f64,
    pub vectorization_time_seconds: f64,
    pub total_processing_time_seconds: f64,
    /// Chunks per second over the whole job
    pub processing_rate: f64,
    pub message: String,
}

/// Snapshot served to progress pollers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub file_id: String,
    /// Absolute progress, 0-100
    pub progress: f32,
    pub stage: IngestStage,
    pub message: String,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub stats: HashMap<String, serde_json::Value>,
}

impl From<JobProgress> for ProgressSnapshot {
    fn from(job: JobProgress) -> Self {
        Self {
            file_id: job.file_id,
            progress: job.progress,
            stage: job.stage,
            message: job.message,
            updated_at: job.updated_at,
            stats: job.stats,
        }
    }
}

/// Result of deleting one file's vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDeleteResponse {
    pub file_id: String,
    pub deleted_count: usize,
    pub message: String,
}

/// Result of deleting a whole session's vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDeleteResponse {
    pub session_id: String,
    pub deleted_count: usize,
    pub message: String,
}

/// Service health report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub index_backend: String,
    pub embedding_model: String,
    /// Progress records currently tracked
    pub jobs_tracked: usize,
}
