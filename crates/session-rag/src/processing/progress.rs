//! Concurrent per-file progress tracking
//!
//! Each ingest job owns one record keyed by `file_id`. Writers replace the
//! whole record under the map shard lock, so pollers always see a consistent
//! stage/progress/message triple.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::types::SourceFile;

/// Pipeline stage of an ingest job.
///
/// Every stage owns a fixed band of the 0-100 progress scale, so absolute
/// progress is monotone as long as stages advance in order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IngestStage {
    Started,
    Reading,
    Analyzing,
    Chunking,
    VectorizingPrep,
    Vectorizing,
    Finalizing,
    Completed,
    Error,
}

impl IngestStage {
    /// The band of the overall scale this stage covers.
    ///
    /// `Error` has no band: the tracker freezes progress at its last value
    /// when a job fails.
    pub fn range(&self) -> (f32, f32) {
        match self {
            Self::Started => (0.0, 5.0),
            Self::Reading => (5.0, 15.0),
            Self::Analyzing => (15.0, 25.0),
            Self::Chunking => (25.0, 40.0),
            Self::VectorizingPrep => (40.0, 45.0),
            Self::Vectorizing => (45.0, 85.0),
            Self::Finalizing => (85.0, 95.0),
            Self::Completed => (95.0, 100.0),
            Self::Error => (0.0, 0.0),
        }
    }

    /// Map a within-stage percentage (0-100) to absolute progress.
    pub fn absolute(&self, pct: f32) -> f32 {
        let (start, end) = self.range();
        let pct = pct.clamp(0.0, 100.0);
        start + (end - start) * pct / 100.0
    }

    /// Whether the stage ends the job
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

/// Progress record for one ingest job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobProgress {
    pub file_id: String,
    pub session_id: String,
    pub filename: String,
    pub stage: IngestStage,
    /// Absolute progress, 0-100
    pub progress: f32,
    pub message: String,
    /// Stage-specific counters (batch numbers, ETA, ...)
    #[serde(default)]
    pub stats: HashMap<String, serde_json::Value>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl JobProgress {
    pub fn new(source: &SourceFile) -> Self {
        Self {
            file_id: source.file_id.clone(),
            session_id: source.session_id.clone(),
            filename: source.filename.clone(),
            stage: IngestStage::Started,
            progress: 0.0,
            message: "Upload received".to_string(),
            stats: HashMap::new(),
            updated_at: chrono::Utc::now(),
        }
    }
}

/// Shared tracker for all in-flight and recently finished jobs.
///
/// Cheap to clone; all clones share the same map.
#[derive(Clone, Default)]
pub struct ProgressTracker {
    jobs: Arc<DashMap<String, JobProgress>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(DashMap::new()),
        }
    }

    /// Register a fresh record for a job, replacing any earlier run's record
    /// for the same `file_id`.
    pub fn start(&self, source: &SourceFile) {
        self.jobs
            .insert(source.file_id.clone(), JobProgress::new(source));
    }

    /// Move a job to `stage` at `pct` percent within it.
    pub fn update(&self, file_id: &str, stage: IngestStage, pct: f32, message: &str) {
        self.apply(file_id, stage, pct, message, None);
    }

    /// Same as [`update`](Self::update), also replacing the stats map.
    pub fn update_with_stats(
        &self,
        file_id: &str,
        stage: IngestStage,
        pct: f32,
        message: &str,
        stats: HashMap<String, serde_json::Value>,
    ) {
        self.apply(file_id, stage, pct, message, Some(stats));
    }

    fn apply(
        &self,
        file_id: &str,
        stage: IngestStage,
        pct: f32,
        message: &str,
        stats: Option<HashMap<String, serde_json::Value>>,
    ) {
        if let Some(mut job) = self.jobs.get_mut(file_id) {
            job.stage = stage;
            job.progress = stage.absolute(pct);
            job.message = message.to_string();
            if let Some(stats) = stats {
                job.stats = stats;
            }
            job.updated_at = chrono::Utc::now();
        }
    }

    /// Mark a job failed. Progress keeps its last value so pollers can see
    /// how far the job got.
    pub fn error(&self, file_id: &str, message: &str) {
        if let Some(mut job) = self.jobs.get_mut(file_id) {
            job.stage = IngestStage::Error;
            job.message = message.to_string();
            job.updated_at = chrono::Utc::now();
        }
    }

    /// Snapshot a job's current record
    pub fn get(&self, file_id: &str) -> Option<JobProgress> {
        self.jobs.get(file_id).map(|j| j.clone())
    }

    /// Drop a job's record. Returns whether one existed.
    pub fn clear(&self, file_id: &str) -> bool {
        self.jobs.remove(file_id).is_some()
    }

    /// Drop records that haven't been touched within `ttl`.
    ///
    /// In-flight jobs update constantly, so only finished or abandoned
    /// records age out.
    pub fn evict_stale(&self, ttl: chrono::Duration) -> usize {
        let cutoff = chrono::Utc::now() - ttl;
        let before = self.jobs.len();
        self.jobs.retain(|_, job| job.updated_at > cutoff);
        let removed = before - self.jobs.len();
        if removed > 0 {
            tracing::debug!(removed, "evicted stale progress records");
        }
        removed
    }

    /// Number of records currently tracked
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
