//! Cascading deletion of indexed content

use std::sync::Arc;

use crate::error::Result;
use crate::providers::{ScopeField, VectorIndex};

use super::progress::ProgressTracker;

/// Removes indexed content when files or whole sessions go away.
pub struct LifecycleManager {
    index: Arc<dyn VectorIndex>,
    tracker: ProgressTracker,
}

impl LifecycleManager {
    pub fn new(index: Arc<dyn VectorIndex>, tracker: ProgressTracker) -> Self {
        Self { index, tracker }
    }

    /// Delete one file's vectors and its progress record.
    ///
    /// Idempotent: deleting a file with nothing indexed returns 0.
    pub async fn delete_file(&self, file_id: &str) -> Result<usize> {
        let removed = self.index.delete_by(ScopeField::FileId, file_id).await?;
        let had_progress = self.tracker.clear(file_id);

        tracing::info!(file_id, removed, had_progress, "file deleted");
        Ok(removed)
    }

    /// Delete every vector belonging to a session, across all its files.
    ///
    /// Progress records are keyed by file and stay in place until they
    /// age out or their file is deleted individually.
    pub async fn delete_session(&self, session_id: &str) -> Result<usize> {
        let removed = self
            .index
            .delete_by(ScopeField::SessionId, session_id)
            .await?;

        tracing::info!(session_id, removed, "session deleted");
        Ok(removed)
    }
}
