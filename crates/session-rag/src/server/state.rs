//! Application state for the ingest server

use std::sync::Arc;

use crate::config::IngestConfig;
use crate::processing::{IngestPipeline, LifecycleManager, ProgressTracker};
use crate::providers::{EmbeddingProvider, VectorIndex};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: IngestConfig,
    /// The wired-up ingest pipeline
    pipeline: IngestPipeline,
    /// File and session deletion
    lifecycle: LifecycleManager,
    /// Progress records for pollers
    tracker: ProgressTracker,
    /// Index backend, kept for health reporting
    index: Arc<dyn VectorIndex>,
}

impl AppState {
    /// Wire up the state from a config and concrete providers.
    pub fn new(
        config: IngestConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        let tracker = ProgressTracker::new();
        let pipeline = IngestPipeline::new(&config, embedder, index.clone(), tracker.clone());
        let lifecycle = LifecycleManager::new(index.clone(), tracker.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pipeline,
                lifecycle,
                tracker,
                index,
            }),
        }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.inner.config
    }

    pub fn pipeline(&self) -> &IngestPipeline {
        &self.inner.pipeline
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.inner.lifecycle
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.inner.tracker
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.inner.index
    }

    /// Spawn the background task that ages out stale progress records.
    pub fn spawn_progress_eviction(&self) {
        let tracker = self.inner.tracker.clone();
        let ttl = chrono::Duration::seconds(self.inner.config.progress.ttl_secs as i64);
        let period = std::time::Duration::from_secs(60);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                tracker.evict_stale(ttl);
            }
        });
    }
}
