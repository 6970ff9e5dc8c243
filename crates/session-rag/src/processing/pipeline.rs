//! End-to-end ingest pipeline
//!
//! Walks one uploaded file through extraction, chunking, batched
//! vectorization, and index finalization, reporting progress at every
//! stage transition.

use std::sync::Arc;
use std::time::Instant;

use crate::config::IngestConfig;
use crate::error::Result;
use crate::ingestion::{Chunker, Extractor};
use crate::providers::{EmbeddingProvider, ScopeField, VectorIndex};
use crate::types::{ExtractedContent, IngestSummary, SourceFile};

use super::batcher::VectorBatcher;
use super::progress::{IngestStage, ProgressTracker};

/// The ingest pipeline and its wired-up stages.
pub struct IngestPipeline {
    extractor: Extractor,
    chunker: Chunker,
    batcher: VectorBatcher,
    index: Arc<dyn VectorIndex>,
    dimensions: usize,
    tracker: ProgressTracker,
}

impl IngestPipeline {
    pub fn new(
        config: &IngestConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        tracker: ProgressTracker,
    ) -> Self {
        Self {
            extractor: Extractor,
            chunker: Chunker::new(config.chunking.clone()),
            batcher: VectorBatcher::new(embedder.clone(), index.clone(), &config.embedding),
            dimensions: embedder.dimensions(),
            index,
            tracker,
        }
    }

    /// Shared tracker, for pollers and the server state.
    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    /// Ingest one file end to end.
    ///
    /// On failure the progress record is moved to the error stage with the
    /// failure message; batches already written stay in the index.
    pub async fn ingest(&self, source: &SourceFile, data: &[u8]) -> Result<IngestSummary> {
        self.tracker.start(source);

        match self.run(source, data).await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                self.tracker.error(&source.file_id, &e.to_string());
                tracing::error!(
                    file_id = %source.file_id,
                    filename = %source.filename,
                    error = %e,
                    "ingest failed"
                );
                Err(e)
            }
        }
    }

    async fn run(&self, source: &SourceFile, data: &[u8]) -> Result<IngestSummary> {
        let total_started = Instant::now();
        let file_id = source.file_id.as_str();

        tracing::info!(
            file_id,
            filename = %source.filename,
            format = source.format.as_str(),
            bytes = data.len(),
            "ingest started"
        );
        self.tracker.update(
            file_id,
            IngestStage::Started,
            100.0,
            &format!("Processing {}", source.filename),
        );

        // Raw bytes into pages or a table
        self.tracker
            .update(file_id, IngestStage::Reading, 0.0, "Reading file contents");
        let content = self.extractor.extract(source, data)?;
        self.tracker
            .update(file_id, IngestStage::Reading, 100.0, "File contents read");

        self.tracker.update(
            file_id,
            IngestStage::Analyzing,
            100.0,
            &describe_content(&content),
        );

        let chunking_started = Instant::now();
        self.tracker
            .update(file_id, IngestStage::Chunking, 0.0, "Chunking content");
        let chunks = self.chunker.chunk(source, &content);
        let chunking_time = chunking_started.elapsed().as_secs_f64();
        self.tracker.update(
            file_id,
            IngestStage::Chunking,
            100.0,
            &format!("Created {} chunks", chunks.len()),
        );

        self.tracker.update(
            file_id,
            IngestStage::VectorizingPrep,
            100.0,
            "Preparing embedding batches",
        );

        let vectorization_started = Instant::now();
        let written = self.batcher.run(chunks, &self.tracker, file_id).await?;
        let vectorization_time = vectorization_started.elapsed().as_secs_f64();

        // Make the scope fields filterable before the job is reported done
        self.tracker
            .update(file_id, IngestStage::Finalizing, 0.0, "Finalizing index");
        self.index
            .ensure_index(self.dimensions, &[ScopeField::FileId, ScopeField::SessionId])
            .await?;
        self.tracker
            .update(file_id, IngestStage::Finalizing, 100.0, "Index ready");

        let total_time = total_started.elapsed().as_secs_f64();
        let rate = if total_time > 0.0 {
            written as f64 / total_time
        } else {
            0.0
        };

        self.tracker.update(
            file_id,
            IngestStage::Completed,
            100.0,
            &format!("Ingested {} chunks from {}", written, source.filename),
        );
        tracing::info!(
            file_id,
            chunks = written,
            elapsed_s = format!("{:.2}", total_time),
            "ingest complete"
        );

        Ok(IngestSummary {
            status: "success".to_string(),
            file_type: source.format.as_str().to_string(),
            chunks_created: written,
            chunking_time_seconds: round2(chunking_time),
            vectorization_time_seconds: round2(vectorization_time),
            total_processing_time_seconds: round2(total_time),
            processing_rate: round2(rate),
            message: format!("Successfully processed {}", source.filename),
        })
    }
}

fn describe_content(content: &ExtractedContent) -> String {
    match content {
        ExtractedContent::Pages(pages) => format!("Analyzed {} pages", pages.len()),
        ExtractedContent::Table(matrix) => format!(
            "Analyzed {} rows x {} columns",
            matrix.row_count(),
            matrix.col_count()
        ),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
