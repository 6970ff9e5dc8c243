//! Batched embedding and bulk index writes

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

use serde_json::json;

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, VectorIndex};
use crate::types::{Chunk, VectorRecord};

use super::progress::{IngestStage, ProgressTracker};

/// Drives chunks through the embedding backend and into the index in
/// fixed-size batches.
///
/// One embedding call and one bulk insert per batch; a failed batch aborts
/// the job and already-written batches stay in the index.
pub struct VectorBatcher {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    batch_size: usize,
    embed_timeout: Duration,
}

impl VectorBatcher {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        config: &EmbeddingConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            batch_size: config.batch_size,
            embed_timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Embed and index every non-empty chunk, reporting per-batch progress.
    ///
    /// Returns the number of records written to the index.
    pub async fn run(
        &self,
        chunks: Vec<Chunk>,
        tracker: &ProgressTracker,
        file_id: &str,
    ) -> Result<usize> {
        let chunks: Vec<Chunk> = chunks
            .into_iter()
            .filter(|c| !c.content.is_empty())
            .collect();

        if chunks.is_empty() {
            tracing::info!(file_id, "no embeddable chunks, skipping vectorization");
            return Ok(0);
        }

        let total_chunks = chunks.len();
        let total_batches = (total_chunks + self.batch_size - 1) / self.batch_size;
        let started = Instant::now();
        let mut processed = 0usize;

        tracker.update_with_stats(
            file_id,
            IngestStage::Vectorizing,
            0.0,
            &format!(
                "Vectorizing {} chunks in {} batches",
                total_chunks, total_batches
            ),
            batch_stats(processed, total_chunks, 0, total_batches, &started),
        );

        for (batch_index, batch) in chunks.chunks(self.batch_size).enumerate() {
            let batch_num = batch_index + 1;
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();

            let embeddings =
                match timeout(self.embed_timeout, self.embedder.embed_batch(&texts)).await {
                    Ok(result) => result?,
                    Err(_) => {
                        return Err(Error::Embedding(format!(
                            "embedding batch {}/{} timed out after {}s",
                            batch_num,
                            total_batches,
                            self.embed_timeout.as_secs()
                        )));
                    }
                };

            if embeddings.len() != batch.len() {
                return Err(Error::Embedding(format!(
                    "batch {}/{} returned {} embeddings for {} chunks",
                    batch_num,
                    total_batches,
                    embeddings.len(),
                    batch.len()
                )));
            }

            let records: Vec<VectorRecord> = batch
                .iter()
                .zip(embeddings)
                .map(|(chunk, embedding)| VectorRecord::from_chunk(chunk, embedding))
                .collect();

            self.index.bulk_insert(&records).await?;
            processed += records.len();

            let pct = processed as f32 / total_chunks as f32 * 100.0;
            tracker.update_with_stats(
                file_id,
                IngestStage::Vectorizing,
                pct,
                &format!("Vectorized batch {}/{}", batch_num, total_batches),
                batch_stats(processed, total_chunks, batch_num, total_batches, &started),
            );
            tracing::debug!(
                file_id,
                batch = batch_num,
                total_batches,
                chunks = records.len(),
                "batch indexed"
            );
        }

        tracing::info!(
            file_id,
            chunks = processed,
            batches = total_batches,
            elapsed_s = format!("{:.2}", started.elapsed().as_secs_f64()),
            "vectorization complete"
        );
        Ok(processed)
    }
}

fn batch_stats(
    processed: usize,
    total_chunks: usize,
    current_batch: usize,
    total_batches: usize,
    started: &Instant,
) -> HashMap<String, serde_json::Value> {
    let elapsed = started.elapsed().as_secs_f64();

    let mut stats = HashMap::new();
    stats.insert("chunks_processed".to_string(), json!(processed));
    stats.insert("total_chunks".to_string(), json!(total_chunks));
    stats.insert("current_batch".to_string(), json!(current_batch));
    stats.insert("total_batches".to_string(), json!(total_batches));
    stats.insert("elapsed_seconds".to_string(), json!(round2(elapsed)));
    if processed > 0 {
        let eta = elapsed / processed as f64 * (total_chunks - processed) as f64;
        stats.insert("eta_seconds".to_string(), json!(round2(eta)));
    }
    stats
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MemoryVectorIndex;
    use crate::types::{ChunkLocation, SourceFile};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedEmbedder {
        dimensions: usize,
        calls: AtomicUsize,
        fail_on_call: Option<usize>,
        delay: Option<Duration>,
    }

    impl ScriptedEmbedder {
        fn new(dimensions: usize) -> Self {
            Self {
                dimensions,
                calls: AtomicUsize::new(0),
                fail_on_call: None,
                delay: None,
            }
        }

        fn failing_on(call: usize) -> Self {
            Self {
                fail_on_call: Some(call),
                ..Self::new(2)
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for ScriptedEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if Some(call) == self.fail_on_call {
                return Err(Error::Embedding("scripted failure".to_string()));
            }
            Ok(texts.iter().map(|_| vec![0.5; self.dimensions]).collect())
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn chunks(n: usize) -> Vec<Chunk> {
        let source = SourceFile::new("f1", "s1", "data.csv", None).unwrap();
        (0..n)
            .map(|i| {
                Chunk::new(
                    &source,
                    format!("row {}", i),
                    ChunkLocation::Whole,
                    i as u32,
                )
            })
            .collect()
    }

    fn config() -> EmbeddingConfig {
        EmbeddingConfig {
            batch_size: 100,
            timeout_secs: 60,
            ..EmbeddingConfig::default()
        }
    }

    fn tracker_for(source_chunks: &[Chunk]) -> ProgressTracker {
        let tracker = ProgressTracker::new();
        let source = SourceFile::new(
            source_chunks[0].file_id.clone(),
            source_chunks[0].session_id.clone(),
            source_chunks[0].filename.clone(),
            None,
        )
        .unwrap();
        tracker.start(&source);
        tracker
    }

    #[tokio::test]
    async fn splits_into_batches_of_one_hundred() {
        let embedder = Arc::new(ScriptedEmbedder::new(2));
        let index = Arc::new(MemoryVectorIndex::new());
        let batcher = VectorBatcher::new(embedder.clone(), index.clone(), &config());

        let input = chunks(250);
        let tracker = tracker_for(&input);
        let written = batcher.run(input, &tracker, "f1").await.unwrap();

        assert_eq!(written, 250);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
        assert_eq!(index.len().await.unwrap(), 250);

        let job = tracker.get("f1").unwrap();
        assert_eq!(job.stage, IngestStage::Vectorizing);
        assert_eq!(job.progress, 85.0);
        assert_eq!(job.stats.get("current_batch"), Some(&json!(3)));
        assert_eq!(job.stats.get("total_batches"), Some(&json!(3)));
        assert_eq!(job.stats.get("chunks_processed"), Some(&json!(250)));
        assert_eq!(job.stats.get("total_chunks"), Some(&json!(250)));
        assert!(job.stats.contains_key("elapsed_seconds"));
        assert!(job.stats.contains_key("eta_seconds"));
    }

    #[tokio::test]
    async fn empty_content_chunks_are_dropped_before_batching() {
        let embedder = Arc::new(ScriptedEmbedder::new(2));
        let index = Arc::new(MemoryVectorIndex::new());
        let batcher = VectorBatcher::new(embedder.clone(), index.clone(), &config());

        let mut input = chunks(3);
        input[1].content = String::new();
        let tracker = tracker_for(&input);
        let written = batcher.run(input, &tracker, "f1").await.unwrap();

        assert_eq!(written, 2);
        assert_eq!(index.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn all_empty_input_skips_the_backend() {
        let embedder = Arc::new(ScriptedEmbedder::new(2));
        let index = Arc::new(MemoryVectorIndex::new());
        let batcher = VectorBatcher::new(embedder.clone(), index.clone(), &config());

        let mut input = chunks(2);
        input[0].content = String::new();
        input[1].content = String::new();
        let tracker = tracker_for(&input);
        let written = batcher.run(input, &tracker, "f1").await.unwrap();

        assert_eq!(written, 0);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_batch_aborts_and_keeps_earlier_batches() {
        let embedder = Arc::new(ScriptedEmbedder::failing_on(2));
        let index = Arc::new(MemoryVectorIndex::new());
        let batcher = VectorBatcher::new(embedder.clone(), index.clone(), &config());

        let input = chunks(250);
        let tracker = tracker_for(&input);
        let err = batcher.run(input, &tracker, "f1").await.unwrap_err();

        assert!(matches!(err, Error::Embedding(_)), "got {:?}", err);
        // Batch 1 landed, batch 2 failed, batch 3 never ran
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
        assert_eq!(index.len().await.unwrap(), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_batch_times_out() {
        let embedder = Arc::new(ScriptedEmbedder {
            delay: Some(Duration::from_secs(120)),
            ..ScriptedEmbedder::new(2)
        });
        let index = Arc::new(MemoryVectorIndex::new());
        let batcher = VectorBatcher::new(embedder, index, &config());

        let input = chunks(5);
        let tracker = tracker_for(&input);
        let err = batcher.run(input, &tracker, "f1").await.unwrap_err();

        assert!(err.to_string().contains("timed out"), "got {}", err);
    }

    #[tokio::test]
    async fn each_record_gets_a_fresh_id() {
        let embedder = Arc::new(ScriptedEmbedder::new(2));
        let index = Arc::new(MemoryVectorIndex::new());
        let batcher = VectorBatcher::new(embedder, index.clone(), &config());

        let input = chunks(5);
        let tracker = tracker_for(&input);
        batcher.run(input, &tracker, "f1").await.unwrap();

        // Re-running the same content doubles the records instead of upserting
        let input = chunks(5);
        batcher.run(input, &tracker, "f1").await.unwrap();
        assert_eq!(index.len().await.unwrap(), 10);
    }
}
