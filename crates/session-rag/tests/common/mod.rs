//! Shared fixtures for the integration tests

#![allow(dead_code)] // not every test binary uses every fixture

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use session_rag::config::IngestConfig;
use session_rag::error::{Error, Result};
use session_rag::{EmbeddingProvider, SourceFile};

/// Deterministic in-process embedder: the same text always maps to the
/// same vector, and every call is counted.
pub struct TestEmbedder {
    dimensions: usize,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl TestEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Embedder that sleeps on every call, to force jobs to interleave.
    pub fn with_delay(dimensions: usize, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(dimensions)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let seed = text
            .bytes()
            .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
        (0..self.dimensions)
            .map(|i| (seed.wrapping_add(i as u32) % 1000) as f32 / 1000.0)
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for TestEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "test"
    }
}

/// Embedder that fails one specific call (1-based) and succeeds otherwise.
pub struct FlakyEmbedder {
    inner: TestEmbedder,
    fail_on_call: usize,
}

impl FlakyEmbedder {
    pub fn failing_on(dimensions: usize, fail_on_call: usize) -> Self {
        Self {
            inner: TestEmbedder::new(dimensions),
            fail_on_call,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for FlakyEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let call = self.inner.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on_call {
            return Err(Error::embedding("synthetic embedding failure"));
        }
        Ok(texts.iter().map(|t| self.inner.embed_one(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

/// Embedder that completes `open_calls` batches, then parks every further
/// call until [`release`](GatedEmbedder::release) opens the gate.
pub struct GatedEmbedder {
    inner: TestEmbedder,
    open_calls: usize,
    gate: Semaphore,
}

impl GatedEmbedder {
    pub fn open_for(dimensions: usize, open_calls: usize) -> Self {
        Self {
            inner: TestEmbedder::new(dimensions),
            open_calls,
            gate: Semaphore::new(0),
        }
    }

    /// Let every parked and future call proceed.
    pub fn release(&self) {
        self.gate.add_permits(Semaphore::MAX_PERMITS / 2);
    }
}

#[async_trait]
impl EmbeddingProvider for GatedEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let call = self.inner.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call > self.open_calls {
            let _permit = self
                .gate
                .acquire()
                .await
                .map_err(|_| Error::embedding("gate closed"))?;
        }
        Ok(texts.iter().map(|t| self.inner.embed_one(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "gated"
    }
}

/// Config tuned for tests: tiny vectors, everything else at defaults.
pub fn test_config() -> IngestConfig {
    let mut config = IngestConfig::default();
    config.embedding.dimensions = 8;
    config
}

/// CSV bytes with one header row and `rows` data rows.
pub fn csv_bytes(rows: usize, cols: usize) -> Vec<u8> {
    let mut out = String::new();
    let header: Vec<String> = (0..cols).map(|c| format!("col{}", c)).collect();
    out.push_str(&header.join(","));
    out.push('\n');
    for r in 0..rows {
        let row: Vec<String> = (0..cols).map(|c| format!("r{}c{}", r, c)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out.into_bytes()
}

pub fn source(file_id: &str, session_id: &str, filename: &str) -> SourceFile {
    SourceFile::new(file_id, session_id, filename, None).expect("supported filename")
}
