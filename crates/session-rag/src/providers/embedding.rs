//! Embedding provider trait

use async_trait::async_trait;

use crate::error::Result;

/// Turns batches of text into fixed-dimension vectors.
///
/// Implementations:
/// - `OpenAiEmbedder`: OpenAI-compatible `/embeddings` endpoint
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts.
    ///
    /// The result has one vector per input, in input order, each with
    /// exactly [`dimensions`](Self::dimensions) components.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Vector width this provider produces
    fn dimensions(&self) -> usize;

    /// Check if the provider is reachable and configured
    async fn health_check(&self) -> Result<bool>;

    /// Provider name for logging
    fn name(&self) -> &str;
}
