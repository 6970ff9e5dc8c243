//! OpenAI-compatible embedding provider
//!
//! Talks to any backend exposing the OpenAI `/embeddings` contract,
//! including Azure OpenAI and local gateways.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;

/// Batch embedding client for OpenAI-style endpoints.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    endpoint: String,
    models_endpoint: String,
    model: String,
    dimensions: usize,
    api_key: String,
}

impl OpenAiEmbedder {
    /// Create an embedder with an explicit API key.
    pub fn new(config: &EmbeddingConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let base = config.base_url.trim_end_matches('/');

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base),
            models_endpoint: format!("{}/models", base),
            model: config.model.clone(),
            dimensions: config.dimensions,
            api_key: api_key.into(),
        })
    }

    /// Create an embedder, reading the API key from the configured
    /// environment variable.
    pub fn from_env(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            Error::Config(format!(
                "embedding API key not found in ${}",
                config.api_key_env
            ))
        })?;
        Self::new(config, api_key)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: self.dimensions,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!(
                "embedding backend returned {}: {}",
                status, body
            )));
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("failed to parse embedding response: {}", e)))?;

        if parsed.data.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "backend returned {} embeddings for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }

        // The API may return entries out of order; restore input order
        parsed.data.sort_by_key(|entry| entry.index);

        for entry in &parsed.data {
            if entry.embedding.len() != self.dimensions {
                return Err(Error::Embedding(format!(
                    "embedding {} has {} dimensions, expected {}",
                    entry.index,
                    entry.embedding.len(),
                    self.dimensions
                )));
            }
        }

        Ok(parsed
            .data
            .into_iter()
            .map(|entry| entry.embedding)
            .collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(&self.models_endpoint)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("embedding health check failed: {}", e)))?;
        Ok(response.status().is_success())
    }

    fn name(&self) -> &str {
        "openai"
    }
}
