//! Configuration for the ingestion pipeline

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Main pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Embedding service configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Vector index configuration
    #[serde(default)]
    pub index: VectorIndexConfig,
    /// Progress tracker configuration
    #[serde(default)]
    pub progress: ProgressConfig,
}

impl IngestConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("invalid config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve configuration from the environment.
    ///
    /// Checks `SESSION_RAG_CONFIG` for an explicit path, then
    /// `session-rag.toml` in the working directory, then falls back to
    /// defaults.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = std::env::var("SESSION_RAG_CONFIG") {
            return Self::load(path);
        }
        let default_path = Path::new("session-rag.toml");
        if default_path.exists() {
            return Self::load(default_path);
        }
        Ok(Self::default())
    }

    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.embedding.batch_size == 0 {
            return Err(Error::Config("embedding.batch_size must be > 0".into()));
        }
        if self.embedding.dimensions == 0 {
            return Err(Error::Config("embedding.dimensions must be > 0".into()));
        }
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunking.chunk_size must be > 0".into()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(
                "chunking.chunk_overlap must be smaller than chunking.chunk_size".into(),
            ));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum upload size in megabytes
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
}

impl ServerConfig {
    /// Maximum upload size in bytes, for the request body limit
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8600
}

fn default_max_upload_mb() -> usize {
    50
}

/// Embedding service configuration (OpenAI-compatible endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL of the embeddings API
    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,
    /// Model name sent with every request
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Embedding dimensions (3072 for text-embedding-3-large)
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
    /// Chunks per embedding call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Per-call timeout in seconds
    #[serde(default = "default_embed_timeout")]
    pub timeout_secs: u64,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_embedding_base_url(),
            model: default_embedding_model(),
            dimensions: default_dimensions(),
            batch_size: default_batch_size(),
            timeout_secs: default_embed_timeout(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_embedding_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-large".to_string()
}

fn default_dimensions() -> usize {
    3072
}

fn default_batch_size() -> usize {
    100
}

fn default_embed_timeout() -> u64 {
    60
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target prose chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Overlap between consecutive prose chunks in characters
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    /// Row-window size for mid-sized tables
    #[serde(default = "default_rows_per_window")]
    pub rows_per_window: usize,
    /// Tables up to this many rows become a single chunk
    #[serde(default = "default_small_table_rows")]
    pub small_table_rows: usize,
    /// Tables above this many rows use the adaptive row divisor
    #[serde(default = "default_large_table_rows")]
    pub large_table_rows: usize,
    /// Divisor for the adaptive target chunk count (rows / divisor)
    #[serde(default = "default_row_divisor")]
    pub row_divisor: usize,
    /// Column count above which row windows split into column groups
    #[serde(default = "default_wide_table_cols")]
    pub wide_table_cols: usize,
    /// Columns per group for wide tables
    #[serde(default = "default_col_group_size")]
    pub col_group_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            rows_per_window: default_rows_per_window(),
            small_table_rows: default_small_table_rows(),
            large_table_rows: default_large_table_rows(),
            row_divisor: default_row_divisor(),
            wide_table_cols: default_wide_table_cols(),
            col_group_size: default_col_group_size(),
        }
    }
}

fn default_chunk_size() -> usize {
    1048
}

fn default_chunk_overlap() -> usize {
    100
}

fn default_rows_per_window() -> usize {
    100
}

fn default_small_table_rows() -> usize {
    100
}

fn default_large_table_rows() -> usize {
    1000
}

fn default_row_divisor() -> usize {
    10
}

fn default_wide_table_cols() -> usize {
    20
}

fn default_col_group_size() -> usize {
    10
}

/// Vector index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndexConfig {
    /// Backend selection
    #[serde(default)]
    pub backend: IndexBackend,
    /// Base URL for remote backends
    #[serde(default = "default_index_url")]
    pub url: String,
    /// Collection holding the session chunks
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Per-call timeout in seconds
    #[serde(default = "default_index_timeout")]
    pub timeout_secs: u64,
    /// Environment variable holding an optional backend API key
    #[serde(default = "default_index_api_key_env")]
    pub api_key_env: String,
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        Self {
            backend: IndexBackend::default(),
            url: default_index_url(),
            collection: default_collection(),
            timeout_secs: default_index_timeout(),
            api_key_env: default_index_api_key_env(),
        }
    }
}

fn default_index_url() -> String {
    "http://localhost:6333".to_string()
}

fn default_collection() -> String {
    "session_chunks".to_string()
}

fn default_index_timeout() -> u64 {
    30
}

fn default_index_api_key_env() -> String {
    "QDRANT_API_KEY".to_string()
}

/// Vector index backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    /// Process-local index, useful for development and tests
    #[default]
    Memory,
    /// Qdrant over REST
    Qdrant,
}

/// Progress tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Entries older than this (since last update) are evicted
    #[serde(default = "default_progress_ttl")]
    pub ttl_secs: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_progress_ttl(),
        }
    }
}

fn default_progress_ttl() -> u64 {
    3600
}
