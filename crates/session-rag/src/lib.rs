//! session-rag: Session-scoped document ingestion and vector indexing
//!
//! This crate turns uploaded documents (PDF, CSV, XLSX) into embedded chunks in a
//! vector index, scoped to a session so that a session's data can be dropped as a
//! unit. It covers extraction, normalization, adaptive chunking, batched embedding
//! with live progress reporting, and cascading deletion by file or session.

pub mod config;
pub mod error;
pub mod ingestion;
pub mod processing;
pub mod providers;
pub mod server;
pub mod types;

pub use config::IngestConfig;
pub use error::{Error, Result};
pub use processing::{IngestPipeline, IngestStage, LifecycleManager, ProgressTracker};
pub use providers::{EmbeddingProvider, ScopeField, VectorIndex};
pub use types::{
    document::{Chunk, ChunkLocation, SourceFile, SourceFormat},
    record::VectorRecord,
    response::IngestSummary,
};
