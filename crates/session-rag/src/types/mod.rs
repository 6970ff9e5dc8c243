//! Core data types shared across the pipeline

pub mod document;
pub mod record;
pub mod response;

pub use document::{
    Chunk, ChunkLocation, ExtractedContent, PageText, SourceFile, SourceFormat, TableMatrix,
};
pub use record::{hash_content, VectorRecord};
pub use response::{
    FileDeleteResponse, HealthResponse, IngestSummary, ProgressSnapshot, SessionDeleteResponse,
};
