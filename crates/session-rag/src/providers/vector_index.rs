//! Vector index trait for bulk writes and scoped deletes

use async_trait::async_trait;

use crate::error::Result;
use crate::types::VectorRecord;

/// Payload field a delete or count can be scoped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeField {
    FileId,
    SessionId,
}

impl ScopeField {
    /// Payload key name as stored in the index
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileId => "file_id",
            Self::SessionId => "session_id",
        }
    }
}

impl std::fmt::Display for ScopeField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Write-side interface to a vector index.
///
/// Implementations:
/// - `MemoryVectorIndex`: in-process store, for tests and local runs
/// - `QdrantIndex`: Qdrant over its REST API
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert a batch of records in one call
    async fn bulk_insert(&self, records: &[VectorRecord]) -> Result<()>;

    /// Delete every record whose `field` payload equals `value`.
    ///
    /// Returns the number of records removed; 0 when nothing matched.
    async fn delete_by(&self, field: ScopeField, value: &str) -> Result<usize>;

    /// Count records whose `field` payload equals `value`
    async fn count_by(&self, field: ScopeField, value: &str) -> Result<usize>;

    /// Make sure the index exists with the given vector width and has
    /// filterable indexes on `fields`. Tolerates the index already existing.
    async fn ensure_index(&self, dimensions: usize, fields: &[ScopeField]) -> Result<()>;

    /// Total number of records stored
    async fn len(&self) -> Result<usize>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Backend name for logging
    fn name(&self) -> &str;
}
