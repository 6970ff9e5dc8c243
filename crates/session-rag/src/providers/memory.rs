//! In-process vector index
//!
//! Backs tests and single-node runs where an external index isn't wanted.

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::Result;
use crate::types::VectorRecord;

use super::vector_index::{ScopeField, VectorIndex};

/// Vector index held in memory behind a read/write lock.
#[derive(Default)]
pub struct MemoryVectorIndex {
    records: RwLock<Vec<VectorRecord>>,
}

impl MemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

fn scope_value<'a>(record: &'a VectorRecord, field: ScopeField) -> &'a str {
    match field {
        ScopeField::FileId => &record.file_id,
        ScopeField::SessionId => &record.session_id,
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn bulk_insert(&self, records: &[VectorRecord]) -> Result<()> {
        self.records.write().extend_from_slice(records);
        Ok(())
    }

    async fn delete_by(&self, field: ScopeField, value: &str) -> Result<usize> {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|r| scope_value(r, field) != value);
        let removed = before - records.len();

        if removed > 0 {
            tracing::debug!(field = %field, value, removed, "deleted records from memory index");
        }
        Ok(removed)
    }

    async fn count_by(&self, field: ScopeField, value: &str) -> Result<usize> {
        let records = self.records.read();
        Ok(records
            .iter()
            .filter(|r| scope_value(r, field) == value)
            .count())
    }

    async fn ensure_index(&self, _dimensions: usize, _fields: &[ScopeField]) -> Result<()> {
        // Nothing to create; scoped scans filter in place
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.records.read().len())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
