//! Vector records: the persisted form of a chunk plus its embedding

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use uuid::Uuid;

use super::document::{Chunk, ChunkLocation};

/// A chunk paired with its embedding, as stored in the vector index.
///
/// Every record gets a fresh v4 id at construction, so re-ingesting the
/// same file appends new records instead of overwriting old ones. Records
/// are removed only through the lifecycle manager, by `file_id` or by
/// `session_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Generated unique id
    pub id: Uuid,
    /// Fixed-length embedding; dimensionality comes from the model in use
    pub embedding: Vec<f32>,
    pub content: String,
    pub file_id: String,
    pub session_id: String,
    pub filename: String,
    pub mime_type: String,
    pub chunk_index: u32,
    pub location: ChunkLocation,
    /// SHA-256 of the content, kept in the payload for diagnostics
    pub content_hash: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl VectorRecord {
    /// Build a record from a chunk and its embedding
    pub fn from_chunk(chunk: &Chunk, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            embedding,
            content: chunk.content.clone(),
            file_id: chunk.file_id.clone(),
            session_id: chunk.session_id.clone(),
            filename: chunk.filename.clone(),
            mime_type: chunk.mime_type.clone(),
            chunk_index: chunk.chunk_index,
            location: chunk.location,
            content_hash: hash_content(&chunk.content),
            created_at: chrono::Utc::now(),
        }
    }

    /// Flatten everything except the embedding into an index payload
    pub fn payload(&self) -> HashMap<String, serde_json::Value> {
        let mut payload = HashMap::new();
        payload.insert("content".to_string(), serde_json::json!(self.content));
        payload.insert("file_id".to_string(), serde_json::json!(self.file_id));
        payload.insert("session_id".to_string(), serde_json::json!(self.session_id));
        payload.insert("filename".to_string(), serde_json::json!(self.filename));
        payload.insert("mime_type".to_string(), serde_json::json!(self.mime_type));
        payload.insert("chunk_index".to_string(), serde_json::json!(self.chunk_index));
        payload.insert("content_hash".to_string(), serde_json::json!(self.content_hash));
        payload.insert(
            "created_at".to_string(),
            serde_json::json!(self.created_at.to_rfc3339()),
        );

        match self.location {
            ChunkLocation::Page { page_number } => {
                payload.insert("page_number".to_string(), serde_json::json!(page_number));
            }
            ChunkLocation::Rows { row_start, row_end } => {
                payload.insert("row_start".to_string(), serde_json::json!(row_start));
                payload.insert("row_end".to_string(), serde_json::json!(row_end));
            }
            ChunkLocation::Table {
                row_start,
                row_end,
                col_start,
                col_end,
            } => {
                payload.insert("row_start".to_string(), serde_json::json!(row_start));
                payload.insert("row_end".to_string(), serde_json::json!(row_end));
                payload.insert("col_start".to_string(), serde_json::json!(col_start));
                payload.insert("col_end".to_string(), serde_json::json!(col_end));
            }
            ChunkLocation::Whole => {}
        }

        payload
    }
}

/// SHA-256 hex digest of chunk content
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceFile;

    #[test]
    fn fresh_id_per_record() {
        let source = SourceFile::new("f1", "s1", "a.csv", None).unwrap();
        let chunk = Chunk::new(&source, "same".to_string(), ChunkLocation::Whole, 0);

        let a = VectorRecord::from_chunk(&chunk, vec![0.1, 0.2]);
        let b = VectorRecord::from_chunk(&chunk, vec![0.1, 0.2]);
        assert_ne!(a.id, b.id);
        assert_eq!(a.content_hash, b.content_hash);
    }

    #[test]
    fn payload_carries_scope_and_location() {
        let source = SourceFile::new("file-9", "sess-3", "b.pdf", None).unwrap();
        let chunk = Chunk::new(
            &source,
            "page text".to_string(),
            ChunkLocation::Page { page_number: 4 },
            2,
        );
        let record = VectorRecord::from_chunk(&chunk, vec![0.0; 4]);

        let payload = record.payload();
        assert_eq!(payload["file_id"], serde_json::json!("file-9"));
        assert_eq!(payload["session_id"], serde_json::json!("sess-3"));
        assert_eq!(payload["page_number"], serde_json::json!(4));
        assert!(!payload.contains_key("row_start"));
    }

    #[test]
    fn hash_is_stable_hex() {
        let h = hash_content("hello");
        assert_eq!(h.len(), 64);
        assert_eq!(h, hash_content("hello"));
        assert_ne!(h, hash_content("hello "));
    }
}
