//! Provider abstractions for embeddings and vector index backends
//!
//! Trait seams allow swapping the embedding backend and the index backend
//! independently; tests plug in scripted implementations at the same seams.

pub mod embedding;
pub mod memory;
pub mod openai;
pub mod qdrant;
pub mod vector_index;

pub use embedding::EmbeddingProvider;
pub use memory::MemoryVectorIndex;
pub use openai::OpenAiEmbedder;
pub use qdrant::QdrantIndex;
pub use vector_index::{ScopeField, VectorIndex};
