//! File extraction, text normalization, and chunking

mod chunker;
mod extract;
pub mod normalize;

pub use chunker::Chunker;
pub use extract::Extractor;
