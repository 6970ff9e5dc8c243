//! Pipeline orchestration, progress tracking, and content lifecycle

pub mod progress;

mod batcher;
mod lifecycle;
mod pipeline;

pub use batcher::VectorBatcher;
pub use lifecycle::LifecycleManager;
pub use pipeline::IngestPipeline;
pub use progress::{IngestStage, JobProgress, ProgressTracker};
