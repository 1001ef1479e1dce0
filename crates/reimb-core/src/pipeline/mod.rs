//! File processing pipeline.

mod processor;
pub mod progress;

pub use processor::{FileProcessor, ProcessedFile};
pub use progress::{remap_engine_progress, ProgressReporter};
