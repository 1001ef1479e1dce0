//! Data models and configuration.

pub mod config;
pub mod form;
pub mod job;

pub use config::{ExportConfig, ExtractionConfig, OcrConfig, ReimbConfig};
pub use form::{ConfidenceLevel, ExtractedForm, FieldId, FieldValue};
pub use job::{FileJob, JobStatus};
