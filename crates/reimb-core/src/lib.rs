//! Core library for expense-report digitization.
//!
//! This crate provides:
//! - Input validation for images and PDFs
//! - An OCR seam with a `pure-onnx-ocr` implementation
//! - Expense form field extraction with per-field confidence
//! - A per-file pipeline with progress reporting and cancellation
//! - CSV export and batch summaries

pub mod error;
pub mod export;
pub mod form;
pub mod input;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;

pub use error::{OcrError, ReimbError, Result, ValidationError};
pub use export::{to_csv_string, write_csv, ExpenseSummary};
pub use form::{parse_expense_form, ExpenseFormParser, ExtractionResult, FormParser, ParseWarning};
pub use input::{validate_file_type, MediaKind, Payload, SourceFile};
pub use models::{ConfidenceLevel, ExtractedForm, FieldId, FieldValue, FileJob, JobStatus, ReimbConfig};
pub use ocr::{OcrProvider, OcrSession};
#[cfg(feature = "native")]
pub use ocr::PureOcrProvider;
pub use pipeline::{FileProcessor, ProcessedFile};

/// Re-export of the cancellation token accepted by [`FileProcessor::process`].
pub use tokio_util::sync::CancellationToken;
