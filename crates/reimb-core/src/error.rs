//! Error types for the reimb-core library.

use thiserror::Error;

use crate::models::job::JobStatus;

/// Main error type for the reimb library.
#[derive(Error, Debug)]
pub enum ReimbError {
    /// The input file was rejected before processing started.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The input file could not be read into memory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The OCR engine failed.
    #[error("recognition error: {0}")]
    Recognition(#[from] OcrError),

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// CSV export error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A job was moved through an illegal state transition.
    #[error("invalid job transition: {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    /// A corrected field value does not fit the field type.
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Processing was cancelled between pipeline steps.
    #[error("processing cancelled")]
    Cancelled,
}

/// Errors raised while validating an upload, before a job exists.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Neither the MIME type nor the extension is an accepted format.
    #[error("unsupported file type for {file_name} (mime: {mime})")]
    UnsupportedType { file_name: String, mime: String },

    /// No file was provided.
    #[error("no file provided")]
    MissingFile,
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text detection failed.
    #[error("text detection failed: {0}")]
    Detection(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// The payload could not be turned into anything recognizable.
    #[error("unsupported payload: {0}")]
    UnsupportedPayload(String),
}

impl From<image::ImageError> for OcrError {
    fn from(err: image::ImageError) -> Self {
        OcrError::InvalidImage(err.to_string())
    }
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

impl From<PdfError> for OcrError {
    fn from(err: PdfError) -> Self {
        OcrError::UnsupportedPayload(err.to_string())
    }
}

/// Result type for the reimb library.
pub type Result<T> = std::result::Result<T, ReimbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_message() {
        let err = ReimbError::from(ValidationError::UnsupportedType {
            file_name: "notes.txt".to_string(),
            mime: "text/plain".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "validation error: unsupported file type for notes.txt (mime: text/plain)"
        );
    }

    #[test]
    fn test_ocr_error_converts_to_recognition() {
        let err: ReimbError = OcrError::Recognition("engine crashed".to_string()).into();
        assert!(matches!(err, ReimbError::Recognition(_)));
    }
}
