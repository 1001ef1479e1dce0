//! Per-file load → recognize → extract pipeline.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{OcrError, ReimbError, Result};
use crate::form::{ExpenseFormParser, FormParser, ParseWarning};
use crate::input::{Payload, SourceFile};
use crate::models::form::ExtractedForm;
use crate::ocr::{OcrProvider, OcrSession, DEFAULT_LANGUAGE};

use super::progress::{remap_engine_progress, ProgressReporter, DONE, LOADED, RECOGNIZED};

/// Final result for one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedFile {
    pub file_name: String,
    pub data: ExtractedForm,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ParseWarning>,
}

/// Drives one file at a time through recognition and extraction.
///
/// Cloning is cheap; every `process` call acquires its own OCR session, so
/// clones can run on separate threads without coordination.
#[derive(Clone)]
pub struct FileProcessor {
    provider: Arc<dyn OcrProvider>,
    parser: Arc<dyn FormParser>,
    language: String,
}

impl FileProcessor {
    pub fn new(provider: Arc<dyn OcrProvider>) -> Self {
        Self {
            provider,
            parser: Arc::new(ExpenseFormParser::new()),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Set the language hint passed to the engine.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Replace the form parser.
    pub fn with_parser(mut self, parser: Arc<dyn FormParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Process a single file.
    ///
    /// `on_progress` receives a strictly increasing sequence in 0..=100 that
    /// ends at 100 on success. Cancellation is honoured before each of the
    /// three steps. The OCR session is terminated before this returns, on
    /// every path that acquired one.
    pub fn process(
        &self,
        file: &SourceFile,
        on_progress: impl FnMut(u8),
        cancel: &CancellationToken,
    ) -> Result<ProcessedFile> {
        let start = Instant::now();
        let mut progress = ProgressReporter::new(on_progress);

        info!("Processing {} ({})", file.name, file.kind);

        // Step 1: load
        progress.report(0);
        ensure_not_cancelled(cancel)?;
        let payload = file.load()?;
        progress.report(LOADED);

        // Step 2: recognize
        ensure_not_cancelled(cancel)?;
        let mut session = SessionGuard::new(self.provider.acquire(&self.language)?);
        debug!("Acquired {} session for {}", self.provider.name(), file.name);

        let recognized =
            session.recognize(&payload, &mut |p| progress.report(remap_engine_progress(p)));
        drop(session);

        let text = recognized.inspect_err(|e| warn!("Recognition failed for {}: {}", file.name, e))?;
        progress.report(RECOGNIZED);
        debug!("Recognized {} characters from {}", text.chars().count(), file.name);

        // Step 3: extract
        ensure_not_cancelled(cancel)?;
        let result = self.parser.parse(&text);
        progress.report(DONE);

        info!(
            "Finished {} in {}ms ({} warnings)",
            file.name,
            start.elapsed().as_millis(),
            result.warnings.len()
        );

        Ok(ProcessedFile {
            file_name: file.name.clone(),
            data: result.form,
            warnings: result.warnings,
        })
    }
}

fn ensure_not_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(ReimbError::Cancelled);
    }
    Ok(())
}

/// Terminates the wrapped session when dropped, including during unwinding.
struct SessionGuard(Option<Box<dyn OcrSession>>);

impl SessionGuard {
    fn new(session: Box<dyn OcrSession>) -> Self {
        Self(Some(session))
    }

    fn recognize(
        &mut self,
        payload: &Payload,
        progress: &mut dyn FnMut(u8),
    ) -> std::result::Result<String, OcrError> {
        match self.0.as_mut() {
            Some(session) => session.recognize(payload, progress),
            None => Err(OcrError::Recognition(
                "session already released".to_string(),
            )),
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Some(session) = self.0.take() {
            session.terminate();
        }
    }
}
