//! Per-upload job tracking for callers of the pipeline.
//!
//! The pipeline itself only reports progress and a terminal result; callers
//! that display a queue of uploads keep a [`FileJob`] per file.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ReimbError, Result};

/// Lifecycle state of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    fn can_move_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Error)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// One upload and its progress through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileJob {
    pub id: String,
    pub file_name: String,
    /// Human-readable size, e.g. "1.5 KB".
    pub size: String,
    pub status: JobStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FileJob {
    /// Create a queued job.
    pub fn new(file_name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            id: format!("file_{}", Uuid::new_v4().simple()),
            file_name: file_name.into(),
            size: format_file_size(size_bytes),
            status: JobStatus::Queued,
            progress: 0,
            error: None,
            created_at: Utc::now(),
        }
    }

    pub fn start(&mut self) -> Result<()> {
        self.transition(JobStatus::Processing)?;
        self.progress = 0;
        Ok(())
    }

    /// Record a progress update. Ignored unless the job is processing.
    pub fn set_progress(&mut self, progress: u8) {
        if self.status == JobStatus::Processing {
            self.progress = progress.min(100);
        }
    }

    pub fn complete(&mut self) -> Result<()> {
        self.transition(JobStatus::Completed)?;
        self.progress = 100;
        Ok(())
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> Result<()> {
        self.transition(JobStatus::Error)?;
        self.progress = 0;
        self.error = Some(reason.into());
        Ok(())
    }

    fn transition(&mut self, next: JobStatus) -> Result<()> {
        if !self.status.can_move_to(next) {
            return Err(ReimbError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

/// Format a byte count with base-1024 units and at most two decimals.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut exp = 0;
    while value >= 1024.0 && exp < UNITS.len() - 1 {
        value /= 1024.0;
        exp += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;

    format!("{} {}", rounded, UNITS[exp])
}
