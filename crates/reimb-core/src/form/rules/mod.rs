//! Rule-based field extractors for expense forms.

pub mod amounts;
pub mod dates;
pub mod patterns;

pub use amounts::{format_amount, parse_amount};
pub use dates::{normalize_date, to_naive_date};
pub use patterns::{rule_for, FIELD_RULES};

use regex::Regex;
use tracing::trace;

use crate::models::form::FieldId;

/// Confidence of the primary candidate.
pub const PRIMARY_CONFIDENCE: f64 = 0.95;

/// Confidence lost per candidate rank.
pub const RANK_PENALTY: f64 = 0.05;

/// Confidence assigned to a match from the candidate at `rank` (zero-based).
///
/// Rounded to hundredths so rank 1 is exactly 0.9.
pub fn rank_confidence(rank: usize) -> f64 {
    let raw = (PRIMARY_CONFIDENCE - RANK_PENALTY * rank as f64).max(0.0);
    (raw * 100.0).round() / 100.0
}

/// Ordered candidate patterns for one field.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: FieldId,
    /// Tried in order; the first match wins.
    pub candidates: Vec<Regex>,
}

impl FieldRule {
    pub fn new(field: FieldId, candidates: Vec<Regex>) -> Self {
        Self { field, candidates }
    }

    /// Find the first candidate whose capture group 1 matches.
    pub fn find(&self, text: &str) -> Option<ExtractionMatch<String>> {
        self.candidates.iter().enumerate().find_map(|(rank, re)| {
            let caps = re.captures(text)?;
            let group = caps.get(1).filter(|m| !m.as_str().is_empty())?;
            trace!("{} matched candidate {}: {:?}", self.field, rank, group.as_str());
            Some(
                ExtractionMatch::new(group.as_str().to_string(), rank_confidence(rank), rank)
                    .with_position(group.start(), group.end()),
            )
        })
    }
}

/// A matched value with its confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f64,
    /// Index of the candidate that matched.
    pub rank: usize,
    /// Byte span of the captured value in the source text.
    pub position: Option<(usize, usize)>,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f64, rank: usize) -> Self {
        Self {
            value,
            confidence,
            rank,
            position: None,
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ExtractionMatch<U> {
        ExtractionMatch {
            value: f(self.value),
            confidence: self.confidence,
            rank: self.rank,
            position: self.position,
        }
    }
}
