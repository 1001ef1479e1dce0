//! Rule-based expense form parser.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::form::{ExtractedForm, FieldId, FieldValue};

use super::rules::{
    normalize_date, parse_amount, rule_for, to_naive_date, ExtractionMatch, FIELD_RULES,
};
use super::FormParser;

/// Soft, non-fatal extraction problem. Carried as data, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseWarning {
    /// No candidate pattern matched the field.
    Unmatched { field: FieldId },
    /// A monetary field matched but its digits could not be read.
    InvalidAmount { field: FieldId, raw: String },
    /// The date matched but is not a real calendar date. The value is kept.
    ImplausibleDate { raw: String },
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarning::Unmatched { field } => {
                write!(f, "could not find {} ({})", field, field.label())
            }
            ParseWarning::InvalidAmount { field, raw } => {
                write!(f, "unreadable amount for {}: {}", field, raw)
            }
            ParseWarning::ImplausibleDate { raw } => write!(f, "implausible date: {}", raw),
        }
    }
}

/// Result of form extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Extracted form data.
    pub form: ExtractedForm,
    /// Extraction warnings.
    pub warnings: Vec<ParseWarning>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Expense form parser driven by the static pattern table.
#[derive(Debug, Clone, Default)]
pub struct ExpenseFormParser;

impl ExpenseFormParser {
    pub fn new() -> Self {
        Self
    }

    /// Extract and post-process a single field.
    ///
    /// Returns the value (if any) and its confidence, plus an optional warning.
    pub fn extract_field(
        &self,
        field: FieldId,
        text: &str,
    ) -> (Option<ExtractionMatch<FieldValue>>, Option<ParseWarning>) {
        let Some(rule) = rule_for(field) else {
            return (None, Some(ParseWarning::Unmatched { field }));
        };
        let Some(m) = rule.find(text) else {
            return (None, Some(ParseWarning::Unmatched { field }));
        };

        if field.is_monetary() {
            return match parse_amount(&m.value) {
                Some(amount) => (Some(m.map(|_| FieldValue::Amount(amount))), None),
                None => {
                    let raw = m.value;
                    (None, Some(ParseWarning::InvalidAmount { field, raw }))
                }
            };
        }

        if field == FieldId::Date {
            let normalized = normalize_date(&m.value);
            let warning = to_naive_date(&normalized)
                .is_none()
                .then(|| ParseWarning::ImplausibleDate { raw: m.value.clone() });
            return (Some(m.map(|_| FieldValue::Text(normalized))), warning);
        }

        (Some(m.map(|v| FieldValue::Text(v.trim().to_string()))), None)
    }
}

impl FormParser for ExpenseFormParser {
    fn parse(&self, text: &str) -> ExtractionResult {
        let start = Instant::now();
        let mut form = ExtractedForm::empty();
        let mut warnings = Vec::new();

        info!("Parsing expense form from {} characters of text", text.len());

        for rule in FIELD_RULES.iter() {
            let (matched, warning) = self.extract_field(rule.field, text);

            match matched {
                Some(m) => {
                    debug!(
                        "Extracted {} = {} (rank {}, confidence {:.2})",
                        rule.field, m.value, m.rank, m.confidence
                    );
                    form.set(rule.field, Some(m.value), m.confidence);
                }
                None => form.set(rule.field, None, 0.0),
            }

            if let Some(warning) = warning {
                debug!("{}", warning);
                warnings.push(warning);
            }
        }

        ExtractionResult {
            form,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }
}

/// Parse recognized text with the default rule table.
pub fn parse_expense_form(text: &str) -> ExtractedForm {
    ExpenseFormParser::new().parse(text).form
}
