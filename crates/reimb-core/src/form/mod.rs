//! Expense form field extraction module.

mod parser;
pub mod rules;

pub use parser::{parse_expense_form, ExpenseFormParser, ExtractionResult, ParseWarning};

/// Trait for turning recognized text into an expense form.
///
/// Parsing never fails: fields that cannot be read are reported as absent
/// with zero confidence and a [`ParseWarning`].
pub trait FormParser: Send + Sync {
    /// Parse a form from recognized text.
    fn parse(&self, text: &str) -> ExtractionResult;
}
