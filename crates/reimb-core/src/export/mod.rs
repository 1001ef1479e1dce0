//! CSV export and batch reporting.

mod csv;
mod summary;

pub use self::csv::{headers, to_csv_string, write_csv, FILE_NAME_HEADER, UTF8_BOM};
pub use summary::{CategoryTotal, ClaimantTotal, ExpenseSummary, CATEGORIES};
