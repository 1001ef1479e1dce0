//! CSV export of processed forms.

use std::io::Write;

use crate::error::Result;
use crate::models::form::{ExtractedForm, FieldId};
use crate::pipeline::ProcessedFile;

/// UTF-8 byte-order mark, needed by common spreadsheet tools to detect the encoding.
pub const UTF8_BOM: &str = "\u{FEFF}";

/// Header of the file-name column.
pub const FILE_NAME_HEADER: &str = "檔案名稱";

/// Column headers: file name followed by every field label in canonical order.
pub fn headers() -> Vec<&'static str> {
    std::iter::once(FILE_NAME_HEADER)
        .chain(FieldId::ALL.iter().map(|f| f.label()))
        .collect()
}

fn row(file_name: &str, form: &ExtractedForm) -> Vec<String> {
    let mut row = Vec::with_capacity(FieldId::ALL.len() + 1);
    row.push(file_name.to_string());

    for field in FieldId::ALL {
        let cell = match form.value(field) {
            Some(value) => value.to_string(),
            None if field.is_monetary() => "0".to_string(),
            None => String::new(),
        };
        row.push(cell);
    }

    row
}

/// Write results as CSV, optionally prefixed with a UTF-8 byte-order mark.
pub fn write_csv<W: Write>(results: &[ProcessedFile], mut writer: W, include_bom: bool) -> Result<()> {
    if include_bom {
        writer.write_all(UTF8_BOM.as_bytes())?;
    }

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(headers())?;

    for result in results {
        wtr.write_record(row(&result.file_name, &result.data))?;
    }

    wtr.flush()?;
    Ok(())
}

/// Render results as a CSV string with a byte-order mark.
pub fn to_csv_string(results: &[ProcessedFile]) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(results, &mut buf, true)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::parse_expense_form;
    use pretty_assertions::assert_eq;

    fn processed(name: &str, text: &str) -> ProcessedFile {
        ProcessedFile {
            file_name: name.to_string(),
            data: parse_expense_form(text),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_csv_layout() {
        let results = vec![
            processed(
                "wang.png",
                "姓名: 王小明\n部門: 研發部\n日期: 2024-07-15\n交通費: NT$1,500\n總計: NT$1,500",
            ),
            processed("blank.jpg", ""),
        ];

        let csv = to_csv_string(&results).unwrap();
        assert!(csv.starts_with('\u{FEFF}'));

        let lines: Vec<&str> = csv.trim_start_matches('\u{FEFF}').lines().collect();
        assert_eq!(
            lines,
            vec![
                "檔案名稱,姓名,部門,日期,交通費,住宿費,餐費,其他,總計",
                "wang.png,王小明,研發部,2024/07/15,1500,0,0,0,1500",
                "blank.jpg,,,,0,0,0,0,0",
            ]
        );
    }

    #[test]
    fn test_csv_quotes_commas_in_text() {
        let mut result = processed("a.png", "");
        result.data = result
            .data
            .with_correction(FieldId::Name, "Wang, Xiaoming")
            .unwrap();

        let mut buf = Vec::new();
        write_csv(&[result], &mut buf, false).unwrap();
        let csv = String::from_utf8(buf).unwrap();

        assert!(csv.contains("\"Wang, Xiaoming\""));
        assert!(!csv.starts_with('\u{FEFF}'));
    }
}
