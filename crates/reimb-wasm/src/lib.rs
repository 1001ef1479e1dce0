//! WASM bindings for expense report extraction.
//!
//! OCR runs in the browser; these bindings take the recognized text (or the
//! engine's text boxes) and turn it into structured, exportable records.

use wasm_bindgen::prelude::*;

use reimb_core::export::{to_csv_string, ExpenseSummary};
use reimb_core::models::form::{ExtractedForm, FieldId};
use reimb_core::ocr::{OcrResult, TextBox};
use reimb_core::{validate_file_type, ExpenseFormParser, FormParser, ProcessedFile};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn from_js<T: serde::de::DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Extract an expense form from recognized text.
#[wasm_bindgen]
pub fn parse_expense_form(text: &str) -> Result<JsValue, JsValue> {
    to_js(&reimb_core::parse_expense_form(text))
}

/// Check a file name and declared MIME type against the accepted formats.
#[wasm_bindgen]
pub fn is_valid_file_type(file_name: &str, mime: Option<String>) -> bool {
    validate_file_type(file_name, mime.as_deref()).is_ok()
}

/// Check a browser `File` before queueing it.
#[wasm_bindgen]
pub fn is_valid_file(file: &web_sys::File) -> bool {
    let mime = file.type_();
    let mime = (!mime.is_empty()).then_some(mime);
    match validate_file_type(&file.name(), mime.as_deref()) {
        Ok(_) => true,
        Err(e) => {
            web_sys::console::warn_1(&JsValue::from_str(&e.to_string()));
            false
        }
    }
}

/// Render `{ fileName, data }` records as CSV with a byte-order mark.
#[wasm_bindgen]
pub fn export_csv(results: JsValue) -> Result<String, JsValue> {
    let results: Vec<ProcessedFile> = from_js(results)?;
    to_csv_string(&results).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Totals, averages and shares over `{ fileName, data }` records.
#[wasm_bindgen]
pub fn summarize(results: JsValue) -> Result<JsValue, JsValue> {
    let results: Vec<ProcessedFile> = from_js(results)?;
    to_js(&ExpenseSummary::from_results(&results))
}

/// Expense form extractor class for browser use.
#[wasm_bindgen]
pub struct FormExtractor {
    parser: ExpenseFormParser,
    review_threshold: f64,
}

#[wasm_bindgen]
impl FormExtractor {
    /// Create a new extractor.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            parser: ExpenseFormParser::new(),
            review_threshold: 0.85,
        }
    }

    /// Confidence below which a field is flagged for review.
    #[wasm_bindgen]
    pub fn set_review_threshold(&mut self, threshold: f64) {
        self.review_threshold = threshold;
    }

    /// Extract the form only.
    #[wasm_bindgen]
    pub fn extract(&self, text: &str) -> Result<JsValue, JsValue> {
        to_js(&self.parser.parse(text).form)
    }

    /// Extract the form along with warnings and the fields needing review.
    #[wasm_bindgen]
    pub fn extract_with_metadata(&self, text: &str) -> Result<JsValue, JsValue> {
        let result = self.parser.parse(text);

        #[derive(serde::Serialize)]
        #[serde(rename_all = "camelCase")]
        struct ExtractResult {
            form: ExtractedForm,
            warnings: Vec<String>,
            review_fields: Vec<FieldId>,
            processing_time_ms: u64,
        }

        let output = ExtractResult {
            review_fields: result.form.low_confidence_fields(self.review_threshold),
            warnings: result.warnings.iter().map(|w| w.to_string()).collect(),
            processing_time_ms: result.processing_time_ms,
            form: result.form,
        };

        to_js(&output)
    }

    /// Keys of the fields in `form` that need review.
    #[wasm_bindgen]
    pub fn review_fields(&self, form: JsValue) -> Result<js_sys::Array, JsValue> {
        let form: ExtractedForm = from_js(form)?;
        Ok(form
            .low_confidence_fields(self.review_threshold)
            .into_iter()
            .map(|f| JsValue::from_str(f.key()))
            .collect())
    }

    /// Apply a reviewer's edit to one field and return the updated form.
    #[wasm_bindgen]
    pub fn correct(&self, form: JsValue, field: &str, value: &str) -> Result<JsValue, JsValue> {
        let form: ExtractedForm = from_js(form)?;
        let field: FieldId = field.parse().map_err(|e: reimb_core::ReimbError| {
            JsValue::from_str(&e.to_string())
        })?;
        let corrected = form
            .with_correction(field, value)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        to_js(&corrected)
    }
}

impl Default for FormExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Text boxes from a browser-side OCR engine, collected for extraction.
#[wasm_bindgen]
pub struct RecognizedText {
    boxes: Vec<TextBox>,
    width: u32,
    height: u32,
}

#[wasm_bindgen]
impl RecognizedText {
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            boxes: Vec::new(),
            width,
            height,
        }
    }

    /// Add a text box given its four corners.
    #[wasm_bindgen]
    #[allow(clippy::too_many_arguments)]
    pub fn add_box(
        &mut self,
        text: &str,
        x1: f32, y1: f32,
        x2: f32, y2: f32,
        x3: f32, y3: f32,
        x4: f32, y4: f32,
        confidence: f32,
    ) {
        self.boxes.push(TextBox {
            text: text.to_string(),
            bbox: [x1, y1, x2, y2, x3, y3, x4, y4],
            confidence,
        });
    }

    /// Full text in reading order.
    #[wasm_bindgen]
    pub fn get_text(&self) -> String {
        OcrResult::new(self.boxes.clone(), 0, (self.width, self.height)).text
    }

    /// Extract an expense form from the collected boxes.
    #[wasm_bindgen]
    pub fn extract_form(&self) -> Result<JsValue, JsValue> {
        parse_expense_form(&self.get_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_is_valid_file_type() {
        assert!(is_valid_file_type("scan.JPG", None));
        assert!(is_valid_file_type("blob", Some("application/pdf".to_string())));
        assert!(!is_valid_file_type("notes.txt", Some("text/plain".to_string())));
    }

    #[wasm_bindgen_test]
    fn test_recognized_text_reading_order() {
        let mut recognized = RecognizedText::new(200, 100);
        recognized.add_box("部門: 研發部", 0.0, 40.0, 80.0, 40.0, 80.0, 55.0, 0.0, 55.0, 0.9);
        recognized.add_box("姓名: 王小明", 0.0, 0.0, 80.0, 0.0, 80.0, 15.0, 0.0, 15.0, 0.9);

        assert_eq!(recognized.get_text(), "姓名: 王小明\n部門: 研發部");
    }

    #[wasm_bindgen_test]
    fn test_version() {
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
    }
}
