//! OCR engine seam.
//!
//! Recognition is delegated to an external engine. A provider hands out one
//! session per file; the session must be terminated exactly once, whether
//! recognition succeeded or not.

#[cfg(feature = "native")]
mod pure_engine;

#[cfg(feature = "native")]
pub use pure_engine::{PureOcrProvider, PureOcrSession};

use serde::{Deserialize, Serialize};

use crate::error::OcrError;
use crate::input::Payload;

/// Language hint used when none is configured: traditional Chinese plus English.
pub const DEFAULT_LANGUAGE: &str = "chi_tra+eng";

/// Maximum vertical offset, in pixels, between the tops of boxes on one line.
pub const LINE_TOLERANCE: f32 = 10.0;

/// Factory for OCR sessions.
pub trait OcrProvider: Send + Sync {
    /// Engine identifier for logs.
    fn name(&self) -> &str;

    /// Acquire a fresh engine instance for one file.
    fn acquire(&self, language: &str) -> Result<Box<dyn OcrSession>, OcrError>;
}

/// One acquired engine instance.
pub trait OcrSession {
    /// Recognize the text in `payload`, reporting engine progress in 0..=100.
    fn recognize(
        &mut self,
        payload: &Payload,
        progress: &mut dyn FnMut(u8),
    ) -> Result<String, OcrError>;

    /// Release the engine.
    fn terminate(self: Box<Self>);
}

/// A detected text box with its coordinates and content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Bounding box coordinates (x1, y1, x2, y2, x3, y3, x4, y4) for quadrilateral.
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub confidence: f32,
}

impl TextBox {
    /// Get the axis-aligned bounding rectangle.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }
}

/// Result of OCR processing on an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResult {
    /// Detected and recognized text boxes.
    pub boxes: Vec<TextBox>,

    /// Full text (boxes joined with newlines).
    pub text: String,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,

    /// Image dimensions (width, height).
    pub image_size: (u32, u32),
}

impl OcrResult {
    pub fn new(boxes: Vec<TextBox>, processing_time_ms: u64, image_size: (u32, u32)) -> Self {
        let mut result = Self {
            boxes,
            text: String::new(),
            processing_time_ms,
            image_size,
        };
        result.sort_by_reading_order();
        result
    }

    /// Sort boxes by reading order (top-to-bottom, left-to-right) and rebuild the text.
    ///
    /// A box whose top lies within [`LINE_TOLERANCE`] of the first box of the
    /// current line joins that line, so "交通費:" and "NT$1,500" detected
    /// separately stay on one line. Boxes on a line are joined with a space.
    pub fn sort_by_reading_order(&mut self) {
        let top = |b: &TextBox| b.rect().1;
        let left = |b: &TextBox| b.rect().0;

        let mut boxes = std::mem::take(&mut self.boxes);
        boxes.sort_by(|a, b| top(a).total_cmp(&top(b)));

        let mut lines: Vec<Vec<TextBox>> = Vec::new();
        let mut anchor = f32::NEG_INFINITY;
        for b in boxes {
            match lines.last_mut() {
                Some(line) if top(&b) - anchor <= LINE_TOLERANCE => line.push(b),
                _ => {
                    anchor = top(&b);
                    lines.push(vec![b]);
                }
            }
        }

        for line in &mut lines {
            line.sort_by(|a, b| left(a).total_cmp(&left(b)));
        }

        self.text = lines
            .iter()
            .map(|line| {
                line.iter()
                    .map(|b| b.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n");
        self.boxes = lines.into_iter().flatten().collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_box(x: f32, y: f32, text: &str) -> TextBox {
        TextBox {
            bbox: [x, y, x + 50.0, y, x + 50.0, y + 10.0, x, y + 10.0],
            text: text.to_string(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_reading_order_groups_lines() {
        let result = OcrResult::new(
            vec![
                text_box(200.0, 42.0, "NT$1,500"),
                text_box(10.0, 5.0, "姓名: 王小明"),
                text_box(10.0, 45.0, "交通費:"),
            ],
            0,
            (400, 100),
        );

        assert_eq!(result.text, "姓名: 王小明\n交通費: NT$1,500");
    }

    #[test]
    fn test_nearby_boxes_share_a_line_across_pixel_bands() {
        let result = OcrResult::new(
            vec![
                text_box(120.0, 21.0, "NT$320"),
                text_box(10.0, 19.0, "餐費:"),
                text_box(10.0, 40.0, "其他: 0"),
            ],
            0,
            (400, 100),
        );

        assert_eq!(result.text, "餐費: NT$320\n其他: 0");
        assert_eq!(result.boxes[0].text, "餐費:");
        assert_eq!(result.boxes[2].text, "其他: 0");
    }

    #[test]
    fn test_line_does_not_drift_down_the_page() {
        let result = OcrResult::new(
            vec![
                text_box(10.0, 0.0, "a"),
                text_box(60.0, 8.0, "b"),
                text_box(10.0, 16.0, "c"),
            ],
            0,
            (400, 100),
        );

        assert_eq!(result.text, "a b\nc");
    }
}
