//! Pure Rust OCR engine wrapper using `pure-onnx-ocr`.

use std::path::PathBuf;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info, warn};

use crate::error::OcrError;
use crate::input::Payload;
use crate::models::config::OcrConfig;
use crate::pdf::{PdfExtractor, PdfProcessor};

use super::{OcrProvider, OcrResult, OcrSession, TextBox};

/// Provider that loads a fresh `pure-onnx-ocr` engine per session.
pub struct PureOcrProvider {
    config: OcrConfig,
}

impl PureOcrProvider {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }

    /// Model directory for a language: `<model_dir>/<language>` when present,
    /// otherwise `<model_dir>` itself.
    fn model_dir_for(&self, language: &str) -> PathBuf {
        let per_language = self.config.model_dir.join(language);
        if per_language.is_dir() {
            per_language
        } else {
            self.config.model_dir.clone()
        }
    }
}

impl OcrProvider for PureOcrProvider {
    fn name(&self) -> &str {
        "pure-onnx-ocr"
    }

    fn acquire(&self, language: &str) -> Result<Box<dyn OcrSession>, OcrError> {
        let model_dir = self.model_dir_for(language);
        let det_path = model_dir.join(&self.config.detection_model);
        let rec_path = model_dir.join(&self.config.recognition_model);
        let dict_path = model_dir.join(&self.config.dictionary);

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!(
                    "model file not found: {}",
                    path.display()
                )));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!(
            "Loaded pure-onnx-ocr engine from {} (language {})",
            model_dir.display(),
            language
        );

        Ok(Box::new(PureOcrSession {
            engine,
            keep_unk: self.config.keep_unk,
        }))
    }
}

/// One loaded `pure-onnx-ocr` engine.
pub struct PureOcrSession {
    engine: pure_onnx_ocr::engine::OcrEngine,
    keep_unk: bool,
}

impl PureOcrSession {
    /// Process an image and extract text with bounding boxes.
    pub fn process(&self, image: &DynamicImage) -> Result<OcrResult, OcrError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();

        debug!("Processing image: {}x{}", width, height);

        let results = self
            .engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        let text_boxes: Vec<TextBox> = results
            .iter()
            .map(|r| TextBox {
                bbox: polygon_to_bbox(&r.bounding_box),
                text: if self.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                },
                confidence: r.confidence,
            })
            .collect();

        let result = OcrResult::new(
            text_boxes,
            start.elapsed().as_millis() as u64,
            (width, height),
        );

        debug!(
            "OCR complete: {} text boxes in {}ms",
            result.boxes.len(),
            result.processing_time_ms
        );

        Ok(result)
    }

    fn recognize_pdf(
        &self,
        bytes: &[u8],
        progress: &mut dyn FnMut(u8),
    ) -> Result<String, OcrError> {
        let mut extractor = PdfExtractor::new();
        extractor.load(bytes)?;

        let mut images = Vec::new();
        for page in 1..=extractor.page_count() {
            match extractor.extract_images(page) {
                Ok(page_images) => images.extend(page_images),
                Err(e) => warn!("Failed to extract images from page {}: {}", page, e),
            }
        }
        progress(10);

        if images.is_empty() {
            debug!("No images found in PDF, using text layer");
            let text = extractor.extract_text()?;
            progress(100);
            return Ok(text);
        }

        let total = images.len();
        let mut pages = Vec::with_capacity(total);
        for (i, image) in images.iter().enumerate() {
            let result = self.process(image)?;
            if !result.text.trim().is_empty() {
                pages.push(result.text);
            }
            progress((10 + (i + 1) * 90 / total) as u8);
        }

        Ok(pages.join("\n\n"))
    }
}

impl OcrSession for PureOcrSession {
    fn recognize(
        &mut self,
        payload: &Payload,
        progress: &mut dyn FnMut(u8),
    ) -> Result<String, OcrError> {
        progress(0);

        if payload.kind.is_pdf() {
            return self.recognize_pdf(&payload.bytes, progress);
        }

        let format = payload.kind.image_format().ok_or_else(|| {
            OcrError::UnsupportedPayload(format!("{} is not an image", payload.kind))
        })?;
        let image = image::load_from_memory_with_format(&payload.bytes, format)?;
        progress(10);

        let result = self.process(&image)?;
        progress(100);

        Ok(result.text)
    }

    fn terminate(self: Box<Self>) {
        debug!("Releasing pure-onnx-ocr engine");
    }
}

/// Convert a `Polygon<f64>` to our `[f32; 8]` bbox format.
///
/// Extracts the first 4 exterior points (quadrilateral) as
/// `[x1, y1, x2, y2, x3, y3, x4, y4]`.
fn polygon_to_bbox(polygon: &pure_onnx_ocr::Polygon<f64>) -> [f32; 8] {
    let mut bbox = [0.0f32; 8];
    for (i, coord) in polygon.exterior().coords().take(4).enumerate() {
        bbox[i * 2] = coord.x as f32;
        bbox[i * 2 + 1] = coord.y as f32;
    }
    bbox
}
