//! CLI subcommands and shared helpers.

pub mod batch;
pub mod config;
pub mod parse;
pub mod process;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use reimb_core::models::config::ReimbConfig;
use reimb_core::{FileProcessor, PureOcrProvider};

/// `<config dir>/reimb/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("reimb")
        .join("config.json")
}

/// Load the configuration from an explicit path, the default location, or defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<ReimbConfig> {
    if let Some(path) = config_path {
        return Ok(ReimbConfig::from_file(Path::new(path))?);
    }

    let path = default_config_path();
    if path.exists() {
        debug!("Using config file {}", path.display());
        Ok(ReimbConfig::from_file(&path)?)
    } else {
        Ok(ReimbConfig::default())
    }
}

/// Build a file processor backed by the `pure-onnx-ocr` engine.
pub fn build_processor(
    config: &ReimbConfig,
    model_dir: Option<&Path>,
    language: Option<&str>,
) -> FileProcessor {
    let mut ocr = config.ocr.clone();
    if let Some(dir) = model_dir {
        ocr.model_dir = dir.to_path_buf();
    }
    let language = language.unwrap_or(&ocr.language).to_string();

    FileProcessor::new(Arc::new(PureOcrProvider::new(ocr))).with_language(language)
}
