//! Upload validation and loading.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ReimbError, Result, ValidationError};

/// Accepted upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Jpeg,
    Png,
    Gif,
    Webp,
    Pdf,
}

impl MediaKind {
    /// Map a MIME type (case-insensitive) to a kind.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime.trim().to_ascii_lowercase();
        match mime.as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            "image/webp" => Some(Self::Webp),
            "application/pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Map a file name's extension (case-insensitive) to a kind.
    ///
    /// The extension is whatever follows the last `.`, so a bare `.png`
    /// counts as a PNG.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        let ext = ext.to_ascii_lowercase();

        match ext.as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::Webp),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn is_pdf(&self) -> bool {
        matches!(self, Self::Pdf)
    }

    pub fn image_format(&self) -> Option<image::ImageFormat> {
        match self {
            Self::Jpeg => Some(image::ImageFormat::Jpeg),
            Self::Png => Some(image::ImageFormat::Png),
            Self::Gif => Some(image::ImageFormat::Gif),
            Self::Webp => Some(image::ImageFormat::WebP),
            Self::Pdf => None,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Webp => "webp",
            Self::Pdf => "pdf",
        };
        f.write_str(s)
    }
}

/// Check an upload by declared MIME type first, then by file extension.
/// Either one being acceptable is enough.
pub fn validate_file_type(
    file_name: &str,
    mime: Option<&str>,
) -> std::result::Result<MediaKind, ValidationError> {
    mime.and_then(MediaKind::from_mime)
        .or_else(|| MediaKind::from_file_name(file_name))
        .ok_or_else(|| ValidationError::UnsupportedType {
            file_name: file_name.to_string(),
            mime: mime.unwrap_or("").to_string(),
        })
}

/// Where the bytes of an upload live.
#[derive(Debug, Clone)]
pub enum FileOrigin {
    Path(PathBuf),
    Memory(Vec<u8>),
}

/// A validated upload waiting to be processed.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub kind: MediaKind,
    pub origin: FileOrigin,
}

impl SourceFile {
    /// Validate a file on disk, using only its extension.
    pub fn from_path(path: impl Into<PathBuf>) -> std::result::Result<Self, ValidationError> {
        Self::from_path_with_mime(path, None)
    }

    /// Validate a file on disk with an optional declared MIME type.
    pub fn from_path_with_mime(
        path: impl Into<PathBuf>,
        mime: Option<&str>,
    ) -> std::result::Result<Self, ValidationError> {
        let path = path.into();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or(ValidationError::MissingFile)?;
        let kind = validate_file_type(&name, mime)?;

        Ok(Self {
            name,
            kind,
            origin: FileOrigin::Path(path),
        })
    }

    /// Validate an in-memory upload.
    pub fn from_bytes(
        name: impl Into<String>,
        mime: Option<&str>,
        bytes: Vec<u8>,
    ) -> std::result::Result<Self, ValidationError> {
        let name = name.into();
        let kind = validate_file_type(&name, mime)?;

        Ok(Self {
            name,
            kind,
            origin: FileOrigin::Memory(bytes),
        })
    }

    /// Size in bytes, if it can be determined without reading the file.
    pub fn size_hint(&self) -> Option<u64> {
        match &self.origin {
            FileOrigin::Path(path) => std::fs::metadata(path).ok().map(|m| m.len()),
            FileOrigin::Memory(bytes) => Some(bytes.len() as u64),
        }
    }

    /// Read the upload into a payload for the OCR engine.
    pub fn load(&self) -> Result<Payload> {
        let bytes = match &self.origin {
            FileOrigin::Path(path) => std::fs::read(path)?,
            FileOrigin::Memory(bytes) => bytes.clone(),
        };

        if bytes.is_empty() {
            return Err(ReimbError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("{} is empty", self.name),
            )));
        }

        debug!("Loaded {} ({} bytes, {})", self.name, bytes.len(), self.kind);

        Ok(Payload {
            kind: self.kind,
            bytes,
        })
    }
}

/// File content in the form consumed by the OCR engine.
#[derive(Debug, Clone)]
pub struct Payload {
    pub kind: MediaKind,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_by_mime() {
        assert_eq!(validate_file_type("scan", Some("image/PNG")), Ok(MediaKind::Png));
        assert_eq!(
            validate_file_type("blob", Some("application/pdf")),
            Ok(MediaKind::Pdf)
        );
    }

    #[test]
    fn test_accepts_by_extension_when_mime_missing_or_wrong() {
        assert_eq!(validate_file_type("receipt.JPG", None), Ok(MediaKind::Jpeg));
        assert_eq!(
            validate_file_type("receipt.webp", Some("application/octet-stream")),
            Ok(MediaKind::Webp)
        );
    }

    #[test]
    fn test_rejects_unknown_types() {
        let err = validate_file_type("notes.txt", Some("text/plain")).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnsupportedType {
                file_name: "notes.txt".to_string(),
                mime: "text/plain".to_string(),
            }
        );
        assert!(validate_file_type("archive.tiff", None).is_err());
    }

    #[test]
    fn test_extension_is_text_after_last_dot() {
        assert_eq!(validate_file_type(".png", None), Ok(MediaKind::Png));
        assert_eq!(validate_file_type("scan.backup.PDF", None), Ok(MediaKind::Pdf));
        assert!(validate_file_type("png", None).is_err());
        assert!(validate_file_type("scan.", None).is_err());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let file = SourceFile::from_path("/nonexistent/dir/scan.png").unwrap();
        assert!(matches!(file.load(), Err(ReimbError::Io(_))));
    }

    #[test]
    fn test_load_memory() {
        let file = SourceFile::from_bytes("a.pdf", None, b"%PDF-1.4".to_vec()).unwrap();
        let payload = file.load().unwrap();
        assert_eq!(payload.kind, MediaKind::Pdf);
        assert_eq!(payload.bytes.len(), 8);
        assert_eq!(file.size_hint(), Some(8));
    }
}
