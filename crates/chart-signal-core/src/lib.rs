#![warn(missing_docs)]
//! # chart-signal-core
//!
//! ## Purpose
//! Defines the pure data model shared across the `chart-signal` workspace and
//! the image ingestion path that turns a user-provided file into an encoded
//! chart payload.
//!
//! ## Responsibilities
//! - Represent the analysis [`Timeframe`] and its fixed expiration label.
//! - Validate that uploads declare an image MIME type.
//! - Encode accepted uploads into base64 [`ChartImage`] payloads with a
//!   preview.
//!
//! ## Data flow
//! Front end collects a [`FileUpload`] (picker or drop) ->
//! [`encode_chart_image`] validates and encodes it -> the resulting
//! [`ChartImage`] is stored in session state and later handed to the request
//! builder.
//!
//! ## Ownership and lifetimes
//! Uploads and chart images own their buffers (`Vec<u8>`, `String`) so the
//! session can hand an owned snapshot to the in-flight request without
//! borrowing.
//!
//! ## Error model
//! Non-image uploads, empty files, and unreadable paths return [`CoreError`]
//! variants; nothing is mutated on failure.
//!
//! ## Security and privacy notes
//! The `Debug` output of [`ChartImage`] reports payload sizes only, so chart
//! bytes never end up in logs.
//!
//! ## Example
//! ```rust
//! use chart_signal_core::{FileUpload, Timeframe, encode_chart_image};
//!
//! let rejected = encode_chart_image(FileUpload::new("notes.txt", "text/plain", b"hi".to_vec()));
//! assert!(rejected.is_err());
//! assert_eq!(Timeframe::default().expiration_label(), "1 minute");
//! ```

use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// MIME type declared for files whose extension is not a known image format.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Candle interval of the uploaded chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    /// One-minute candles.
    #[default]
    M1,
    /// Five-minute candles.
    M5,
}

impl Timeframe {
    /// Every selectable timeframe, in selector order.
    pub const ALL: [Timeframe; 2] = [Timeframe::M1, Timeframe::M5];

    /// Short code shown on selector buttons (`M1`, `M5`).
    pub fn code(self) -> &'static str {
        match self {
            Timeframe::M1 => "M1",
            Timeframe::M5 => "M5",
        }
    }

    /// Long-form interval name.
    pub fn label(self) -> &'static str {
        match self {
            Timeframe::M1 => "1-minute",
            Timeframe::M5 => "5-minute",
        }
    }

    /// Fixed expiration label the model must report for this timeframe.
    pub fn expiration_label(self) -> &'static str {
        match self {
            Timeframe::M1 => "1 minute",
            Timeframe::M5 => "5 minutes",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Timeframe {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "m1" | "1m" | "1" | "1-minute" | "1min" => Ok(Timeframe::M1),
            "m5" | "5m" | "5" | "5-minute" | "5min" => Ok(Timeframe::M5),
            _ => Err(CoreError::InvalidTimeframe(raw.to_string())),
        }
    }
}

/// Entry point an upload arrived through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadSource {
    /// Explicit file selection.
    Picker,
    /// Drag-and-drop onto the upload area.
    Drop,
}

/// Raw file-like input collected by the front end.
#[derive(Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// Display name of the file.
    pub name: String,
    /// MIME type declared by the environment for this file.
    pub declared_mime: String,
    /// Full binary content.
    pub bytes: Vec<u8>,
}

impl FileUpload {
    /// Creates an upload from already-read content.
    pub fn new(name: impl Into<String>, declared_mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            declared_mime: declared_mime.into(),
            bytes,
        }
    }

    /// Reads a file from disk and declares its MIME type from the extension.
    ///
    /// Unknown extensions declare [`FALLBACK_MIME_TYPE`], which ingestion
    /// rejects.
    ///
    /// # Errors
    /// Returns [`CoreError::Io`] when the file cannot be read.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self::new(name, declared_mime_for_path(path), bytes))
    }
}

impl fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileUpload")
            .field("name", &self.name)
            .field("declared_mime", &self.declared_mime)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

/// Rendered preview of an accepted chart.
#[derive(Clone, PartialEq, Eq)]
pub struct ChartPreview {
    /// `data:` URL suitable for an image element.
    pub data_url: String,
    /// Pixel dimensions when the bytes decode as a supported format.
    pub dimensions: Option<(u32, u32)>,
}

/// Encoded chart held by the session and sent to the inference service.
#[derive(Clone, PartialEq, Eq)]
pub struct ChartImage {
    /// Display name of the source file.
    pub name: String,
    /// Declared image MIME type.
    pub mime_type: String,
    /// Base64 (standard alphabet, padded) encoded file content.
    pub base64_data: String,
    /// Preview exposed to the front end.
    pub preview: ChartPreview,
}

impl ChartImage {
    /// Returns `true` when there is no encoded payload.
    pub fn is_empty(&self) -> bool {
        self.base64_data.is_empty()
    }
}

impl fmt::Debug for ChartImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChartImage")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("base64_len", &self.base64_data.len())
            .field("dimensions", &self.preview.dimensions)
            .finish()
    }
}

/// Returns `true` when `mime` declares an image type.
pub fn is_image_mime(mime: &str) -> bool {
    mime.trim().to_ascii_lowercase().starts_with("image/")
}

/// Image extensions that [`image::ImageFormat`] does not know about.
const EXTRA_IMAGE_EXTENSIONS: [(&str, &str); 2] =
    [("svg", "image/svg+xml"), ("svgz", "image/svg+xml")];

/// Maps a path's extension to the MIME type a browser would declare.
///
/// Vector charts are declared but carry no preview dimensions.
pub fn declared_mime_for_path(path: &Path) -> String {
    if let Ok(format) = image::ImageFormat::from_path(path) {
        return format.to_mime_type().to_string();
    }

    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);
    EXTRA_IMAGE_EXTENSIONS
        .iter()
        .find(|(known, _)| extension.as_deref() == Some(*known))
        .map_or_else(|| FALLBACK_MIME_TYPE.to_string(), |(_, mime)| mime.to_string())
}

/// Validates and encodes one upload.
///
/// # Errors
/// Returns [`CoreError::UnsupportedFileType`] when the declared MIME type is
/// not `image/*`.
/// Returns [`CoreError::EmptyImage`] when the file has no content.
pub fn encode_chart_image(upload: FileUpload) -> Result<ChartImage, CoreError> {
    if !is_image_mime(&upload.declared_mime) {
        return Err(CoreError::UnsupportedFileType {
            name: upload.name,
            mime: upload.declared_mime,
        });
    }

    if upload.bytes.is_empty() {
        return Err(CoreError::EmptyImage(upload.name));
    }

    let mime_type = upload.declared_mime.trim().to_ascii_lowercase();
    let base64_data = STANDARD.encode(&upload.bytes);
    let preview = ChartPreview {
        data_url: format!("data:{mime_type};base64,{base64_data}"),
        dimensions: probe_dimensions(&upload.bytes),
    };

    Ok(ChartImage {
        name: upload.name,
        mime_type,
        base64_data,
        preview,
    })
}

fn probe_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

/// Error type for ingestion and model parsing failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Upload does not declare an image MIME type.
    #[error("unsupported file type for {name}: {mime}")]
    UnsupportedFileType {
        /// File display name.
        name: String,
        /// Declared MIME type.
        mime: String,
    },
    /// Upload had no content.
    #[error("image {0} is empty")]
    EmptyImage(String),
    /// Timeframe text did not match a known interval.
    #[error("invalid timeframe: {0} (expected M1 or M5)")]
    InvalidTimeframe(String),
    /// File could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    //! Unit tests for MIME handling and timeframe parsing.

    use super::*;

    #[test]
    fn image_mime_check_is_prefix_based() {
        assert!(is_image_mime("image/png"));
        assert!(is_image_mime(" IMAGE/JPEG "));
        assert!(!is_image_mime("text/plain"));
        assert!(!is_image_mime("application/octet-stream"));
        assert!(!is_image_mime(""));
    }

    #[test]
    fn parses_timeframe_aliases() {
        assert_eq!("m1".parse::<Timeframe>().unwrap(), Timeframe::M1);
        assert_eq!("5-minute".parse::<Timeframe>().unwrap(), Timeframe::M5);
        assert!("15m".parse::<Timeframe>().is_err());
    }

    #[test]
    fn declares_mime_from_extension() {
        assert_eq!(declared_mime_for_path(Path::new("chart.png")), "image/png");
        assert_eq!(declared_mime_for_path(Path::new("chart.JPG")), "image/jpeg");
        assert_eq!(
            declared_mime_for_path(Path::new("notes.txt")),
            FALLBACK_MIME_TYPE
        );
    }

    #[test]
    fn debug_output_hides_payload() {
        let image = encode_chart_image(FileUpload::new("c.png", "image/png", vec![1, 2, 3]))
            .expect("image mime should be accepted");
        let rendered = format!("{image:?}");
        assert!(!rendered.contains(&image.base64_data));
        assert!(rendered.contains("base64_len"));
    }
}
