//! Error types for the image crate.

use obsidian_core::error::{Error, ErrorCode};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for image operations.
pub type Result<T> = std::result::Result<T, ImageError>;

/// Errors that can occur during image operations.
#[derive(Debug, Error)]
pub enum ImageError {
    /// Unknown image format
    #[error("Unknown image format")]
    UnknownFormat,

    /// Invalid image data
    #[error("Invalid image data: {0}")]
    InvalidData(String),

    /// Source icon could not be read
    #[error("Cannot read icon {path}: {source}")]
    Read {
        /// Path that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Output could not be written
    #[error("Cannot write {path}: {source}")]
    Write {
        /// Path that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Image decoding or encoding error
    #[error("Image processing error: {0}")]
    Processing(#[from] image::ImageError),
}

impl From<ImageError> for Error {
    fn from(err: ImageError) -> Self {
        let (code, suggestion) = match &err {
            ImageError::UnknownFormat | ImageError::InvalidData(_) => (
                ErrorCode::UnsupportedImage,
                "Use a PNG, JPEG, GIF, WebP, BMP or ICO image as the app icon",
            ),
            ImageError::Read { .. } => (
                ErrorCode::FileNotFound,
                "Check the icon path; quotes and ~ are accepted",
            ),
            ImageError::Write { .. } => (
                ErrorCode::PermissionDenied,
                "Make sure the build directory is writable",
            ),
            ImageError::Processing(_) => (
                ErrorCode::ImageError,
                "Re-export the icon from an image editor and try again",
            ),
        };
        let message = err.to_string();
        Error::new(code, message)
            .with_suggestion(suggestion)
            .with_source(err)
    }
}
