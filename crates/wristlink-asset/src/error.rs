//! Error types for the asset codec.

use thiserror::Error;
use wristlink_protocol::ErrorKind;

/// Errors that can occur while preparing an asset for the watch.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The source image is degenerate or uses an unsupported color model.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Decoding or resizing failed.
    #[error("image processing failed: {0}")]
    ImageProcess(String),

    /// Error from the `image` crate.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Converting a raster to native pixels failed.
    #[error("raw data conversion failed: {0}")]
    RawDataConversion(String),

    /// The lossy encoder itself failed.
    #[error("compression failed: {0}")]
    Compression(String),

    /// Attempts ran out before the quality floor was reached.
    #[error("no output within {max_bytes} bytes after {attempts} attempts (smallest {smallest})")]
    ExceedMaxAttempts {
        /// Attempts made.
        attempts: u32,
        /// Byte budget.
        max_bytes: usize,
        /// Smallest output produced.
        smallest: usize,
    },

    /// Even the lowest quality did not fit.
    #[error("output of {smallest} bytes at lowest quality exceeds {max_bytes} bytes")]
    ExceedMaxFileSize {
        /// Byte budget.
        max_bytes: usize,
        /// Size at the lowest quality.
        smallest: usize,
    },

    /// A container could not be parsed.
    #[error("invalid container: {0}")]
    InvalidContainer(String),
}

impl AssetError {
    /// Map onto the shared error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AssetError::InvalidImage(_) => ErrorKind::InvalidImage,
            AssetError::ImageProcess(_) | AssetError::Image(_) => ErrorKind::ImageProcessFailed,
            AssetError::RawDataConversion(_) => ErrorKind::RawDataConversionFailed,
            AssetError::Compression(_) => ErrorKind::CompressionFailed,
            AssetError::ExceedMaxAttempts { .. } => ErrorKind::ExceedMaxAttempts,
            AssetError::ExceedMaxFileSize { .. } => ErrorKind::ExceedMaxFileSize,
            AssetError::InvalidContainer(_) => ErrorKind::InvalidData,
        }
    }
}

/// Result type for asset operations.
pub type Result<T> = std::result::Result<T, AssetError>;
