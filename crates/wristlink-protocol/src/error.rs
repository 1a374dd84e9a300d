//! Protocol error types.

use thiserror::Error;

/// Coarse error taxonomy shared by every wristlink crate.
///
/// Each crate keeps its own detailed error enum and maps it onto one of these
/// kinds, so callers can branch on the category without matching every
/// variant of every crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No device is connected.
    DeviceNotConnected,
    /// The connected device cannot perform the operation.
    DeviceNotSupported,
    /// An image operation (decode, resize) failed.
    ImageProcessFailed,
    /// Converting a raster to native pixels failed.
    RawDataConversionFailed,
    /// The lossy encoder failed outright.
    CompressionFailed,
    /// The compression loop ran out of attempts.
    ExceedMaxAttempts,
    /// Even the lowest quality did not fit the byte budget.
    ExceedMaxFileSize,
    /// A transfer session failed.
    TransferFailed,
    /// The transport rejected or lost data.
    NetworkError,
    /// The MTU is too small for the transfer envelope.
    InvalidMtu,
    /// A precondition of an operation was not met.
    InvalidConfiguration,
    /// A frame or field was malformed.
    InvalidData,
    /// A source image is degenerate or unsupported.
    InvalidImage,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::DeviceNotConnected => "device not connected",
            ErrorKind::DeviceNotSupported => "device not supported",
            ErrorKind::ImageProcessFailed => "image processing failed",
            ErrorKind::RawDataConversionFailed => "raw data conversion failed",
            ErrorKind::CompressionFailed => "compression failed",
            ErrorKind::ExceedMaxAttempts => "exceeded max attempts",
            ErrorKind::ExceedMaxFileSize => "exceeded max file size",
            ErrorKind::TransferFailed => "transfer failed",
            ErrorKind::NetworkError => "network error",
            ErrorKind::InvalidMtu => "invalid MTU",
            ErrorKind::InvalidConfiguration => "invalid configuration",
            ErrorKind::InvalidData => "invalid data",
            ErrorKind::InvalidImage => "invalid image",
        };
        f.write_str(s)
    }
}

/// Errors that can occur when encoding or decoding protocol frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame or payload is too short for the field being read.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length available.
        actual: usize,
    },

    /// A string field is longer than its declared maximum.
    #[error("field too long: maximum {max} bytes, got {actual}")]
    FieldTooLong {
        /// Maximum allowed length.
        max: usize,
        /// Actual length.
        actual: usize,
    },

    /// Unknown operation byte for a known command.
    #[error("unknown operation 0x{op:02X} for command 0x{command:02X}")]
    UnknownOperation {
        /// Command identifier.
        command: u8,
        /// Operation byte.
        op: u8,
    },

    /// A switch flag does not fit in the requested byte group.
    #[error("switch group too small: flag needs byte {byte}, group has {group_size}")]
    SwitchGroupTooSmall {
        /// Byte index the flag lives in.
        byte: usize,
        /// Requested group size.
        group_size: usize,
    },

    /// Invalid data in frame.
    #[error("invalid frame data: {0}")]
    InvalidData(String),

    /// UTF-8 decoding error.
    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,

    /// The connected watch cannot do what was asked.
    #[error("device not supported: {0}")]
    DeviceNotSupported(&'static str),
}

impl ProtocolError {
    /// Map onto the shared error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProtocolError::DeviceNotSupported(_) => ErrorKind::DeviceNotSupported,
            _ => ErrorKind::InvalidData,
        }
    }
}

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
