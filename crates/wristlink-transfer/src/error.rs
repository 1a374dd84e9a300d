//! Transfer errors.

use thiserror::Error;
use wristlink_protocol::{ErrorKind, ProtocolError};

use crate::session::TransferState;

/// Errors reported synchronously by the transfer engine.
///
/// Failures during streaming are not returned here; they arrive as
/// [`TransferEvent::Failed`](crate::TransferEvent::Failed).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// The transport has not reported an MTU.
    #[error("no MTU known for the link")]
    NoMtu,

    /// Nothing to send.
    #[error("asset is empty")]
    EmptyAsset,

    /// The MTU leaves no room for data after the envelope.
    #[error("MTU {mtu} too small for {overhead} byte envelope")]
    InvalidMtu {
        /// Reported MTU.
        mtu: u16,
        /// Envelope overhead of the transfer kind.
        overhead: usize,
    },

    /// The asset does not fit the configuration frame's fields.
    #[error("asset of {size} bytes needs {packets} packets, more than the frame can describe")]
    TooLarge {
        /// Asset size.
        size: usize,
        /// Packets required.
        packets: usize,
    },

    /// Another transfer is in progress.
    #[error("a transfer is already {0}")]
    Busy(TransferState),

    /// The operation is not allowed in the current state.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        /// Operation attempted.
        operation: &'static str,
        /// State at the time.
        state: TransferState,
    },

    /// Building a frame failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl TransferError {
    /// Map onto the shared error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransferError::InvalidMtu { .. } => ErrorKind::InvalidMtu,
            TransferError::Protocol(e) => e.kind(),
            TransferError::NoMtu
            | TransferError::EmptyAsset
            | TransferError::TooLarge { .. }
            | TransferError::Busy(_)
            | TransferError::InvalidState { .. } => ErrorKind::InvalidConfiguration,
        }
    }
}

/// Result type for transfer operations.
pub type Result<T> = std::result::Result<T, TransferError>;
