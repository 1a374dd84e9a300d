//! Transfer lifecycle events.

use wristlink_protocol::ErrorKind;

use crate::session::TransferKind;

/// Snapshot of a transfer's position.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferProgress {
    /// Packets acknowledged by the watch.
    pub current_packet: usize,
    pub total_packets: usize,
    pub bytes_transferred: usize,
    pub total_bytes: usize,
    /// `bytes_transferred / total_bytes`, within `0.0..=1.0`.
    pub percentage: f64,
    pub status: String,
}

impl TransferProgress {
    pub fn new(
        current_packet: usize,
        total_packets: usize,
        bytes_transferred: usize,
        total_bytes: usize,
        status: impl Into<String>,
    ) -> Self {
        let percentage = if total_bytes == 0 {
            0.0
        } else {
            (bytes_transferred as f64 / total_bytes as f64).clamp(0.0, 1.0)
        };
        TransferProgress {
            current_packet,
            total_packets,
            bytes_transferred,
            total_bytes,
            percentage,
            status: status.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total_packets > 0 && self.current_packet == self.total_packets
    }
}

/// Everything a transfer reports to its subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferEvent {
    Started {
        kind: TransferKind,
        total_packets: usize,
        total_bytes: usize,
    },
    Progress(TransferProgress),
    Paused(TransferProgress),
    Resumed(TransferProgress),
    /// `retry_transfer` picked the session back up at `from_packet`.
    Retrying { from_packet: usize },
    Completed {
        kind: TransferKind,
        total_bytes: usize,
    },
    Failed {
        kind: ErrorKind,
        progress: TransferProgress,
    },
    Cancelled(TransferProgress),
}

impl TransferEvent {
    /// Completed, Failed or Cancelled.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferEvent::Completed { .. }
                | TransferEvent::Failed { .. }
                | TransferEvent::Cancelled(_)
        )
    }
}
