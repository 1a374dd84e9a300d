//! Transfer kinds, parameters and session state.

use serde::{Deserialize, Serialize};
use wristlink_protocol::{
    DialColor, DialType, TimePosition, TransferChannel, MARKET_ENVELOPE_OVERHEAD,
    RESOURCE_ENVELOPE_OVERHEAD,
};

/// What is being sent, which selects the wire envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    /// Watch face through the dial-market envelope (`0xE0`).
    MarketDial,
    /// Firmware resource through the resource-upgrade envelope (`0xE2`).
    ResourceUpgrade,
}

impl TransferKind {
    /// Envelope bytes per data frame.
    pub fn overhead(&self) -> usize {
        match self {
            TransferKind::MarketDial => MARKET_ENVELOPE_OVERHEAD,
            TransferKind::ResourceUpgrade => RESOURCE_ENVELOPE_OVERHEAD,
        }
    }

    pub fn channel(&self) -> TransferChannel {
        match self {
            TransferKind::MarketDial => TransferChannel::Market,
            TransferKind::ResourceUpgrade => TransferChannel::Resource,
        }
    }

    /// Metric label value.
    pub fn label(&self) -> &'static str {
        match self {
            TransferKind::MarketDial => "market",
            TransferKind::ResourceUpgrade => "resource",
        }
    }
}

impl std::fmt::Display for TransferKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Clock placement applied after a custom dial lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomDialStyle {
    pub position: TimePosition,
    pub color: DialColor,
}

/// Kind-specific fields of the configuration and data frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferParams {
    pub dial_type: DialType,
    pub dial_num: u16,
    pub local: bool,
    pub type_value: u8,
    pub dial_type_value: u8,
    /// Sub-file index carried in every market data packet.
    pub bin: u8,
    /// Sent as `0xE1` once a custom dial completes.
    pub custom_style: CustomDialStyle,
}

impl TransferParams {
    /// Parameters for a caller-drawn watch face.
    pub fn custom_dial(style: CustomDialStyle) -> Self {
        TransferParams {
            dial_type: DialType::Custom,
            local: true,
            custom_style: style,
            ..Default::default()
        }
    }

    /// Parameters for a catalogue dial.
    pub fn market_dial(dial_num: u16) -> Self {
        TransferParams {
            dial_type: DialType::Market,
            dial_num,
            ..Default::default()
        }
    }
}

/// Lifecycle of a transfer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferState {
    Idle,
    Preparing,
    /// Configuration frame sent, waiting for its ack.
    ConfiguringDevice,
    Streaming,
    Paused,
    Completed,
    Cancelled,
    Failed,
}

impl TransferState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferState::Completed | TransferState::Cancelled | TransferState::Failed
        )
    }

    /// A session exists and has not finished.
    pub fn is_active(&self) -> bool {
        !self.is_terminal() && *self != TransferState::Idle
    }
}

impl std::fmt::Display for TransferState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransferState::Idle => "idle",
            TransferState::Preparing => "preparing",
            TransferState::ConfiguringDevice => "configuring device",
            TransferState::Streaming => "streaming",
            TransferState::Paused => "paused",
            TransferState::Completed => "completed",
            TransferState::Cancelled => "cancelled",
            TransferState::Failed => "failed",
        };
        f.write_str(s)
    }
}
