//! Library side of the `wristlink` CLI: YAML configuration, a simulated watch
//! and the glue that runs sessions against it.

pub mod config;
pub mod link;
pub mod sim;

use thiserror::Error;
use wristlink_asset::AssetError;
use wristlink_protocol::ProtocolError;
use wristlink_transfer::TransferError;

pub use config::{DeviceConfig, RunnerConfig};
pub use link::{Link, TransferSummary};
pub use sim::{SimulatedWatch, WatchReport};

/// Errors surfaced by the runner.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid hex frame: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("transfer made no progress after {0} rounds")]
    Stalled(usize),
}
