//! Runner configuration, loaded from YAML.

use std::path::Path;

use serde::{Deserialize, Serialize};
use wristlink_asset::CodecConfig;
use wristlink_protocol::{ScreenInfo, ScreenShape};
use wristlink_transfer::{CustomDialStyle, TransferConfig};

use crate::RunnerError;

/// Everything the CLI can be told through `--config`.
///
/// Every field is optional in the file:
///
/// ```yaml
/// codec:
///   max_bytes: 60000
/// transfer:
///   max_retries: 5
/// device:
///   shape: Round
///   screen_width: 360
///   screen_height: 360
///   mtu: 244
///   drop_every: 4
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub codec: CodecConfig,
    pub transfer: TransferConfig,
    pub device: DeviceConfig,
    /// Clock placement for custom dials.
    pub dial_style: CustomDialStyle,
}

/// The simulated watch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub shape: ScreenShape,
    pub screen_width: u16,
    pub screen_height: u16,
    /// Reported link MTU; 0 means none negotiated.
    pub mtu: u16,
    /// Drop every Nth acknowledgement; 0 never drops.
    pub drop_every: u32,
    pub battery_level: u8,
    pub serial: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            shape: ScreenShape::Square,
            screen_width: 240,
            screen_height: 240,
            mtu: 185,
            drop_every: 0,
            battery_level: 80,
            serial: "WL-SIM-0001".to_string(),
        }
    }
}

impl DeviceConfig {
    pub fn screen(&self) -> ScreenInfo {
        ScreenInfo {
            shape: self.shape,
            width: self.screen_width,
            height: self.screen_height,
        }
    }
}

impl RunnerConfig {
    pub fn from_yaml(text: &str) -> Result<Self, RunnerError> {
        // An empty file is a valid, all-default configuration.
        if text.trim().is_empty() {
            return Ok(RunnerConfig::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, RunnerError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn to_yaml(&self) -> Result<String, RunnerError> {
        Ok(serde_yaml::to_string(self)?)
    }
}
