//! Transfer engine configuration.

use serde::{Deserialize, Serialize};

/// Retry policy for the transfer engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Consecutive resends of one frame before the transfer fails.
    pub max_retries: u32,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self { max_retries: 3 }
    }
}
