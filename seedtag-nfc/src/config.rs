//! Tag write/verify configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How tag writes are confirmed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagConfig {
    /// Read the tag back after every write and compare it to what was sent.
    pub auto_verify_write: bool,

    /// How long the read-back may take before the write counts as unverified.
    pub verify_timeout_ms: u64,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            auto_verify_write: true,
            verify_timeout_ms: 6000,
        }
    }
}

impl TagConfig {
    pub fn verify_timeout(&self) -> Duration {
        Duration::from_millis(self.verify_timeout_ms)
    }

    /// Write-only configuration: no read-back.
    pub fn unverified() -> Self {
        Self {
            auto_verify_write: false,
            ..Self::default()
        }
    }
}
