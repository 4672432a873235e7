//! Envelope encryption configuration.

use serde::{Deserialize, Serialize};

use crate::compression::DEFAULT_COMPRESSION_LEVEL;
use crate::error::{CryptoError, CryptoResult};
use crate::key::KdfParams;

/// Settings applied when sealing new envelopes.
///
/// Opening never depends on this: envelopes record their own iteration
/// count, and legacy payloads use the fixed historical count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// PBKDF2 cost for new envelopes.
    pub kdf: KdfParams,

    /// zlib level (0-9) used when compression is requested.
    pub compression_level: u32,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            kdf: KdfParams::default(),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl CryptoConfig {
    pub fn validate(&self) -> CryptoResult<()> {
        self.kdf.validate()?;
        if self.compression_level > 9 {
            return Err(CryptoError::InvalidConfig(format!(
                "compression level must be 0-9, got {}",
                self.compression_level
            )));
        }
        Ok(())
    }
}
