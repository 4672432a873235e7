//! Write-then-verify for tag payloads.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::TagConfig;
use crate::error::{TagError, TagResult};
use crate::transport::TagTransport;

/// How far a write got confirmed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteOutcome {
    /// Written; read-back was disabled.
    Written,
    /// Read back and identical to what was written.
    Confirmed,
    /// Read back but different. The tag cannot be trusted to hold the seed.
    Mismatch,
}

impl WriteOutcome {
    /// Whether the tag is known or assumed to hold the payload.
    pub fn is_success(&self) -> bool {
        !matches!(self, WriteOutcome::Mismatch)
    }
}

/// Writes `payload` and, when `config.auto_verify_write` is set, reads it
/// back within `config.verify_timeout_ms` and compares.
pub async fn write_and_verify<T: TagTransport + ?Sized>(
    transport: &T,
    payload: &str,
    config: &TagConfig,
) -> TagResult<WriteOutcome> {
    if !transport.is_available().await {
        return Err(TagError::Unavailable);
    }

    transport.write(payload).await?;
    info!(bytes = payload.len(), "payload written to tag");

    if !config.auto_verify_write {
        return Ok(WriteOutcome::Written);
    }

    let record = tokio::time::timeout(config.verify_timeout(), transport.read())
        .await
        .map_err(|_| {
            warn!(
                timeout_ms = config.verify_timeout_ms,
                "tag read-back timed out"
            );
            TagError::VerifyTimeout
        })??;

    if record.payload == payload {
        info!(tag_id = %record.id, "tag write verified");
        Ok(WriteOutcome::Confirmed)
    } else {
        warn!(
            tag_id = %record.id,
            written = payload.len(),
            read = record.payload.len(),
            "tag read-back differs from written payload"
        );
        Ok(WriteOutcome::Mismatch)
    }
}
