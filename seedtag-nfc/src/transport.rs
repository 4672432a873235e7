//! Tag transport boundary.
//!
//! The session never talks to NFC hardware directly. A platform bridge
//! implements [`TagTransport`]; [`MemoryTag`] stands in for one in tests
//! and on devices without an NFC radio.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{TagError, TagResult};

/// What a tag read returns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    /// Hardware identifier of the tag that was read.
    pub id: String,
    /// The text record stored on the tag.
    pub payload: String,
}

/// A single NFC text record slot.
#[async_trait]
pub trait TagTransport: Send + Sync {
    /// Whether a tag can currently be reached at all.
    async fn is_available(&self) -> bool;

    /// Replaces the tag contents with `payload`.
    async fn write(&self, payload: &str) -> TagResult<()>;

    /// Reads the tag. An empty tag is [`TagError::Empty`].
    async fn read(&self) -> TagResult<TagRecord>;
}

#[async_trait]
impl<T: TagTransport + ?Sized> TagTransport for Arc<T> {
    async fn is_available(&self) -> bool {
        (**self).is_available().await
    }

    async fn write(&self, payload: &str) -> TagResult<()> {
        (**self).write(payload).await
    }

    async fn read(&self) -> TagResult<TagRecord> {
        (**self).read().await
    }
}

/// Identifier reported by a [`MemoryTag`] unless overridden.
pub const MEMORY_TAG_ID: &str = "memory-tag";

/// In-memory tag with optional simulated radio latency.
#[derive(Debug)]
pub struct MemoryTag {
    id: String,
    latency: Duration,
    available: AtomicBool,
    contents: Mutex<Option<String>>,
    writes: AtomicUsize,
}

impl MemoryTag {
    pub fn new() -> Self {
        Self::with_latency(Duration::ZERO)
    }

    /// Every read and write waits `latency` before touching the contents.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            id: MEMORY_TAG_ID.to_string(),
            latency,
            available: AtomicBool::new(true),
            contents: Mutex::new(None),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Starts with `payload` already on the tag.
    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        *self.contents.get_mut() = Some(payload.into());
        self
    }

    /// Simulates the radio being switched off or the tag leaving the field.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub async fn contents(&self) -> Option<String> {
        self.contents.lock().await.clone()
    }

    pub async fn clear(&self) {
        *self.contents.lock().await = None;
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    async fn settle(&self) -> TagResult<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if !self.available.load(Ordering::SeqCst) {
            return Err(TagError::Unavailable);
        }
        Ok(())
    }
}

impl Default for MemoryTag {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TagTransport for MemoryTag {
    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn write(&self, payload: &str) -> TagResult<()> {
        self.settle().await?;
        *self.contents.lock().await = Some(payload.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        debug!(tag_id = %self.id, bytes = payload.len(), "memory tag written");
        Ok(())
    }

    async fn read(&self) -> TagResult<TagRecord> {
        self.settle().await?;
        match self.contents.lock().await.as_deref() {
            Some(payload) if !payload.is_empty() => Ok(TagRecord {
                id: self.id.clone(),
                payload: payload.to_string(),
            }),
            _ => Err(TagError::Empty),
        }
    }
}
