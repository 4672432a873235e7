//! NFC storage for SeedTag envelopes.
//!
//! Wraps the envelope service from `seedtag-crypto` in an async session
//! that talks to a tag through a [`TagTransport`]:
//!
//! - [`SeedSession::store_to_tag`] seals a seed and writes it, optionally
//!   reading it back to confirm the tag holds exactly what was sent
//! - [`SeedSession::load_from_tag`] reads and opens a payload
//! - [`SeedSession::compute_variants`] seals the seed under every
//!   algorithm/compression combination so the caller can compare sizes
//!
//! Crypto work runs on the blocking pool. Preview requests carry a
//! generation number, and a preview overtaken by a newer request is
//! reported as [`SessionError::Stale`] instead of being returned.

mod config;
mod error;
mod logging;
pub mod preview;
mod session;
pub mod transport;
mod verify;

pub use config::TagConfig;
pub use error::{SessionError, SessionResult, TagError, TagResult};
pub use logging::init_logging;
pub use preview::{VariantKey, VariantPreview};
pub use session::{SeedSession, StoreReport};
pub use transport::{MemoryTag, TagRecord, TagTransport, MEMORY_TAG_ID};
pub use verify::{write_and_verify, WriteOutcome};
