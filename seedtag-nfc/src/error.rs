//! Tag and session error types.

use seedtag_crypto::CryptoError;
use thiserror::Error;

/// Result type for tag transport operations.
pub type TagResult<T> = Result<T, TagError>;

/// Errors raised by a [`TagTransport`](crate::TagTransport).
#[derive(Debug, Error)]
pub enum TagError {
    #[error("NFC is not available on this platform")]
    Unavailable,

    #[error("tag is empty")]
    Empty,

    #[error("tag write failed: {0}")]
    Write(String),

    #[error("tag read failed: {0}")]
    Read(String),

    #[error("tag did not answer before the verify timeout")]
    VerifyTimeout,
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors surfaced by [`SeedSession`](crate::SeedSession).
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("tag error: {0}")]
    Tag(#[from] TagError),

    /// A newer preview was requested while this one was being computed.
    #[error("preview superseded by a newer request")]
    Stale,

    #[error("background task failed: {0}")]
    Task(String),
}

impl SessionError {
    /// Whether the password was wrong or the payload was tampered with.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, Self::Crypto(e) if e.is_authentication_failure())
    }
}
