//! Envelope encryption error types.

use thiserror::Error;

/// Result type for envelope operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur while sealing or opening an envelope.
///
/// Every authentication-related failure collapses into
/// [`CryptoError::AuthenticationFailed`] so callers cannot tell a wrong
/// password from a forged tag, a bad MAC or broken padding.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("{0} must not be empty")]
    EmptyInput(&'static str),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("unsupported envelope version: {0}")]
    UnsupportedVersion(u64),

    #[error("incorrect password or corrupted data")]
    AuthenticationFailed,

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("crypto provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("compression failed: {0}")]
    Compression(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CryptoError {
    /// Whether this error means the password was wrong or the data was
    /// tampered with, as opposed to a transport or configuration problem.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, Self::AuthenticationFailed)
    }
}
