//! Password-protected envelopes for SeedTag.
//!
//! Turns a seed phrase and a password into a self-describing base64 string
//! small enough to live on an NFC tag, and back.
//!
//! - PBKDF2-HMAC-SHA256 (310,000 iterations by default) for key derivation
//! - AES-256-GCM, or AES-256-CBC with an HMAC-SHA256 encrypt-then-MAC tag
//! - Optional zlib compression of the plaintext before encryption
//!
//! # Payload formats
//!
//! New payloads are versioned JSON envelopes (see [`envelope`]). Payloads
//! written before versioning existed are raw `salt || iv || ciphertext`
//! bytes and are still accepted on decrypt.
//!
//! # Errors
//!
//! A wrong password and every form of tampering both come back as
//! [`CryptoError::AuthenticationFailed`]. Structural problems with the
//! payload (bad base64, unknown algorithm, unknown version) are reported
//! separately because they carry no information about the secret.

pub mod cipher;
pub mod compression;
pub mod config;
pub mod envelope;
mod error;
pub mod key;
pub mod provider;
mod service;

pub use cipher::{Algorithm, SealedData};
pub use config::CryptoConfig;
pub use envelope::{
    parse_payload, EncryptionEnvelope, LegacyEnvelope, ParsedPayload, ENVELOPE_VERSION,
};
pub use error::{CryptoError, CryptoResult};
pub use key::{
    DerivedKey, KdfParams, Salt, KEY_SIZE, MAX_PBKDF2_ITERATIONS, MIN_PBKDF2_ITERATIONS,
    PBKDF2_ITERATIONS, SALT_SIZE,
};
pub use provider::{CryptoProvider, SystemProvider};
pub use service::{decrypt, encrypt, CryptoService, EncryptOptions, EncryptionResult};
