//! Encrypt/decrypt facade.
//!
//! Encrypt: compress (optional) → derive → encrypt → wrap.
//! Decrypt: unwrap → identify format → derive → verify/decrypt → decompress.

use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

use crate::cipher::{self, Algorithm, SealedData};
use crate::compression;
use crate::config::CryptoConfig;
use crate::envelope::{parse_payload, EncryptionEnvelope, ParsedPayload};
use crate::error::{CryptoError, CryptoResult};
use crate::key::{KdfParams, Salt};
use crate::provider::{CryptoProvider, SystemProvider};

/// Caller-chosen settings for one encryption.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncryptOptions {
    pub algorithm: Algorithm,
    pub compress: bool,
}

impl EncryptOptions {
    pub fn new(algorithm: Algorithm, compress: bool) -> Self {
        Self {
            algorithm,
            compress,
        }
    }

    /// Builds options from an algorithm name such as `"aes-gcm"`.
    pub fn parse(algorithm: &str, compress: bool) -> CryptoResult<Self> {
        Ok(Self::new(algorithm.parse()?, compress))
    }
}

/// A sealed payload ready to be written to a tag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionResult {
    /// Base64 envelope.
    pub payload: String,
    /// Size of `payload` in bytes, i.e. what the tag has to hold.
    pub byte_length: usize,
    pub algorithm: Algorithm,
    pub compressed: bool,
}

/// Password-based envelope encryption over an injected primitive provider.
///
/// Calls share nothing but the provider and the read-only config, so one
/// service can be used from many threads at once.
#[derive(Debug)]
pub struct CryptoService<P = SystemProvider> {
    provider: P,
    config: CryptoConfig,
}

impl CryptoService<SystemProvider> {
    /// Production service with the default configuration.
    pub fn new() -> Self {
        Self {
            provider: SystemProvider,
            config: CryptoConfig::default(),
        }
    }

    /// Production provider with a custom configuration.
    pub fn with_config(config: CryptoConfig) -> CryptoResult<Self> {
        Self::with_provider(SystemProvider, config)
    }
}

impl Default for CryptoService<SystemProvider> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: CryptoProvider> CryptoService<P> {
    pub fn with_provider(provider: P, config: CryptoConfig) -> CryptoResult<Self> {
        config.validate()?;
        Ok(Self { provider, config })
    }

    pub fn config(&self) -> &CryptoConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Seals `plaintext` under `password`.
    ///
    /// Every call draws a fresh salt and IV, so encrypting the same input
    /// twice yields different payloads.
    pub fn encrypt(
        &self,
        plaintext: &str,
        password: &str,
        options: EncryptOptions,
    ) -> CryptoResult<EncryptionResult> {
        if plaintext.is_empty() {
            return Err(CryptoError::EmptyInput("plaintext"));
        }
        if password.is_empty() {
            return Err(CryptoError::EmptyInput("password"));
        }

        let body = if options.compress {
            compression::compress(plaintext, self.config.compression_level)?
        } else {
            Zeroizing::new(plaintext.as_bytes().to_vec())
        };

        let salt = Salt::random(&self.provider)?;
        let sealed = cipher::seal(
            &self.provider,
            options.algorithm,
            password,
            &salt,
            &self.config.kdf,
            &body,
        )?;

        let envelope = EncryptionEnvelope {
            compressed: options.compress,
            salt,
            iterations: Some(self.config.kdf.iterations),
            sealed,
        };
        let payload = envelope.to_payload()?;

        debug!(
            algorithm = %options.algorithm,
            compressed = options.compress,
            bytes = payload.len(),
            "sealed envelope"
        );

        Ok(EncryptionResult {
            byte_length: payload.len(),
            payload,
            algorithm: options.algorithm,
            compressed: options.compress,
        })
    }

    /// Opens a payload produced by [`CryptoService::encrypt`] or by the
    /// legacy unversioned writer.
    pub fn decrypt(&self, payload: &str, password: &str) -> CryptoResult<String> {
        if payload.trim().is_empty() {
            return Err(CryptoError::EmptyInput("payload"));
        }
        if password.is_empty() {
            return Err(CryptoError::EmptyInput("password"));
        }

        let opening = Opening::from(parse_payload(payload)?);
        let mut body =
            cipher::open(&self.provider, &opening.sealed, password, &opening.salt, &opening.kdf)
                .inspect_err(|e| debug!(error = %e, "envelope did not open"))?;

        if opening.compressed {
            let mut text = compression::decompress(&body).map_err(|e| {
                debug!(error = %e, "authenticated body did not inflate");
                CryptoError::AuthenticationFailed
            })?;
            return Ok(std::mem::take(&mut *text));
        }

        String::from_utf8(std::mem::take(&mut *body)).map_err(|e| {
            e.into_bytes().zeroize();
            CryptoError::AuthenticationFailed
        })
    }
}

/// Everything needed to open a payload, whatever format it came in.
struct Opening {
    salt: Salt,
    kdf: KdfParams,
    sealed: SealedData,
    compressed: bool,
}

impl From<ParsedPayload> for Opening {
    fn from(parsed: ParsedPayload) -> Self {
        match parsed {
            ParsedPayload::Versioned(envelope) => {
                debug!(
                    version = envelope.version(),
                    algorithm = %envelope.algorithm(),
                    compressed = envelope.compressed,
                    "opening versioned envelope"
                );
                Opening {
                    kdf: envelope.kdf_params(),
                    salt: envelope.salt,
                    compressed: envelope.compressed,
                    sealed: envelope.sealed,
                }
            }
            ParsedPayload::Legacy(legacy) => {
                debug!("opening legacy unversioned payload");
                Opening {
                    kdf: legacy.kdf_params(),
                    salt: legacy.salt,
                    sealed: legacy.sealed(),
                    compressed: false,
                }
            }
        }
    }
}

/// Seals with the production provider and default configuration.
pub fn encrypt(
    plaintext: &str,
    password: &str,
    options: EncryptOptions,
) -> CryptoResult<EncryptionResult> {
    CryptoService::new().encrypt(plaintext, password, options)
}

/// Opens with the production provider.
pub fn decrypt(payload: &str, password: &str) -> CryptoResult<String> {
    CryptoService::new().decrypt(payload, password)
}
