//! Authenticated encryption schemes.
//!
//! Two interchangeable schemes seal a plaintext under a password:
//!
//! - [`Algorithm::AesGcm`]: AES-256-GCM with a 96-bit random IV. The
//!   authentication tag travels inside the ciphertext.
//! - [`Algorithm::AesCbcHmac`]: AES-256-CBC with PKCS#7 padding, followed by
//!   HMAC-SHA256 over `iv || ciphertext` (encrypt-then-MAC). The MAC is
//!   verified before any CBC decryption happens.
//!
//! [`seal`] and [`open`] dispatch on the variant; each scheme lives in its
//! own module.

mod cbc_hmac;
mod gcm;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{CryptoError, CryptoResult};
use crate::key::{derive_key, derive_split_keys, KdfParams, Salt};
use crate::provider::CryptoProvider;

/// AES-GCM nonce length in bytes.
pub const GCM_IV_SIZE: usize = 12;

/// AES-GCM authentication tag length in bytes.
pub const GCM_TAG_SIZE: usize = 16;

/// AES-CBC IV length in bytes (one AES block).
pub const CBC_IV_SIZE: usize = 16;

/// HMAC-SHA256 output length in bytes.
pub const MAC_SIZE: usize = 32;

/// Encryption scheme identifier as it appears on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    #[default]
    #[serde(rename = "aes-gcm")]
    AesGcm,
    #[serde(rename = "aes-cbc")]
    AesCbcHmac,
}

impl Algorithm {
    /// Every supported scheme, recommended first.
    pub const ALL: [Algorithm; 2] = [Algorithm::AesGcm, Algorithm::AesCbcHmac];

    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::AesGcm => "aes-gcm",
            Algorithm::AesCbcHmac => "aes-cbc",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aes-gcm" => Ok(Algorithm::AesGcm),
            "aes-cbc" => Ok(Algorithm::AesCbcHmac),
            other => Err(CryptoError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Output of one scheme: everything except the salt needed to open it again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SealedData {
    AesGcm {
        iv: [u8; GCM_IV_SIZE],
        /// Ciphertext with the GCM tag appended.
        ciphertext: Vec<u8>,
    },
    AesCbcHmac {
        iv: [u8; CBC_IV_SIZE],
        ciphertext: Vec<u8>,
        mac: Vec<u8>,
    },
}

impl SealedData {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            SealedData::AesGcm { .. } => Algorithm::AesGcm,
            SealedData::AesCbcHmac { .. } => Algorithm::AesCbcHmac,
        }
    }

    pub fn iv(&self) -> &[u8] {
        match self {
            SealedData::AesGcm { iv, .. } => iv,
            SealedData::AesCbcHmac { iv, .. } => iv,
        }
    }

    pub fn ciphertext(&self) -> &[u8] {
        match self {
            SealedData::AesGcm { ciphertext, .. } => ciphertext,
            SealedData::AesCbcHmac { ciphertext, .. } => ciphertext,
        }
    }

    pub fn mac(&self) -> Option<&[u8]> {
        match self {
            SealedData::AesGcm { .. } => None,
            SealedData::AesCbcHmac { mac, .. } => Some(mac),
        }
    }
}

/// Derives the scheme's keys from `password` and encrypts `plaintext`.
pub fn seal<P: CryptoProvider + ?Sized>(
    provider: &P,
    algorithm: Algorithm,
    password: &str,
    salt: &Salt,
    params: &KdfParams,
    plaintext: &[u8],
) -> CryptoResult<SealedData> {
    match algorithm {
        Algorithm::AesGcm => {
            let key = derive_key(provider, password, salt, params)?;
            gcm::seal(provider, &key, plaintext)
        }
        Algorithm::AesCbcHmac => {
            let keys = derive_split_keys(provider, password, salt, params)?;
            cbc_hmac::seal(provider, &keys, plaintext)
        }
    }
}

/// Derives the scheme's keys from `password`, authenticates and decrypts.
///
/// Wrong passwords and tampering both surface as
/// [`CryptoError::AuthenticationFailed`].
pub fn open<P: CryptoProvider + ?Sized>(
    provider: &P,
    sealed: &SealedData,
    password: &str,
    salt: &Salt,
    params: &KdfParams,
) -> CryptoResult<Zeroizing<Vec<u8>>> {
    match sealed {
        SealedData::AesGcm { iv, ciphertext } => {
            let key = derive_key(provider, password, salt, params)?;
            gcm::open(provider, &key, iv, ciphertext)
        }
        SealedData::AesCbcHmac {
            iv,
            ciphertext,
            mac,
        } => {
            let keys = derive_split_keys(provider, password, salt, params)?;
            cbc_hmac::open(provider, &keys, iv, ciphertext, mac)
        }
    }
}

/// Compares two byte strings without exiting early on the first mismatch.
///
/// Lengths are checked first; equal-length inputs are always scanned in
/// full.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    std::hint::black_box(diff) == 0
}

/// Collapses a primitive failure on the open path into the generic error.
/// Only a missing randomness/primitive source stays distinct.
fn authentication_failure(err: CryptoError) -> CryptoError {
    match err {
        CryptoError::ProviderUnavailable(_) => err,
        _ => CryptoError::AuthenticationFailed,
    }
}
