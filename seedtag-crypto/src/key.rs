//! Password-based key derivation.
//!
//! Keys come from PBKDF2-HMAC-SHA256 over the password and a random 16-byte
//! salt. The CBC+HMAC scheme needs two keys; both come out of a single
//! 512-bit derivation split in half, so the expensive KDF runs once per call.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{CryptoError, CryptoResult};
use crate::provider::CryptoProvider;

/// Salt length in bytes.
pub const SALT_SIZE: usize = 16;

/// Length of one AES-256 or HMAC-SHA256 key in bytes.
pub const KEY_SIZE: usize = 32;

/// Bits derived for an AES-256 key.
pub const KEY_LENGTH_BITS: usize = KEY_SIZE * 8;

/// Bits derived for the HMAC-SHA256 key of the CBC scheme.
pub const HMAC_KEY_LENGTH_BITS: usize = 256;

/// Iteration count for newly sealed envelopes and for payloads that do not
/// record their own count.
pub const PBKDF2_ITERATIONS: u32 = 310_000;

/// Lowest iteration count a [`KdfParams`] may be configured with.
pub const MIN_PBKDF2_ITERATIONS: u32 = 1_000;

/// Highest iteration count accepted from configuration or from a payload.
pub const MAX_PBKDF2_ITERATIONS: u32 = 10_000_000;

/// Random salt stored alongside every ciphertext.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Salt([u8; SALT_SIZE]);

impl Salt {
    /// Draws a fresh salt from the provider's random source.
    pub fn random<P: CryptoProvider + ?Sized>(provider: &P) -> CryptoResult<Self> {
        let mut bytes = [0u8; SALT_SIZE];
        provider.fill_random(&mut bytes)?;
        Ok(Self(bytes))
    }

    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self(bytes)
    }

    /// Builds a salt from a decoded payload field.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let arr: [u8; SALT_SIZE] = bytes.try_into().map_err(|_| {
            CryptoError::MalformedPayload(format!(
                "salt must be {SALT_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.0
    }
}

/// PBKDF2 cost parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: PBKDF2_ITERATIONS,
        }
    }
}

impl KdfParams {
    pub fn with_iterations(iterations: u32) -> Self {
        Self { iterations }
    }

    /// Checks the parameters are usable for sealing new envelopes.
    pub fn validate(&self) -> CryptoResult<()> {
        if !(MIN_PBKDF2_ITERATIONS..=MAX_PBKDF2_ITERATIONS).contains(&self.iterations) {
            return Err(CryptoError::InvalidConfig(format!(
                "PBKDF2 iterations must be between {MIN_PBKDF2_ITERATIONS} and \
                 {MAX_PBKDF2_ITERATIONS}, got {}",
                self.iterations
            )));
        }
        Ok(())
    }
}

/// A 256-bit key, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_SIZE]);

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey([REDACTED])")
    }
}

/// Encryption and MAC keys cut from one derivation.
#[derive(Debug)]
pub struct SplitKeys {
    pub encryption: DerivedKey,
    pub mac: DerivedKey,
}

/// Derives `output_bits` of key material from a password.
pub fn derive_bits<P: CryptoProvider + ?Sized>(
    provider: &P,
    password: &str,
    salt: &Salt,
    params: &KdfParams,
    output_bits: usize,
) -> CryptoResult<Zeroizing<Vec<u8>>> {
    if output_bits == 0 || output_bits % 8 != 0 {
        return Err(CryptoError::InvalidConfig(format!(
            "derived length must be a positive multiple of 8 bits, got {output_bits}"
        )));
    }

    let mut out = Zeroizing::new(vec![0u8; output_bits / 8]);
    provider.pbkdf2_sha256(
        password.as_bytes(),
        salt.as_bytes(),
        params.iterations,
        &mut out,
    )?;
    Ok(out)
}

/// Derives a single AES-256-GCM key.
pub fn derive_key<P: CryptoProvider + ?Sized>(
    provider: &P,
    password: &str,
    salt: &Salt,
    params: &KdfParams,
) -> CryptoResult<DerivedKey> {
    let material = derive_bits(provider, password, salt, params, KEY_LENGTH_BITS)?;
    Ok(DerivedKey(slice_key(&material[..KEY_SIZE])?))
}

/// Derives the AES-CBC and HMAC keys: first half encrypts, second half MACs.
pub fn derive_split_keys<P: CryptoProvider + ?Sized>(
    provider: &P,
    password: &str,
    salt: &Salt,
    params: &KdfParams,
) -> CryptoResult<SplitKeys> {
    let material = derive_bits(
        provider,
        password,
        salt,
        params,
        KEY_LENGTH_BITS + HMAC_KEY_LENGTH_BITS,
    )?;
    let (encryption, mac) = material.split_at(KEY_SIZE);

    Ok(SplitKeys {
        encryption: DerivedKey(slice_key(encryption)?),
        mac: DerivedKey(slice_key(mac)?),
    })
}

fn slice_key(bytes: &[u8]) -> CryptoResult<[u8; KEY_SIZE]> {
    bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: bytes.len(),
        })
}
