//! Cryptographic primitive provider.
//!
//! Envelope code never touches a cipher or the OS random source directly;
//! it goes through a [`CryptoProvider`]. [`SystemProvider`] is the production
//! implementation on top of the RustCrypto crates and the operating system
//! RNG. Tests plug in providers with deterministic randomness or failure
//! injection.

use std::sync::Arc;

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use hmac::{Hmac, Mac};
use rand::TryRngCore;
use sha2::Sha256;

use crate::cipher::{constant_time_eq, CBC_IV_SIZE, GCM_IV_SIZE, MAC_SIZE};
use crate::error::{CryptoError, CryptoResult};
use crate::key::KEY_SIZE;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type HmacSha256 = Hmac<Sha256>;

/// Source of randomness and the primitives the envelope formats are built on.
///
/// Implementations hold no per-call state; a single provider can serve any
/// number of concurrent encrypt/decrypt calls.
pub trait CryptoProvider: Send + Sync {
    /// Fills `dest` with cryptographically secure random bytes.
    fn fill_random(&self, dest: &mut [u8]) -> CryptoResult<()>;

    /// PBKDF2-HMAC-SHA256 of `password` and `salt`, filling all of `out`.
    fn pbkdf2_sha256(
        &self,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
        out: &mut [u8],
    ) -> CryptoResult<()>;

    /// AES-256-GCM encryption without associated data. The tag is appended.
    fn aes_gcm_encrypt(
        &self,
        key: &[u8; KEY_SIZE],
        iv: &[u8; GCM_IV_SIZE],
        plaintext: &[u8],
    ) -> CryptoResult<Vec<u8>>;

    /// AES-256-GCM decryption and tag verification in one step.
    fn aes_gcm_decrypt(
        &self,
        key: &[u8; KEY_SIZE],
        iv: &[u8; GCM_IV_SIZE],
        ciphertext: &[u8],
    ) -> CryptoResult<Vec<u8>>;

    /// AES-256-CBC encryption with PKCS#7 padding.
    fn aes_cbc_encrypt(
        &self,
        key: &[u8; KEY_SIZE],
        iv: &[u8; CBC_IV_SIZE],
        plaintext: &[u8],
    ) -> CryptoResult<Vec<u8>>;

    /// AES-256-CBC decryption, removing PKCS#7 padding.
    fn aes_cbc_decrypt(
        &self,
        key: &[u8; KEY_SIZE],
        iv: &[u8; CBC_IV_SIZE],
        ciphertext: &[u8],
    ) -> CryptoResult<Vec<u8>>;

    /// HMAC-SHA256 of `data`.
    fn hmac_sha256(&self, key: &[u8; KEY_SIZE], data: &[u8]) -> CryptoResult<[u8; MAC_SIZE]>;

    /// Recomputes the HMAC of `data` and compares it to `expected` in
    /// constant time.
    fn hmac_sha256_verify(
        &self,
        key: &[u8; KEY_SIZE],
        data: &[u8],
        expected: &[u8],
    ) -> CryptoResult<bool> {
        let computed = self.hmac_sha256(key, data)?;
        Ok(constant_time_eq(&computed, expected))
    }
}

impl<P: CryptoProvider + ?Sized> CryptoProvider for Arc<P> {
    fn fill_random(&self, dest: &mut [u8]) -> CryptoResult<()> {
        (**self).fill_random(dest)
    }

    fn pbkdf2_sha256(
        &self,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
        out: &mut [u8],
    ) -> CryptoResult<()> {
        (**self).pbkdf2_sha256(password, salt, iterations, out)
    }

    fn aes_gcm_encrypt(
        &self,
        key: &[u8; KEY_SIZE],
        iv: &[u8; GCM_IV_SIZE],
        plaintext: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        (**self).aes_gcm_encrypt(key, iv, plaintext)
    }

    fn aes_gcm_decrypt(
        &self,
        key: &[u8; KEY_SIZE],
        iv: &[u8; GCM_IV_SIZE],
        ciphertext: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        (**self).aes_gcm_decrypt(key, iv, ciphertext)
    }

    fn aes_cbc_encrypt(
        &self,
        key: &[u8; KEY_SIZE],
        iv: &[u8; CBC_IV_SIZE],
        plaintext: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        (**self).aes_cbc_encrypt(key, iv, plaintext)
    }

    fn aes_cbc_decrypt(
        &self,
        key: &[u8; KEY_SIZE],
        iv: &[u8; CBC_IV_SIZE],
        ciphertext: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        (**self).aes_cbc_decrypt(key, iv, ciphertext)
    }

    fn hmac_sha256(&self, key: &[u8; KEY_SIZE], data: &[u8]) -> CryptoResult<[u8; MAC_SIZE]> {
        (**self).hmac_sha256(key, data)
    }

    fn hmac_sha256_verify(
        &self,
        key: &[u8; KEY_SIZE],
        data: &[u8],
        expected: &[u8],
    ) -> CryptoResult<bool> {
        (**self).hmac_sha256_verify(key, data, expected)
    }
}

/// Production provider: RustCrypto primitives and the OS random source.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemProvider;

impl CryptoProvider for SystemProvider {
    fn fill_random(&self, dest: &mut [u8]) -> CryptoResult<()> {
        rand::rngs::OsRng
            .try_fill_bytes(dest)
            .map_err(|e| CryptoError::ProviderUnavailable(format!("OS random source: {e}")))
    }

    fn pbkdf2_sha256(
        &self,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
        out: &mut [u8],
    ) -> CryptoResult<()> {
        if iterations == 0 {
            return Err(CryptoError::InvalidConfig(
                "PBKDF2 iteration count must be positive".to_string(),
            ));
        }
        pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, out);
        Ok(())
    }

    fn aes_gcm_encrypt(
        &self,
        key: &[u8; KEY_SIZE],
        iv: &[u8; GCM_IV_SIZE],
        plaintext: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: key.len(),
        })?;
        cipher
            .encrypt(Nonce::from_slice(iv), plaintext)
            .map_err(|e| CryptoError::Encryption(format!("AES-GCM: {e}")))
    }

    fn aes_gcm_decrypt(
        &self,
        key: &[u8; KEY_SIZE],
        iv: &[u8; GCM_IV_SIZE],
        ciphertext: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: key.len(),
        })?;
        cipher
            .decrypt(Nonce::from_slice(iv), ciphertext)
            .map_err(|_| CryptoError::AuthenticationFailed)
    }

    fn aes_cbc_encrypt(
        &self,
        key: &[u8; KEY_SIZE],
        iv: &[u8; CBC_IV_SIZE],
        plaintext: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        let cipher = Aes256CbcEnc::new_from_slices(key, iv).map_err(|_| {
            CryptoError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: key.len(),
            }
        })?;
        Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
    }

    fn aes_cbc_decrypt(
        &self,
        key: &[u8; KEY_SIZE],
        iv: &[u8; CBC_IV_SIZE],
        ciphertext: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        let cipher = Aes256CbcDec::new_from_slices(key, iv).map_err(|_| {
            CryptoError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: key.len(),
            }
        })?;
        cipher
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CryptoError::AuthenticationFailed)
    }

    fn hmac_sha256(&self, key: &[u8; KEY_SIZE], data: &[u8]) -> CryptoResult<[u8; MAC_SIZE]> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(key).map_err(|_| {
            CryptoError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: key.len(),
            }
        })?;
        mac.update(data);
        let digest = mac.finalize().into_bytes();

        let mut out = [0u8; MAC_SIZE];
        out.copy_from_slice(&digest);
        Ok(out)
    }
}
