//! Shared helpers for seedtag-crypto integration tests.

#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use seedtag_crypto::cipher::{CBC_IV_SIZE, GCM_IV_SIZE, MAC_SIZE};
use seedtag_crypto::{
    CryptoConfig, CryptoError, CryptoProvider, CryptoResult, CryptoService, KdfParams,
    SystemProvider, KEY_SIZE, MIN_PBKDF2_ITERATIONS,
};

/// A 24-word BIP39 phrase, the typical thing stored on a tag.
pub const SEED_PHRASE: &str = "legal winner thank year wave sausage worth useful legal winner \
                               thank year wave sausage worth useful legal winner thank year \
                               wave sausage worth title";

pub const PASSWORD: &str = "correct horse battery staple";

/// Cheapest configuration the service accepts.
pub fn fast_config() -> CryptoConfig {
    CryptoConfig {
        kdf: KdfParams::with_iterations(MIN_PBKDF2_ITERATIONS),
        ..CryptoConfig::default()
    }
}

pub fn fast_service() -> CryptoService {
    CryptoService::with_provider(SystemProvider, fast_config()).unwrap()
}

/// Decodes a versioned payload into its JSON object.
pub fn payload_json(payload: &str) -> serde_json::Value {
    serde_json::from_slice(&BASE64.decode(payload).unwrap()).unwrap()
}

/// Re-encodes a JSON object as a payload string.
pub fn json_payload(json: &serde_json::Value) -> String {
    BASE64.encode(serde_json::to_vec(json).unwrap())
}

/// Decodes a base64 field of a payload JSON object.
pub fn field_bytes(json: &serde_json::Value, field: &str) -> Vec<u8> {
    BASE64.decode(json[field].as_str().unwrap()).unwrap()
}

/// Replaces a base64 field of a payload JSON object.
pub fn set_field_bytes(json: &mut serde_json::Value, field: &str, bytes: &[u8]) {
    json[field] = BASE64.encode(bytes).into();
}

/// Provider whose random source is gone. Everything else is real.
pub struct NoEntropyProvider;

impl CryptoProvider for NoEntropyProvider {
    fn fill_random(&self, _dest: &mut [u8]) -> CryptoResult<()> {
        Err(CryptoError::ProviderUnavailable(
            "random source offline".to_string(),
        ))
    }

    fn pbkdf2_sha256(
        &self,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
        out: &mut [u8],
    ) -> CryptoResult<()> {
        SystemProvider.pbkdf2_sha256(password, salt, iterations, out)
    }

    fn aes_gcm_encrypt(
        &self,
        key: &[u8; KEY_SIZE],
        iv: &[u8; GCM_IV_SIZE],
        plaintext: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        SystemProvider.aes_gcm_encrypt(key, iv, plaintext)
    }

    fn aes_gcm_decrypt(
        &self,
        key: &[u8; KEY_SIZE],
        iv: &[u8; GCM_IV_SIZE],
        ciphertext: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        SystemProvider.aes_gcm_decrypt(key, iv, ciphertext)
    }

    fn aes_cbc_encrypt(
        &self,
        key: &[u8; KEY_SIZE],
        iv: &[u8; CBC_IV_SIZE],
        plaintext: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        SystemProvider.aes_cbc_encrypt(key, iv, plaintext)
    }

    fn aes_cbc_decrypt(
        &self,
        key: &[u8; KEY_SIZE],
        iv: &[u8; CBC_IV_SIZE],
        ciphertext: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        SystemProvider.aes_cbc_decrypt(key, iv, ciphertext)
    }

    fn hmac_sha256(&self, key: &[u8; KEY_SIZE], data: &[u8]) -> CryptoResult<[u8; MAC_SIZE]> {
        SystemProvider.hmac_sha256(key, data)
    }
}

/// Provider whose "random" bytes are all `byte`, so sealing is
/// reproducible.
pub struct FixedRandomProvider {
    pub byte: u8,
}

impl CryptoProvider for FixedRandomProvider {
    fn fill_random(&self, dest: &mut [u8]) -> CryptoResult<()> {
        dest.fill(self.byte);
        Ok(())
    }

    fn pbkdf2_sha256(
        &self,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
        out: &mut [u8],
    ) -> CryptoResult<()> {
        SystemProvider.pbkdf2_sha256(password, salt, iterations, out)
    }

    fn aes_gcm_encrypt(
        &self,
        key: &[u8; KEY_SIZE],
        iv: &[u8; GCM_IV_SIZE],
        plaintext: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        SystemProvider.aes_gcm_encrypt(key, iv, plaintext)
    }

    fn aes_gcm_decrypt(
        &self,
        key: &[u8; KEY_SIZE],
        iv: &[u8; GCM_IV_SIZE],
        ciphertext: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        SystemProvider.aes_gcm_decrypt(key, iv, ciphertext)
    }

    fn aes_cbc_encrypt(
        &self,
        key: &[u8; KEY_SIZE],
        iv: &[u8; CBC_IV_SIZE],
        plaintext: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        SystemProvider.aes_cbc_encrypt(key, iv, plaintext)
    }

    fn aes_cbc_decrypt(
        &self,
        key: &[u8; KEY_SIZE],
        iv: &[u8; CBC_IV_SIZE],
        ciphertext: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        SystemProvider.aes_cbc_decrypt(key, iv, ciphertext)
    }

    fn hmac_sha256(&self, key: &[u8; KEY_SIZE], data: &[u8]) -> CryptoResult<[u8; MAC_SIZE]> {
        SystemProvider.hmac_sha256(key, data)
    }
}
