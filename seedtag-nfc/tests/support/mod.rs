//! Shared helpers for seedtag-nfc integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Condvar, Mutex};

use async_trait::async_trait;
use seedtag_crypto::cipher::{CBC_IV_SIZE, GCM_IV_SIZE, MAC_SIZE};
use seedtag_crypto::{
    CryptoConfig, CryptoProvider, CryptoResult, CryptoService, KdfParams, SystemProvider,
    KEY_SIZE, MIN_PBKDF2_ITERATIONS,
};
use seedtag_nfc::{MemoryTag, SeedSession, TagConfig, TagRecord, TagResult, TagTransport};

pub const SEED_PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon \
                               abandon abandon abandon about";

pub const PASSWORD: &str = "tag password";

pub fn fast_config() -> CryptoConfig {
    CryptoConfig {
        kdf: KdfParams::with_iterations(MIN_PBKDF2_ITERATIONS),
        ..CryptoConfig::default()
    }
}

/// Session over a fresh [`MemoryTag`] with cheap key derivation.
pub fn memory_session() -> SeedSession<MemoryTag> {
    seedtag_nfc::init_logging();
    session_with(MemoryTag::new(), TagConfig::default())
}

pub fn session_with<T: TagTransport>(transport: T, config: TagConfig) -> SeedSession<T> {
    let crypto = CryptoService::with_config(fast_config()).unwrap();
    SeedSession::new(Arc::new(crypto), transport, config)
}

/// One-shot latch that blocked threads wait on.
#[derive(Default)]
pub struct Gate {
    open: Mutex<bool>,
    opened: Condvar,
}

impl Gate {
    pub fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.opened.notify_all();
    }

    fn wait(&self) {
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.opened.wait(open).unwrap();
        }
    }
}

/// Real primitives, but key derivation blocks until the gate opens.
pub struct GatedProvider {
    pub gate: Arc<Gate>,
}

impl CryptoProvider for GatedProvider {
    fn fill_random(&self, dest: &mut [u8]) -> CryptoResult<()> {
        SystemProvider.fill_random(dest)
    }

    fn pbkdf2_sha256(
        &self,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
        out: &mut [u8],
    ) -> CryptoResult<()> {
        self.gate.wait();
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

/// Session whose crypto work stalls until `gate` opens.
pub fn gated_session(gate: Arc<Gate>) -> SeedSession<MemoryTag, GatedProvider> {
    let crypto = CryptoService::with_provider(GatedProvider { gate }, fast_config()).unwrap();
    SeedSession::new(Arc::new(crypto), MemoryTag::new(), TagConfig::default())
}

/// A tag that corrupts the last character of whatever it stores.
#[derive(Default)]
pub struct CorruptingTag {
    inner: MemoryTag,
}

#[async_trait]
impl TagTransport for CorruptingTag {
    async fn is_available(&self) -> bool {
        self.inner.is_available().await
    }

    async fn write(&self, payload: &str) -> TagResult<()> {
        let mut corrupted = payload.to_string();
        let last = if corrupted.pop() == Some('A') { 'B' } else { 'A' };
        corrupted.push(last);
        self.inner.write(&corrupted).await
    }

    async fn read(&self) -> TagResult<TagRecord> {
        self.inner.read().await
    }
}
