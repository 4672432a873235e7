//! Async session tying the envelope service to a tag.
//!
//! Key derivation is deliberately slow, so every crypto call runs on the
//! blocking pool and the caller's executor stays responsive.

use std::sync::Arc;

use seedtag_crypto::{
    CryptoProvider, CryptoResult, CryptoService, EncryptOptions, EncryptionResult,
    SystemProvider,
};
use tokio::task::JoinError;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::config::TagConfig;
use crate::error::{SessionError, SessionResult};
use crate::preview::{Generations, VariantKey, VariantPreview};
use crate::transport::TagTransport;
use crate::verify::{write_and_verify, WriteOutcome};

/// Result of storing a seed on a tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreReport {
    pub result: EncryptionResult,
    pub outcome: WriteOutcome,
}

/// Encrypts seeds for, and recovers them from, one tag transport.
pub struct SeedSession<T, P = SystemProvider> {
    crypto: Arc<CryptoService<P>>,
    transport: T,
    config: TagConfig,
    generations: Generations,
}

impl<T, P> SeedSession<T, P>
where
    T: TagTransport,
    P: CryptoProvider + 'static,
{
    pub fn new(crypto: Arc<CryptoService<P>>, transport: T, config: TagConfig) -> Self {
        Self {
            crypto,
            transport,
            config,
            generations: Generations::default(),
        }
    }

    pub fn crypto(&self) -> &Arc<CryptoService<P>> {
        &self.crypto
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &TagConfig {
        &self.config
    }

    pub async fn encrypt(
        &self,
        plaintext: &str,
        password: &str,
        options: EncryptOptions,
    ) -> SessionResult<EncryptionResult> {
        let crypto = Arc::clone(&self.crypto);
        let plaintext = Zeroizing::new(plaintext.to_owned());
        let password = Zeroizing::new(password.to_owned());

        run_blocking(move || crypto.encrypt(&plaintext, &password, options)).await
    }

    pub async fn decrypt(&self, payload: &str, password: &str) -> SessionResult<String> {
        let crypto = Arc::clone(&self.crypto);
        let payload = payload.to_owned();
        let password = Zeroizing::new(password.to_owned());

        run_blocking(move || crypto.decrypt(&payload, &password)).await
    }

    /// Seals `plaintext` under every variant at once.
    ///
    /// Fails with [`SessionError::Stale`] if another preview was requested,
    /// or [`SeedSession::invalidate_previews`] was called, before this one
    /// finished.
    pub async fn compute_variants(
        &self,
        plaintext: &str,
        password: &str,
    ) -> SessionResult<VariantPreview> {
        let generation = self.generations.advance();
        let plaintext = Arc::new(Zeroizing::new(plaintext.to_owned()));
        let password = Arc::new(Zeroizing::new(password.to_owned()));

        let handles: Vec<_> = VariantKey::ALL
            .into_iter()
            .map(|key| {
                let crypto = Arc::clone(&self.crypto);
                let plaintext = Arc::clone(&plaintext);
                let password = Arc::clone(&password);
                let handle = tokio::task::spawn_blocking(move || {
                    crypto.encrypt(&plaintext, &password, key.options())
                });
                (key, handle)
            })
            .collect();

        let mut preview = VariantPreview::new(generation);
        for (key, handle) in handles {
            let result = handle.await.map_err(task_failed)??;
            preview.insert(key, result);
        }

        if !self.generations.is_current(generation) {
            debug!(
                generation,
                current = self.generations.current(),
                "discarding stale variant preview"
            );
            return Err(SessionError::Stale);
        }

        debug!(
            generation,
            sizes = ?preview.sizes().collect::<Vec<_>>(),
            "variant preview ready"
        );
        Ok(preview)
    }

    /// Makes any preview still in flight come back as stale, e.g. after the
    /// user edited the seed or the password.
    pub fn invalidate_previews(&self) {
        let generation = self.generations.advance();
        debug!(generation, "variant previews invalidated");
    }

    /// Number of the most recent preview request.
    pub fn preview_generation(&self) -> u64 {
        self.generations.current()
    }

    /// Encrypts `plaintext` and writes the payload to the tag.
    pub async fn store_to_tag(
        &self,
        plaintext: &str,
        password: &str,
        options: EncryptOptions,
    ) -> SessionResult<StoreReport> {
        let result = self.encrypt(plaintext, password, options).await?;
        let outcome = self.store_payload(&result.payload).await?;
        Ok(StoreReport { result, outcome })
    }

    /// Writes an already sealed payload, such as one taken from a preview.
    pub async fn store_payload(&self, payload: &str) -> SessionResult<WriteOutcome> {
        let outcome = write_and_verify(&self.transport, payload, &self.config).await?;
        if outcome == WriteOutcome::Mismatch {
            warn!(bytes = payload.len(), "stored payload failed verification");
        }
        Ok(outcome)
    }

    /// Reads the tag and decrypts its payload.
    pub async fn load_from_tag(&self, password: &str) -> SessionResult<String> {
        let record = self.transport.read().await?;
        info!(tag_id = %record.id, bytes = record.payload.len(), "tag read");
        self.decrypt(&record.payload, password).await
    }
}

async fn run_blocking<F, R>(f: F) -> SessionResult<R>
where
    F: FnOnce() -> CryptoResult<R> + Send + 'static,
    R: Send + 'static,
{
    let result = tokio::task::spawn_blocking(f).await.map_err(task_failed)??;
    Ok(result)
}

fn task_failed(err: JoinError) -> SessionError {
    warn!("crypto task panicked: {}", err);
    SessionError::Task(err.to_string())
}
