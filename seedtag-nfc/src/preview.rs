//! Side-by-side preview of every encryption variant.
//!
//! A user picking how to store a seed wants to see what each choice costs
//! in tag bytes before committing. Requests are numbered; a result that
//! comes back after a newer request started is thrown away.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use seedtag_crypto::{Algorithm, EncryptOptions, EncryptionResult};
use serde::{Deserialize, Serialize};

/// One `(algorithm, compress)` combination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantKey {
    pub algorithm: Algorithm,
    pub compress: bool,
}

impl VariantKey {
    /// Every variant, in display order.
    pub const ALL: [VariantKey; 4] = [
        VariantKey::new(Algorithm::AesGcm, false),
        VariantKey::new(Algorithm::AesGcm, true),
        VariantKey::new(Algorithm::AesCbcHmac, false),
        VariantKey::new(Algorithm::AesCbcHmac, true),
    ];

    pub const fn new(algorithm: Algorithm, compress: bool) -> Self {
        Self {
            algorithm,
            compress,
        }
    }

    pub fn options(&self) -> EncryptOptions {
        EncryptOptions::new(self.algorithm, self.compress)
    }
}

impl From<EncryptOptions> for VariantKey {
    fn from(options: EncryptOptions) -> Self {
        Self::new(options.algorithm, options.compress)
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.algorithm, u8::from(self.compress))
    }
}

/// Sealed payloads for every variant, from one preview request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VariantPreview {
    generation: u64,
    variants: HashMap<VariantKey, EncryptionResult>,
}

impl VariantPreview {
    pub(crate) fn new(generation: u64) -> Self {
        Self {
            generation,
            variants: HashMap::with_capacity(VariantKey::ALL.len()),
        }
    }

    pub(crate) fn insert(&mut self, key: VariantKey, result: EncryptionResult) {
        self.variants.insert(key, result);
    }

    /// Request number this preview answered.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get(&self, key: VariantKey) -> Option<&EncryptionResult> {
        self.variants.get(&key)
    }

    /// Moves one variant's result out, e.g. to write it to a tag.
    pub fn take(&mut self, key: VariantKey) -> Option<EncryptionResult> {
        self.variants.remove(&key)
    }

    pub fn byte_length(&self, key: VariantKey) -> Option<usize> {
        self.get(key).map(|result| result.byte_length)
    }

    /// Variants in display order with their payload sizes.
    pub fn sizes(&self) -> impl Iterator<Item = (VariantKey, usize)> + '_ {
        VariantKey::ALL
            .into_iter()
            .filter_map(|key| self.byte_length(key).map(|len| (key, len)))
    }

    /// Variant with the shortest payload; ties go to the earlier one in
    /// display order.
    pub fn smallest(&self) -> Option<(VariantKey, &EncryptionResult)> {
        VariantKey::ALL
            .into_iter()
            .filter_map(|key| self.get(key).map(|result| (key, result)))
            .min_by_key(|(_, result)| result.byte_length)
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

/// Monotonic request counter.
#[derive(Debug, Default)]
pub(crate) struct Generations(AtomicU64);

impl Generations {
    /// Starts a new request and returns its number.
    pub(crate) fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }
}
