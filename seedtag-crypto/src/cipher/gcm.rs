//! AES-256-GCM.

use zeroize::Zeroizing;

use super::{authentication_failure, SealedData, GCM_IV_SIZE, GCM_TAG_SIZE};
use crate::error::{CryptoError, CryptoResult};
use crate::key::DerivedKey;
use crate::provider::CryptoProvider;

/// Encrypts under a fresh random IV. No associated data.
pub(super) fn seal<P: CryptoProvider + ?Sized>(
    provider: &P,
    key: &DerivedKey,
    plaintext: &[u8],
) -> CryptoResult<SealedData> {
    let mut iv = [0u8; GCM_IV_SIZE];
    provider.fill_random(&mut iv)?;

    let ciphertext = provider.aes_gcm_encrypt(key.as_bytes(), &iv, plaintext)?;
    Ok(SealedData::AesGcm { iv, ciphertext })
}

/// Decrypts and verifies the tag in one step.
pub(super) fn open<P: CryptoProvider + ?Sized>(
    provider: &P,
    key: &DerivedKey,
    iv: &[u8; GCM_IV_SIZE],
    ciphertext: &[u8],
) -> CryptoResult<Zeroizing<Vec<u8>>> {
    if ciphertext.len() < GCM_TAG_SIZE {
        return Err(CryptoError::AuthenticationFailed);
    }

    provider
        .aes_gcm_decrypt(key.as_bytes(), iv, ciphertext)
        .map(Zeroizing::new)
        .map_err(authentication_failure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KEY_SIZE;
    use crate::provider::SystemProvider;

    #[test]
    fn fresh_iv_per_seal() {
        let key = DerivedKey::from_bytes([1u8; KEY_SIZE]);
        let a = seal(&SystemProvider, &key, b"same").unwrap();
        let b = seal(&SystemProvider, &key, b"same").unwrap();
        assert_ne!(a.iv(), b.iv());
        assert_ne!(a.ciphertext(), b.ciphertext());
    }

    #[test]
    fn truncated_ciphertext_fails_generically() {
        let key = DerivedKey::from_bytes([1u8; KEY_SIZE]);
        let err = open(&SystemProvider, &key, &[0u8; GCM_IV_SIZE], &[0u8; 8]).unwrap_err();
        assert!(err.is_authentication_failure());
    }

    #[test]
    fn flipped_tag_byte_detected() {
        let key = DerivedKey::from_bytes([1u8; KEY_SIZE]);
        let SealedData::AesGcm { iv, mut ciphertext } =
            seal(&SystemProvider, &key, b"tagged").unwrap()
        else {
            panic!("GCM seal produced a different variant");
        };
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0x01;

        let err = open(&SystemProvider, &key, &iv, &ciphertext).unwrap_err();
        assert!(err.is_authentication_failure());
    }

    #[test]
    fn wrong_key_fails() {
        let key = DerivedKey::from_bytes([1u8; KEY_SIZE]);
        let other = DerivedKey::from_bytes([2u8; KEY_SIZE]);
        let sealed = seal(&SystemProvider, &key, b"secret").unwrap();
        let SealedData::AesGcm { iv, ciphertext } = &sealed else {
            panic!("GCM seal produced a different variant");
        };
        assert!(open(&SystemProvider, &other, iv, ciphertext).is_err());
    }
}
