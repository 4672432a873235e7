//! AES-256-CBC + HMAC-SHA256, encrypt-then-MAC.

use zeroize::Zeroizing;

use super::{authentication_failure, SealedData, CBC_IV_SIZE};
use crate::error::{CryptoError, CryptoResult};
use crate::key::SplitKeys;
use crate::provider::CryptoProvider;

/// The MAC covers the IV and the ciphertext, in that order.
fn mac_input(iv: &[u8; CBC_IV_SIZE], ciphertext: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(iv.len() + ciphertext.len());
    data.extend_from_slice(iv);
    data.extend_from_slice(ciphertext);
    data
}

pub(super) fn seal<P: CryptoProvider + ?Sized>(
    provider: &P,
    keys: &SplitKeys,
    plaintext: &[u8],
) -> CryptoResult<SealedData> {
    let mut iv = [0u8; CBC_IV_SIZE];
    provider.fill_random(&mut iv)?;

    let ciphertext = provider.aes_cbc_encrypt(keys.encryption.as_bytes(), &iv, plaintext)?;
    let mac = provider.hmac_sha256(keys.mac.as_bytes(), &mac_input(&iv, &ciphertext))?;

    Ok(SealedData::AesCbcHmac {
        iv,
        ciphertext,
        mac: mac.to_vec(),
    })
}

/// Verifies the MAC, and only then decrypts and unpads.
pub(super) fn open<P: CryptoProvider + ?Sized>(
    provider: &P,
    keys: &SplitKeys,
    iv: &[u8; CBC_IV_SIZE],
    ciphertext: &[u8],
    mac: &[u8],
) -> CryptoResult<Zeroizing<Vec<u8>>> {
    let authentic = provider
        .hmac_sha256_verify(keys.mac.as_bytes(), &mac_input(iv, ciphertext), mac)
        .map_err(authentication_failure)?;
    if !authentic {
        return Err(CryptoError::AuthenticationFailed);
    }

    provider
        .aes_cbc_decrypt(keys.encryption.as_bytes(), iv, ciphertext)
        .map(Zeroizing::new)
        .map_err(authentication_failure)
}
