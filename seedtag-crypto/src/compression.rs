//! Optional zlib (DEFLATE) compression of plaintext before encryption.

use std::io::Read;

use flate2::read::{ZlibDecoder, ZlibEncoder};
use flate2::Compression;
use zeroize::Zeroizing;

use crate::error::{CryptoError, CryptoResult};

/// Default zlib level for sealed envelopes.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// UTF-8 encodes `text` and deflates it.
pub fn compress(text: &str, level: u32) -> CryptoResult<Zeroizing<Vec<u8>>> {
    if level > 9 {
        return Err(CryptoError::InvalidConfig(format!(
            "compression level must be 0-9, got {level}"
        )));
    }

    let mut encoder = ZlibEncoder::new(text.as_bytes(), Compression::new(level));
    let mut output = Zeroizing::new(Vec::new());
    encoder
        .read_to_end(&mut output)
        .map_err(|e| CryptoError::Compression(e.to_string()))?;
    Ok(output)
}

/// Inflates `data` and decodes the result as UTF-8.
pub fn decompress(data: &[u8]) -> CryptoResult<Zeroizing<String>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut output = Zeroizing::new(Vec::new());
    decoder
        .read_to_end(&mut output)
        .map_err(|e| CryptoError::Compression(e.to_string()))?;

    let text = String::from_utf8(std::mem::take(&mut *output))
        .map_err(|e| CryptoError::Compression(format!("inflated data is not UTF-8: {e}")))?;
    Ok(Zeroizing::new(text))
}
