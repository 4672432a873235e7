//! Envelope wire format.
//!
//! A payload is always a base64 string. Its decoded bytes are one of:
//!
//! 1. **Versioned** (current): compact JSON
//!    `{"version":1,"algorithm":"aes-gcm"|"aes-cbc","compressed":bool,
//!    "salt":b64,"iv":b64,"ciphertext":b64,"mac":b64?,"iterations":n?}`.
//!    `mac` is present for `aes-cbc` only. `iterations` records the PBKDF2
//!    count the envelope was sealed with; readers fall back to
//!    [`PBKDF2_ITERATIONS`] when it is absent.
//! 2. **Legacy** (read-only): raw `salt(16) || iv(12) || ciphertext`,
//!    AES-GCM with the tag appended, never compressed.
//!
//! Detection is structural: [`parse_payload`] runs an ordered chain of
//! format parsers and the first one that recognizes the bytes decides.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::cipher::{Algorithm, SealedData, CBC_IV_SIZE, GCM_IV_SIZE};
use crate::error::{CryptoError, CryptoResult};
use crate::key::{KdfParams, Salt, MAX_PBKDF2_ITERATIONS, PBKDF2_ITERATIONS, SALT_SIZE};

/// Version written into every new envelope.
pub const ENVELOPE_VERSION: u64 = 1;

/// Bytes before the ciphertext in a legacy payload.
pub const LEGACY_HEADER_SIZE: usize = SALT_SIZE + GCM_IV_SIZE;

/// JSON shape on the wire. Byte fields are base64 strings and `algorithm`
/// stays a string so an unknown value can be reported as such.
#[derive(Debug, Serialize, Deserialize)]
struct WireEnvelope {
    version: u64,
    algorithm: String,
    #[serde(default)]
    compressed: bool,
    salt: String,
    iv: String,
    ciphertext: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mac: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iterations: Option<u32>,
}

/// Just enough of the JSON to tell structured data from raw bytes.
#[derive(Deserialize)]
struct VersionProbe {
    version: u64,
}

/// A decoded versioned envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptionEnvelope {
    pub compressed: bool,
    pub salt: Salt,
    /// PBKDF2 iterations used when sealing; `None` for envelopes written
    /// before the count was recorded.
    pub iterations: Option<u32>,
    pub sealed: SealedData,
}

impl EncryptionEnvelope {
    pub fn version(&self) -> u64 {
        ENVELOPE_VERSION
    }

    pub fn algorithm(&self) -> Algorithm {
        self.sealed.algorithm()
    }

    /// KDF parameters needed to open this envelope.
    pub fn kdf_params(&self) -> KdfParams {
        KdfParams::with_iterations(self.iterations.unwrap_or(PBKDF2_ITERATIONS))
    }

    /// Serializes to compact JSON and base64-encodes the result.
    pub fn to_payload(&self) -> CryptoResult<String> {
        let json = serde_json::to_vec(&self.to_wire())?;
        Ok(BASE64.encode(json))
    }

    fn to_wire(&self) -> WireEnvelope {
        WireEnvelope {
            version: ENVELOPE_VERSION,
            algorithm: self.algorithm().as_str().to_string(),
            compressed: self.compressed,
            salt: BASE64.encode(self.salt.as_bytes()),
            iv: BASE64.encode(self.sealed.iv()),
            ciphertext: BASE64.encode(self.sealed.ciphertext()),
            mac: self.sealed.mac().map(|mac| BASE64.encode(mac)),
            iterations: self.iterations,
        }
    }

    fn from_wire(wire: WireEnvelope) -> CryptoResult<Self> {
        let algorithm: Algorithm = wire.algorithm.parse()?;
        let salt = Salt::from_slice(&decode_field("salt", &wire.salt)?)?;
        let iv = decode_field("iv", &wire.iv)?;
        let ciphertext = decode_field("ciphertext", &wire.ciphertext)?;

        if let Some(iterations) = wire.iterations {
            if iterations == 0 || iterations > MAX_PBKDF2_ITERATIONS {
                return Err(CryptoError::MalformedPayload(format!(
                    "iteration count {iterations} out of range"
                )));
            }
        }

        let sealed = match algorithm {
            Algorithm::AesGcm => SealedData::AesGcm {
                iv: fixed_iv::<GCM_IV_SIZE>(&iv)?,
                ciphertext,
            },
            Algorithm::AesCbcHmac => SealedData::AesCbcHmac {
                iv: fixed_iv::<CBC_IV_SIZE>(&iv)?,
                ciphertext,
                // A missing MAC can never verify; let the MAC check reject it
                // with the generic error.
                mac: match wire.mac.as_deref() {
                    Some(mac) => decode_field("mac", mac)?,
                    None => Vec::new(),
                },
            },
        };

        Ok(Self {
            compressed: wire.compressed,
            salt,
            iterations: wire.iterations,
            sealed,
        })
    }
}

/// A decoded legacy payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegacyEnvelope {
    pub salt: Salt,
    pub iv: [u8; GCM_IV_SIZE],
    /// GCM ciphertext with the tag appended.
    pub ciphertext: Vec<u8>,
}

impl LegacyEnvelope {
    /// Legacy payloads were always derived at the current iteration count.
    pub fn kdf_params(&self) -> KdfParams {
        KdfParams::with_iterations(PBKDF2_ITERATIONS)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(LEGACY_HEADER_SIZE + self.ciphertext.len());
        bytes.extend_from_slice(self.salt.as_bytes());
        bytes.extend_from_slice(&self.iv);
        bytes.extend_from_slice(&self.ciphertext);
        bytes
    }

    /// Base64 of [`LegacyEnvelope::to_bytes`]. Only older writers produced
    /// this format; it is kept for building fixtures.
    pub fn to_payload(&self) -> String {
        BASE64.encode(self.to_bytes())
    }

    pub fn sealed(&self) -> SealedData {
        SealedData::AesGcm {
            iv: self.iv,
            ciphertext: self.ciphertext.clone(),
        }
    }
}

/// Result of format detection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParsedPayload {
    Versioned(EncryptionEnvelope),
    Legacy(LegacyEnvelope),
}

/// A format parser returns `None` when the bytes are not in its format, so
/// the next parser in the chain gets a turn.
type FormatParser = fn(&[u8]) -> Option<CryptoResult<ParsedPayload>>;

const FORMAT_PARSERS: [(&str, FormatParser); 2] =
    [("versioned", parse_versioned), ("legacy", parse_legacy)];

/// Decodes a payload string and identifies its format.
pub fn parse_payload(payload: &str) -> CryptoResult<ParsedPayload> {
    let raw = BASE64
        .decode(payload.trim())
        .map_err(|e| CryptoError::MalformedPayload(format!("payload is not base64: {e}")))?;

    for (format, parser) in FORMAT_PARSERS {
        if let Some(result) = parser(&raw) {
            trace!(format, bytes = raw.len(), "payload format recognized");
            return result;
        }
    }

    Err(CryptoError::MalformedPayload(
        "unrecognized payload format".to_string(),
    ))
}

/// Structured attempt: UTF-8 JSON carrying a numeric `version`.
fn parse_versioned(raw: &[u8]) -> Option<CryptoResult<ParsedPayload>> {
    let text = std::str::from_utf8(raw).ok()?;
    let probe: VersionProbe = serde_json::from_str(text).ok()?;

    if probe.version != ENVELOPE_VERSION {
        return Some(Err(CryptoError::UnsupportedVersion(probe.version)));
    }

    let result = serde_json::from_str::<WireEnvelope>(text)
        .map_err(|e| CryptoError::MalformedPayload(format!("envelope fields: {e}")))
        .and_then(EncryptionEnvelope::from_wire)
        .map(ParsedPayload::Versioned);
    Some(result)
}

/// Byte-layout fallback. Always claims the bytes.
fn parse_legacy(raw: &[u8]) -> Option<CryptoResult<ParsedPayload>> {
    if raw.len() <= LEGACY_HEADER_SIZE {
        return Some(Err(CryptoError::MalformedPayload(format!(
            "{} bytes is too short for any known format",
            raw.len()
        ))));
    }

    let (salt, rest) = raw.split_at(SALT_SIZE);
    let (iv, ciphertext) = rest.split_at(GCM_IV_SIZE);

    let result = Salt::from_slice(salt).and_then(|salt| {
        Ok(ParsedPayload::Legacy(LegacyEnvelope {
            salt,
            iv: fixed_iv::<GCM_IV_SIZE>(iv)?,
            ciphertext: ciphertext.to_vec(),
        }))
    });
    Some(result)
}

fn decode_field(name: &str, value: &str) -> CryptoResult<Vec<u8>> {
    BASE64
        .decode(value)
        .map_err(|e| CryptoError::MalformedPayload(format!("field `{name}` is not base64: {e}")))
}

fn fixed_iv<const N: usize>(bytes: &[u8]) -> CryptoResult<[u8; N]> {
    bytes.try_into().map_err(|_| {
        CryptoError::MalformedPayload(format!("iv must be {N} bytes, got {}", bytes.len()))
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn gcm_envelope() -> EncryptionEnvelope {
        EncryptionEnvelope {
            compressed: false,
            salt: Salt::from_bytes([1u8; SALT_SIZE]),
            iterations: Some(PBKDF2_ITERATIONS),
            sealed: SealedData::AesGcm {
                iv: [2u8; GCM_IV_SIZE],
                ciphertext: vec![3u8; 24],
            },
        }
    }

    fn cbc_envelope() -> EncryptionEnvelope {
        EncryptionEnvelope {
            compressed: true,
            salt: Salt::from_bytes([4u8; SALT_SIZE]),
            iterations: None,
            sealed: SealedData::AesCbcHmac {
                iv: [5u8; CBC_IV_SIZE],
                ciphertext: vec![6u8; 32],
                mac: vec![7u8; 32],
            },
        }
    }

    fn json_of(payload: &str) -> serde_json::Value {
        serde_json::from_slice(&BASE64.decode(payload).unwrap()).unwrap()
    }

    fn encode_json(value: serde_json::Value) -> String {
        BASE64.encode(serde_json::to_vec(&value).unwrap())
    }

    #[test]
    fn gcm_wire_layout() {
        let json = json_of(&gcm_envelope().to_payload().unwrap());
        assert_eq!(json["version"], 1);
        assert_eq!(json["algorithm"], "aes-gcm");
        assert_eq!(json["compressed"], false);
        assert_eq!(json["iv"], BASE64.encode([2u8; GCM_IV_SIZE]));
        assert_eq!(json["iterations"], PBKDF2_ITERATIONS);
        assert!(json.get("mac").is_none());
    }

    #[test]
    fn cbc_wire_layout() {
        let json = json_of(&cbc_envelope().to_payload().unwrap());
        assert_eq!(json["algorithm"], "aes-cbc");
        assert_eq!(json["compressed"], true);
        assert_eq!(json["mac"], BASE64.encode([7u8; 32]));
        assert!(json.get("iterations").is_none());
    }

    #[test]
    fn versioned_payloads_parse_back() {
        for envelope in [gcm_envelope(), cbc_envelope()] {
            let parsed = parse_payload(&envelope.to_payload().unwrap()).unwrap();
            assert_eq!(parsed, ParsedPayload::Versioned(envelope));
        }
    }

    #[test]
    fn missing_iterations_uses_current_constant() {
        assert_eq!(cbc_envelope().kdf_params().iterations, PBKDF2_ITERATIONS);
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let payload = format!("  {}\n", gcm_envelope().to_payload().unwrap());
        assert!(matches!(
            parse_payload(&payload),
            Ok(ParsedPayload::Versioned(_))
        ));
    }

    #[test]
    fn future_version_rejected_distinctly() {
        let mut json = json_of(&gcm_envelope().to_payload().unwrap());
        json["version"] = 2.into();
        let err = parse_payload(&encode_json(json)).unwrap_err();
        assert!(matches!(err, CryptoError::UnsupportedVersion(2)));
    }

    #[test]
    fn unknown_algorithm_rejected_distinctly() {
        let mut json = json_of(&gcm_envelope().to_payload().unwrap());
        json["algorithm"] = "xchacha20".into();
        let err = parse_payload(&encode_json(json)).unwrap_err();
        assert!(matches!(err, CryptoError::UnsupportedAlgorithm(ref a) if a == "xchacha20"));
    }

    #[test]
    fn missing_required_field_is_malformed() {
        let mut json = json_of(&gcm_envelope().to_payload().unwrap());
        json.as_object_mut().unwrap().remove("ciphertext");
        let err = parse_payload(&encode_json(json)).unwrap_err();
        assert!(matches!(err, CryptoError::MalformedPayload(_)));
    }

    #[test]
    fn wrong_iv_length_is_malformed() {
        let mut json = json_of(&gcm_envelope().to_payload().unwrap());
        json["iv"] = BASE64.encode([0u8; CBC_IV_SIZE]).into();
        let err = parse_payload(&encode_json(json)).unwrap_err();
        assert!(matches!(err, CryptoError::MalformedPayload(_)));
    }

    #[test]
    fn zero_iterations_is_malformed() {
        let mut json = json_of(&gcm_envelope().to_payload().unwrap());
        json["iterations"] = 0.into();
        assert!(matches!(
            parse_payload(&encode_json(json)),
            Err(CryptoError::MalformedPayload(_))
        ));
    }

    #[test]
    fn cbc_without_mac_parses_with_empty_mac() {
        let mut json = json_of(&cbc_envelope().to_payload().unwrap());
        json.as_object_mut().unwrap().remove("mac");
        let Ok(ParsedPayload::Versioned(envelope)) = parse_payload(&encode_json(json)) else {
            panic!("expected a versioned envelope");
        };
        assert_eq!(envelope.sealed.mac(), Some(&[][..]));
    }

    #[test]
    fn raw_bytes_fall_back_to_legacy() {
        let legacy = LegacyEnvelope {
            salt: Salt::from_bytes([9u8; SALT_SIZE]),
            iv: [8u8; GCM_IV_SIZE],
            ciphertext: vec![7u8; 20],
        };
        let parsed = parse_payload(&legacy.to_payload()).unwrap();
        assert_eq!(parsed, ParsedPayload::Legacy(legacy));
    }

    #[test]
    fn legacy_layout_offsets() {
        let raw: Vec<u8> = (0u8..40).collect();
        let Ok(ParsedPayload::Legacy(legacy)) = parse_payload(&BASE64.encode(&raw)) else {
            panic!("expected legacy");
        };
        assert_eq!(&legacy.salt.as_bytes()[..], &raw[..16]);
        assert_eq!(&legacy.iv[..], &raw[16..28]);
        assert_eq!(legacy.ciphertext, raw[28..].to_vec());
    }

    #[test]
    fn too_short_for_legacy_is_malformed() {
        for len in [0usize, 1, LEGACY_HEADER_SIZE] {
            let err = parse_payload(&BASE64.encode(vec![0xAAu8; len])).unwrap_err();
            assert!(matches!(err, CryptoError::MalformedPayload(_)), "len {len}");
        }
    }

    #[test]
    fn invalid_base64_is_malformed() {
        let err = parse_payload("not*base64!").unwrap_err();
        assert!(matches!(err, CryptoError::MalformedPayload(_)));
        assert!(!err.is_authentication_failure());
    }

    #[test]
    fn non_envelope_json_falls_back_to_legacy() {
        // Valid JSON without a version is not a versioned envelope.
        let payload = encode_json(serde_json::json!({
            "hello": "this json has no version field at all"
        }));
        assert!(matches!(
            parse_payload(&payload),
            Ok(ParsedPayload::Legacy(_))
        ));
    }
}
