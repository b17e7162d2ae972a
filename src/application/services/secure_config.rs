//! Symmetric encryption of provider secrets.
//!
//! Ciphertext layout is `IV || AES-256-CFB(plaintext)`, base64-encoded and
//! wrapped as `{"encrypted": "<base64>"}`.

use aes::Aes256;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
use serde_json::{Value, json};
use thiserror::Error;

pub const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;
const ENVELOPE_FIELD: &str = "encrypted";

type Aes256CfbEnc = cfb_mode::Encryptor<Aes256>;
type Aes256CfbDec = cfb_mode::Decryptor<Aes256>;

#[derive(Debug, Error)]
pub enum SecureConfigError {
    #[error("encryption key must be 32 bytes for AES-256, got {0}")]
    InvalidKeyLength(usize),
    #[error("secure config is not in the expected format: missing `encrypted` field")]
    MissingEnvelope,
    #[error("secure config is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("ciphertext too short")]
    CiphertextTooShort,
    #[error("secure config payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Process-wide 32-byte key, validated once at startup.
#[derive(Clone)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    pub fn from_slice(key: &[u8]) -> Result<Self, SecureConfigError> {
        let bytes: [u8; KEY_LEN] = key
            .try_into()
            .map_err(|_| SecureConfigError::InvalidKeyLength(key.len()))?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionKey(****)")
    }
}

pub fn encrypt(plaintext: &[u8], key: &[u8]) -> Result<Vec<u8>, SecureConfigError> {
    if key.len() != KEY_LEN {
        return Err(SecureConfigError::InvalidKeyLength(key.len()));
    }
    let iv: [u8; IV_LEN] = rand::random();

    let mut out = Vec::with_capacity(IV_LEN + plaintext.len());
    out.extend_from_slice(&iv);
    out.extend_from_slice(plaintext);
    Aes256CfbEnc::new(key.into(), iv.as_slice().into()).encrypt(&mut out[IV_LEN..]);
    Ok(out)
}

pub fn decrypt(ciphertext: &[u8], key: &[u8]) -> Result<Vec<u8>, SecureConfigError> {
    if key.len() != KEY_LEN {
        return Err(SecureConfigError::InvalidKeyLength(key.len()));
    }
    if ciphertext.len() < IV_LEN {
        return Err(SecureConfigError::CiphertextTooShort);
    }
    let (iv, body) = ciphertext.split_at(IV_LEN);

    let mut out = body.to_vec();
    Aes256CfbDec::new(key.into(), iv.into()).decrypt(&mut out);
    Ok(out)
}

/// Seals and opens `{"encrypted": ...}` envelopes with one key.
#[derive(Clone, Debug)]
pub struct SecureConfigCodec {
    key: EncryptionKey,
}

impl SecureConfigCodec {
    pub fn new(key: EncryptionKey) -> Self {
        Self { key }
    }

    pub fn seal(&self, plaintext: &[u8]) -> Result<Value, SecureConfigError> {
        let ciphertext = encrypt(plaintext, self.key.as_bytes())?;
        Ok(json!({ ENVELOPE_FIELD: BASE64.encode(ciphertext) }))
    }

    pub fn seal_json(&self, secrets: &Value) -> Result<Value, SecureConfigError> {
        self.seal(&serde_json::to_vec(secrets)?)
    }

    pub fn open(&self, envelope: &Value) -> Result<Vec<u8>, SecureConfigError> {
        let encoded = envelope
            .get(ENVELOPE_FIELD)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
            .ok_or(SecureConfigError::MissingEnvelope)?;
        let ciphertext = BASE64.decode(encoded)?;
        decrypt(&ciphertext, self.key.as_bytes())
    }

    /// Opens the envelope and parses the plaintext as JSON.
    pub fn open_json<T: serde::de::DeserializeOwned>(
        &self,
        envelope: &Value,
    ) -> Result<T, SecureConfigError> {
        let plaintext = self.open(envelope)?;
        Ok(serde_json::from_slice(&plaintext)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8; 32] = b"0123456789abcdef0123456789abcdef";

    fn codec() -> SecureConfigCodec {
        SecureConfigCodec::new(EncryptionKey::from_slice(KEY).unwrap())
    }

    #[test]
    fn decrypt_reverses_encrypt() {
        for secret in [
            &b""[..],
            &b"x"[..],
            &b"auth-token-1234567890"[..],
            &[0u8, 255, 7, 9][..],
        ] {
            let ciphertext = encrypt(secret, KEY).unwrap();
            assert_eq!(ciphertext.len(), IV_LEN + secret.len());
            assert_eq!(decrypt(&ciphertext, KEY).unwrap(), secret);
        }
    }

    #[test]
    fn fresh_iv_per_encryption() {
        let a = encrypt(b"same secret", KEY).unwrap();
        let b = encrypt(b"same secret", KEY).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_key_length_is_an_error() {
        for len in [0usize, 16, 31, 33, 64] {
            let key = vec![7u8; len];
            assert!(matches!(
                encrypt(b"secret", &key),
                Err(SecureConfigError::InvalidKeyLength(n)) if n == len
            ));
            assert!(matches!(
                decrypt(&[0u8; 32], &key),
                Err(SecureConfigError::InvalidKeyLength(_))
            ));
        }
        assert!(EncryptionKey::from_slice(b"short").is_err());
    }

    #[test]
    fn short_ciphertext_is_an_error() {
        assert!(matches!(
            decrypt(&[1, 2, 3], KEY),
            Err(SecureConfigError::CiphertextTooShort)
        ));
    }

    #[test]
    fn envelope_round_trip() {
        let codec = codec();
        let sealed = codec
            .seal_json(&serde_json::json!({ "authToken": "tok_live" }))
            .unwrap();
        assert!(sealed["encrypted"].is_string());

        let opened: Value = codec.open_json(&sealed).unwrap();
        assert_eq!(opened["authToken"], "tok_live");
    }

    #[test]
    fn envelope_without_encrypted_field_is_rejected() {
        let codec = codec();
        for envelope in [
            serde_json::json!({}),
            serde_json::json!({ "encrypted": "" }),
            serde_json::json!({ "authToken": "plaintext" }),
        ] {
            assert!(matches!(
                codec.open(&envelope),
                Err(SecureConfigError::MissingEnvelope)
            ));
        }
    }
}
