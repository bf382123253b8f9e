//! Crypto collaborator used by the bootstrap encoder.
//!
//! The pipeline only needs `import_key` and `encrypt`. [`AesGcmProvider`]
//! is the stock implementation: AES-256-GCM with a random 96-bit nonce,
//! output as `base64(nonce || ciphertext)`.

use std::fmt;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Operations a key handle may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyUsage {
    Encrypt,
    Decrypt,
}

impl fmt::Display for KeyUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyUsage::Encrypt => f.write_str("encrypt"),
            KeyUsage::Decrypt => f.write_str("decrypt"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid key length {0}, expected {KEY_LEN} bytes")]
    InvalidKeyLength(usize),

    #[error("key is not allowed to {0}")]
    UsageNotPermitted(KeyUsage),

    #[error("encryption failed")]
    Encrypt,

    #[error("decryption failed: {0}")]
    Decrypt(String),
}

/// An imported key plus the usages it was imported for.
#[derive(Clone)]
pub struct KeyHandle {
    bytes: Vec<u8>,
    usages: Vec<KeyUsage>,
}

impl KeyHandle {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn allows(&self, usage: KeyUsage) -> bool {
        self.usages.contains(&usage)
    }

    fn require(&self, usage: KeyUsage) -> Result<(), CryptoError> {
        if self.allows(usage) {
            Ok(())
        } else {
            Err(CryptoError::UsageNotPermitted(usage))
        }
    }
}

impl fmt::Debug for KeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyHandle").field("usages", &self.usages).finish_non_exhaustive()
    }
}

/// Key import and encryption capability.
pub trait CryptoProvider: Send + Sync {
    fn import_key(&self, raw: &[u8], usages: &[KeyUsage]) -> Result<KeyHandle, CryptoError>;

    fn encrypt(&self, key: &KeyHandle, plaintext: &str) -> Result<String, CryptoError>;
}

/// AES-256-GCM provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct AesGcmProvider;

impl AesGcmProvider {
    /// Generate fresh raw key bytes.
    pub fn generate_key() -> [u8; KEY_LEN] {
        let mut key = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut key);
        key
    }

    /// Reverse [`CryptoProvider::encrypt`].
    pub fn decrypt(&self, key: &KeyHandle, ciphertext: &str) -> Result<String, CryptoError> {
        key.require(KeyUsage::Decrypt)?;
        let data = STANDARD
            .decode(ciphertext)
            .map_err(|e| CryptoError::Decrypt(e.to_string()))?;
        if data.len() < NONCE_LEN {
            return Err(CryptoError::Decrypt("ciphertext too short".to_string()));
        }

        let cipher = Aes256Gcm::new_from_slice(key.bytes())
            .map_err(|_| CryptoError::InvalidKeyLength(key.bytes().len()))?;
        let (nonce, sealed) = data.split_at(NONCE_LEN);
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|e| CryptoError::Decrypt(e.to_string()))?;

        String::from_utf8(plaintext).map_err(|e| CryptoError::Decrypt(e.to_string()))
    }
}

impl CryptoProvider for AesGcmProvider {
    fn import_key(&self, raw: &[u8], usages: &[KeyUsage]) -> Result<KeyHandle, CryptoError> {
        if raw.len() != KEY_LEN {
            return Err(CryptoError::InvalidKeyLength(raw.len()));
        }
        Ok(KeyHandle {
            bytes: raw.to_vec(),
            usages: usages.to_vec(),
        })
    }

    fn encrypt(&self, key: &KeyHandle, plaintext: &str) -> Result<String, CryptoError> {
        key.require(KeyUsage::Encrypt)?;
        let cipher = Aes256Gcm::new_from_slice(key.bytes())
            .map_err(|_| CryptoError::InvalidKeyLength(key.bytes().len()))?;

        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);
        let sealed = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| CryptoError::Encrypt)?;

        let mut out = nonce.to_vec();
        out.extend_from_slice(&sealed);
        Ok(STANDARD.encode(out))
    }
}
