//! Bootstrap data encoding.
//!
//! Produces the body of `init.js`: the page props, serialized and
//! encrypted, assigned to `window.__INITIAL_DATA__`. Plaintext props are
//! never written to the client.

use std::sync::Arc;

use serde_json::Value;

use crate::hydration::crypto::{CryptoError, CryptoProvider, KeyHandle, KeyUsage};
use crate::hydration::obfuscation::{KeyMaterial, ObfuscationError};

/// Environment variable whose presence marks a non-production build.
pub const ENV_MARKER_VAR: &str = "ENV";

const ENV_MARKER: &str = "window.__ENV__ = \"DEVELOPMENT\";";

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("key material: {0}")]
    Key(#[from] ObfuscationError),

    #[error("crypto: {0}")]
    Crypto(#[from] CryptoError),

    #[error("props serialization: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Encrypts props into the client bootstrap script.
pub struct BootstrapEncoder {
    crypto: Arc<dyn CryptoProvider>,
    material: KeyMaterial,
}

impl BootstrapEncoder {
    pub fn new(crypto: Arc<dyn CryptoProvider>, material: KeyMaterial) -> Self {
        Self { crypto, material }
    }

    /// De-obfuscate the stored key and import it for encryption.
    pub fn import_key(&self) -> Result<KeyHandle, EncodeError> {
        let raw = self.material.reveal()?;
        Ok(self.crypto.import_key(&raw, &[KeyUsage::Encrypt, KeyUsage::Decrypt])?)
    }

    /// Encode `props`, reading the environment marker from the process.
    pub fn encode(&self, props: &Value) -> Result<String, EncodeError> {
        let development = std::env::var_os(ENV_MARKER_VAR).is_some();
        self.encode_with_marker(props, development)
    }

    /// Encode `props`, optionally prefixed with the development marker.
    pub fn encode_with_marker(&self, props: &Value, development: bool) -> Result<String, EncodeError> {
        let key = self.import_key()?;
        let plaintext = serde_json::to_string(props)?;
        let ciphertext = self.crypto.encrypt(&key, &plaintext)?;

        let marker = if development { ENV_MARKER } else { "" };
        Ok(format!("{marker}window.__INITIAL_DATA__ = \"{ciphertext}\";"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hydration::crypto::AesGcmProvider;
    use serde_json::json;

    fn encoder() -> (BootstrapEncoder, [u8; 32]) {
        let raw = AesGcmProvider::generate_key();
        let encoder = BootstrapEncoder::new(Arc::new(AesGcmProvider), KeyMaterial::generate(&raw));
        (encoder, raw)
    }

    fn ciphertext(script: &str) -> &str {
        let start = script.find("= \"").unwrap() + 3;
        let end = script.rfind("\";").unwrap();
        &script[start..end]
    }

    #[test]
    fn test_script_carries_ciphertext_only() {
        let (encoder, raw) = encoder();
        let script = encoder.encode_with_marker(&json!({"user": "ada"}), false).unwrap();

        assert!(script.starts_with("window.__INITIAL_DATA__ = \""));
        assert!(script.ends_with("\";"));
        assert!(!script.contains("ada"));

        let key = AesGcmProvider
            .import_key(&raw, &[KeyUsage::Decrypt])
            .unwrap();
        let plaintext = AesGcmProvider.decrypt(&key, ciphertext(&script)).unwrap();
        assert_eq!(serde_json::from_str::<Value>(&plaintext).unwrap(), json!({"user": "ada"}));
    }

    #[test]
    fn test_development_marker_prefix() {
        let (encoder, _) = encoder();
        let script = encoder.encode_with_marker(&json!(null), true).unwrap();
        assert!(script.starts_with("window.__ENV__ = \"DEVELOPMENT\";window.__INITIAL_DATA__"));
    }

    #[test]
    fn test_bad_material_propagates() {
        let encoder = BootstrapEncoder::new(
            Arc::new(AesGcmProvider),
            KeyMaterial::from_parts("garbage", "salt"),
        );
        assert!(matches!(
            encoder.encode_with_marker(&json!({}), false),
            Err(EncodeError::Key(ObfuscationError::SaltMismatch))
        ));
    }

    #[test]
    fn test_wrong_key_size_propagates() {
        let encoder = BootstrapEncoder::new(Arc::new(AesGcmProvider), KeyMaterial::generate(b"short"));
        assert!(matches!(
            encoder.import_key(),
            Err(EncodeError::Crypto(CryptoError::InvalidKeyLength(5)))
        ));
    }
}
