//! Key material de-obfuscation.
//!
//! The bootstrap key is kept in server state as a reversed, salted,
//! base64 string so the raw bytes never sit in memory as a plain literal.
//! This is a reversible encoding and offers no protection against anyone
//! who can read server state. It is not cryptography.
//!
//! ```text
//! obfuscate: raw → base64 → append salt → reverse
//! reveal:  trim → reverse → strip salt → base64-decode
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

const SALT_LEN: usize = 16;

/// Errors from reversing the obfuscation pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ObfuscationError {
    #[error("key material does not carry the expected salt")]
    SaltMismatch,

    #[error("key material is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// Obfuscated key material plus the salt needed to reverse it.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    obfuscated: String,
    salt: String,
}

impl KeyMaterial {
    /// Obfuscate raw key bytes with a fresh random salt.
    pub fn generate(raw: &[u8]) -> Self {
        let salt: String = std::iter::repeat_with(fastrand::alphanumeric)
            .take(SALT_LEN)
            .collect();
        Self::obfuscate(raw, salt)
    }

    /// Obfuscate raw key bytes with the given salt.
    pub fn obfuscate(raw: &[u8], salt: impl Into<String>) -> Self {
        let salt = salt.into();
        let salted = format!("{}{}", STANDARD.encode(raw), salt);
        Self {
            obfuscated: salted.chars().rev().collect(),
            salt,
        }
    }

    /// Rebuild from stored parts (e.g. read back from the environment).
    pub fn from_parts(obfuscated: impl Into<String>, salt: impl Into<String>) -> Self {
        Self {
            obfuscated: obfuscated.into(),
            salt: salt.into(),
        }
    }

    /// Run the inverse pipeline and return the raw key bytes.
    pub fn reveal(&self) -> Result<Vec<u8>, ObfuscationError> {
        let cleaned = self
            .obfuscated
            .trim()
            .trim_matches(|c| c == '"' || c == '\'');
        let salted: String = cleaned.chars().rev().collect();
        let encoded = salted
            .strip_suffix(self.salt.as_str())
            .ok_or(ObfuscationError::SaltMismatch)?;
        Ok(STANDARD.decode(encoded)?)
    }
}

// Never print the material itself.
impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("len", &self.obfuscated.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obfuscate_then_reveal() {
        let raw = [7u8; 32];
        let material = KeyMaterial::generate(&raw);
        assert_eq!(material.reveal().unwrap(), raw);
    }

    #[test]
    fn test_stored_form_is_not_plain_base64() {
        let raw = b"0123456789abcdef0123456789abcdef";
        let material = KeyMaterial::obfuscate(raw, "pepper");
        assert!(!material.obfuscated.contains(&STANDARD.encode(raw)));
        assert!(material.obfuscated.starts_with("reppep"));
    }

    #[test]
    fn test_quoted_material_is_cleaned() {
        let material = KeyMaterial::obfuscate(b"key", "salt");
        let quoted = KeyMaterial::from_parts(format!(" \"{}\"\n", material.obfuscated), "salt");
        assert_eq!(quoted.reveal().unwrap(), b"key");
    }

    #[test]
    fn test_wrong_salt() {
        let material = KeyMaterial::obfuscate(b"key", "salt");
        let wrong = KeyMaterial::from_parts(material.obfuscated, "other");
        assert!(matches!(wrong.reveal(), Err(ObfuscationError::SaltMismatch)));
    }

    #[test]
    fn test_debug_hides_material() {
        let material = KeyMaterial::obfuscate(b"secret", "salt");
        assert!(!format!("{material:?}").contains("tlas"));
    }
}
