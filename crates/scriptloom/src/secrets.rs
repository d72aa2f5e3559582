//! Credential import and at-rest encryption.
//!
//! API keys reach the store from one of three places, checked in order:
//! a literal value, a file (Docker secrets style), or an environment
//! variable. Stored keys can optionally be sealed with AES-256-GCM.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use secrecy::SecretString;
use std::fs;

/// Error type for secret resolution and sealing failures.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No secret source provided (need one of: direct value, file path, or env var name)")]
    NoSourceProvided,

    #[error("Failed to read secret from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },

    #[error("Encryption error: {0}")]
    EncryptionError(String),

    #[error("Decryption error: {0}")]
    DecryptionError(String),

    #[error("Invalid encryption key: {0}")]
    InvalidKey(String),
}

pub type Result<T> = std::result::Result<T, SecretError>;

/// Resolves a secret from the first non-empty source: direct value, file, env var.
///
/// File contents and env values are trimmed.
pub fn resolve_secret(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> Result<SecretString> {
    if let Some(value) = direct.filter(|v| !v.is_empty()) {
        return Ok(SecretString::from(value.to_string()));
    }

    if let Some(path) = file_path.filter(|p| !p.is_empty()) {
        let expanded = expand_home(path);
        return fs::read_to_string(&expanded)
            .map(|content| SecretString::from(content.trim().to_string()))
            .map_err(|e| SecretError::FileReadError {
                path: expanded,
                source: e,
            });
    }

    if let Some(name) = env_var.filter(|n| !n.is_empty()) {
        return match std::env::var(name) {
            Ok(value) => Ok(SecretString::from(value.trim().to_string())),
            Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                name: name.to_string(),
            }),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                name: name.to_string(),
            }),
        };
    }

    Err(SecretError::NoSourceProvided)
}

/// Display form of a credential: first four and last four characters.
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() < 8 {
        return "...".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Expands a leading `~` to the user's home directory. `~user` is not supported.
fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            let home = home.to_string_lossy();
            if path == "~" {
                return home.into_owned();
            }
            return path.replacen('~', &home, 1);
        }
    }
    path.to_string()
}

// ============================================
// Credential encryption
// ============================================

/// Environment variable holding the base64-encoded 32-byte key.
pub const CREDENTIAL_KEY_ENV_VAR: &str = "SCRIPTLOOM_CREDENTIAL_KEY";

/// Nonce size for AES-256-GCM (96 bits).
const NONCE_SIZE: usize = 12;

/// Seals stored credentials with AES-256-GCM.
///
/// Ciphertext format: base64 of `<12-byte nonce><ciphertext+tag>`.
pub struct CredentialCipher {
    cipher: Aes256Gcm,
}

impl CredentialCipher {
    /// Reads the key from `SCRIPTLOOM_CREDENTIAL_KEY`. Returns `Ok(None)` when unset.
    pub fn from_env() -> Result<Option<Self>> {
        match std::env::var(CREDENTIAL_KEY_ENV_VAR) {
            Ok(key) if !key.trim().is_empty() => Self::from_base64_key(key.trim()).map(Some),
            Ok(_) | Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                name: CREDENTIAL_KEY_ENV_VAR.to_string(),
            }),
        }
    }

    pub fn from_base64_key(key_b64: &str) -> Result<Self> {
        let key_bytes = STANDARD
            .decode(key_b64)
            .map_err(|e| SecretError::InvalidKey(format!("Invalid base64 key: {}", e)))?;

        if key_bytes.len() != 32 {
            return Err(SecretError::InvalidKey(format!(
                "Key must be 32 bytes, got {} bytes",
                key_bytes.len()
            )));
        }

        let cipher = Aes256Gcm::new_from_slice(&key_bytes)
            .map_err(|e| SecretError::InvalidKey(format!("Failed to create cipher: {}", e)))?;

        Ok(Self { cipher })
    }

    /// Generates a fresh random key, base64-encoded, for `keys init`-style setup.
    pub fn generate_key() -> Result<String> {
        Ok(STANDARD.encode(rand_bytes::<32>()?))
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let nonce_bytes = rand_bytes::<NONCE_SIZE>()?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| SecretError::EncryptionError(e.to_string()))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend(ciphertext);
        Ok(STANDARD.encode(combined))
    }

    pub fn decrypt(&self, sealed: &str) -> Result<String> {
        let combined = STANDARD
            .decode(sealed)
            .map_err(|e| SecretError::DecryptionError(format!("Invalid base64: {}", e)))?;

        if combined.len() < NONCE_SIZE {
            return Err(SecretError::DecryptionError(
                "Ciphertext too short".to_string(),
            ));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| SecretError::DecryptionError(e.to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|e| SecretError::DecryptionError(format!("Invalid UTF-8: {}", e)))
    }
}

fn rand_bytes<const N: usize>() -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    getrandom::fill(&mut bytes).map_err(|e| {
        SecretError::EncryptionError(format!("Failed to generate random bytes: {}", e))
    })?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    // 32 zero-to-31 bytes, base64.
    const TEST_KEY: &str = "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8=";

    #[test]
    #[serial]
    fn test_direct_value_takes_priority() {
        std::env::set_var("SCRIPTLOOM_TEST_SECRET_1", "env_value");
        let result =
            resolve_secret(Some("direct_value"), None, Some("SCRIPTLOOM_TEST_SECRET_1")).unwrap();
        assert_eq!(result.expose_secret(), "direct_value");
        std::env::remove_var("SCRIPTLOOM_TEST_SECRET_1");
    }

    #[test]
    #[serial]
    fn test_file_takes_priority_over_env() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "  file_value  ").unwrap();

        std::env::set_var("SCRIPTLOOM_TEST_SECRET_2", "env_value");
        let result = resolve_secret(
            None,
            Some(temp_file.path().to_str().unwrap()),
            Some("SCRIPTLOOM_TEST_SECRET_2"),
        )
        .unwrap();
        assert_eq!(result.expose_secret(), "file_value");
        std::env::remove_var("SCRIPTLOOM_TEST_SECRET_2");
    }

    #[test]
    #[serial]
    fn test_env_var_fallback_is_trimmed() {
        std::env::set_var("SCRIPTLOOM_TEST_SECRET_3", "env_value\n");
        let result = resolve_secret(Some(""), Some(""), Some("SCRIPTLOOM_TEST_SECRET_3")).unwrap();
        assert_eq!(result.expose_secret(), "env_value");
        std::env::remove_var("SCRIPTLOOM_TEST_SECRET_3");
    }

    #[test]
    fn test_no_source_error() {
        assert!(matches!(
            resolve_secret(None, None, None),
            Err(SecretError::NoSourceProvided)
        ));
    }

    #[test]
    fn test_missing_file_and_env() {
        assert!(matches!(
            resolve_secret(None, Some("/nonexistent/path/to/key"), None),
            Err(SecretError::FileReadError { .. })
        ));
        assert!(matches!(
            resolve_secret(None, None, Some("SCRIPTLOOM_DEFINITELY_NOT_SET_12345")),
            Err(SecretError::EnvVarNotSet { .. })
        ));
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("AIzaSyExampleKey1234"), "AIza...1234");
        assert_eq!(mask_secret("12345678"), "1234...5678");
        assert_eq!(mask_secret("short"), "...");
        assert_eq!(mask_secret(""), "...");
    }

    #[test]
    fn test_expand_home_leaves_other_paths() {
        assert_eq!(expand_home("/absolute/path"), "/absolute/path");
        assert_eq!(expand_home("relative/~path"), "relative/~path");
    }

    #[test]
    fn test_cipher_roundtrip_and_random_nonce() {
        let cipher = CredentialCipher::from_base64_key(TEST_KEY).unwrap();
        let a = cipher.encrypt("AIzaSy-secret").unwrap();
        let b = cipher.encrypt("AIzaSy-secret").unwrap();
        assert_ne!(a, b);
        assert_eq!(cipher.decrypt(&a).unwrap(), "AIzaSy-secret");
        assert_eq!(cipher.decrypt(&b).unwrap(), "AIzaSy-secret");
    }

    #[test]
    fn test_cipher_rejects_bad_keys() {
        assert!(matches!(
            CredentialCipher::from_base64_key("AAEC"),
            Err(SecretError::InvalidKey(_))
        ));
        assert!(matches!(
            CredentialCipher::from_base64_key("not base64 !!"),
            Err(SecretError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_cipher_detects_tampering() {
        let cipher = CredentialCipher::from_base64_key(TEST_KEY).unwrap();
        let sealed = cipher.encrypt("value").unwrap();
        let mut raw = STANDARD.decode(&sealed).unwrap();
        if let Some(byte) = raw.last_mut() {
            *byte ^= 0xff;
        }
        let tampered = STANDARD.encode(raw);
        assert!(matches!(
            cipher.decrypt(&tampered),
            Err(SecretError::DecryptionError(_))
        ));
        assert!(matches!(
            cipher.decrypt("AAAA"),
            Err(SecretError::DecryptionError(_))
        ));
    }

    #[test]
    fn test_generated_key_is_usable() {
        let key = CredentialCipher::generate_key().unwrap();
        let cipher = CredentialCipher::from_base64_key(&key).unwrap();
        let sealed = cipher.encrypt("x").unwrap();
        assert_eq!(cipher.decrypt(&sealed).unwrap(), "x");
    }

    #[test]
    #[serial]
    fn test_from_env_unset_is_none() {
        std::env::remove_var(CREDENTIAL_KEY_ENV_VAR);
        assert!(CredentialCipher::from_env().unwrap().is_none());

        std::env::set_var(CREDENTIAL_KEY_ENV_VAR, TEST_KEY);
        assert!(CredentialCipher::from_env().unwrap().is_some());
        std::env::remove_var(CREDENTIAL_KEY_ENV_VAR);
    }
}
