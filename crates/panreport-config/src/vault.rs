// ── Credential vault ──
//
// Authenticated encryption for the API key at rest. ChaCha20-Poly1305 with
// a 256-bit key derived by SHA-256 from the configured key material; the
// stored form is base64(nonce || ciphertext || tag).

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info};

/// Nonce length for ChaCha20-Poly1305.
const NONCE_LEN: usize = 12;

/// Key material for [`KeySource::Builtin`]. Keeps settings files portable
/// between machines; use `env` or `keyring` for per-installation keys.
const BUILTIN_MATERIAL: &[u8] = b"panreport/settings-vault/v1";

/// Environment variable read by [`KeySource::Env`].
pub const VAULT_KEY_ENV: &str = "PANREPORT_VAULT_KEY";

const KEYRING_SERVICE: &str = "panreport";
const KEYRING_ACCOUNT: &str = "settings-vault-key";

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("stored key is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("stored key is truncated ({len} bytes, need more than {NONCE_LEN})")]
    Truncated { len: usize },

    #[error("stored key failed authentication (wrong vault key or tampered data)")]
    Authentication,

    #[error("decrypted key is not valid UTF-8")]
    Utf8,

    #[error("encryption failed")]
    Encrypt,

    #[error("environment variable {0} is not set")]
    MissingEnvKey(&'static str),

    #[error("keyring error: {0}")]
    Keyring(String),
}

/// Where the vault's key material comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeySource {
    #[default]
    Builtin,
    Env,
    Keyring,
}

pub struct Vault {
    cipher: ChaCha20Poly1305,
}

impl Vault {
    /// Derive the cipher key from arbitrary material.
    pub fn from_material(material: &[u8]) -> Self {
        let key = Sha256::digest(material);
        Self {
            cipher: ChaCha20Poly1305::new(&key),
        }
    }

    pub fn builtin() -> Self {
        Self::from_material(BUILTIN_MATERIAL)
    }

    /// Open the vault for a key source.
    ///
    /// The keyring source creates and stores a random key on first use.
    pub fn open(source: KeySource) -> Result<Self, VaultError> {
        match source {
            KeySource::Builtin => Ok(Self::builtin()),
            KeySource::Env => {
                let material = std::env::var(VAULT_KEY_ENV)
                    .map_err(|_| VaultError::MissingEnvKey(VAULT_KEY_ENV))?;
                Ok(Self::from_material(material.as_bytes()))
            }
            KeySource::Keyring => {
                let material = keyring_material()?;
                Ok(Self::from_material(material.expose_secret().as_bytes()))
            }
        }
    }

    /// Encrypt `plaintext`. An empty input stays empty.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, VaultError> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| VaultError::Encrypt)?;

        let mut sealed = nonce.to_vec();
        sealed.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(sealed))
    }

    /// Reverse of [`encrypt`](Self::encrypt).
    pub fn decrypt(&self, stored: &str) -> Result<SecretString, VaultError> {
        if stored.is_empty() {
            return Ok(SecretString::from(String::new()));
        }
        let sealed = STANDARD.decode(stored)?;
        if sealed.len() <= NONCE_LEN {
            return Err(VaultError::Truncated { len: sealed.len() });
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| VaultError::Authentication)?;

        String::from_utf8(plaintext)
            .map(SecretString::from)
            .map_err(|_| VaultError::Utf8)
    }
}

fn keyring_material() -> Result<SecretString, VaultError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_ACCOUNT)
        .map_err(|e| VaultError::Keyring(e.to_string()))?;

    match entry.get_password() {
        Ok(secret) => {
            debug!("vault key loaded from keyring");
            Ok(SecretString::from(secret))
        }
        Err(keyring::Error::NoEntry) => {
            let key = ChaCha20Poly1305::generate_key(&mut OsRng);
            let encoded = STANDARD.encode(key);
            entry
                .set_password(&encoded)
                .map_err(|e| VaultError::Keyring(e.to_string()))?;
            info!("generated new vault key in system keyring");
            Ok(SecretString::from(encoded))
        }
        Err(e) => Err(VaultError::Keyring(e.to_string())),
    }
}
