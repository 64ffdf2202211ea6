//! Encryption service facade
//!
//! The single entry point for callers. Selects the symmetric (passphrase,
//! AES-256-GCM envelope) or asymmetric (RSA-OAEP) scheme and enforces the
//! preconditions shared by both.

use crate::config::{Config, Passphrase};
use crate::crypto::{self, AsymmetricCipher, Envelope};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Encryption scheme selector
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Passphrase-derived AES-256-GCM
    Symmetric,

    /// RSA-OAEP with the in-memory key pair
    Asymmetric,
}

impl FromStr for Scheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "symmetric" | "aes" => Ok(Scheme::Symmetric),
            "asymmetric" | "rsa" => Ok(Scheme::Asymmetric),
            _ => Err(Error::InvalidMethod(s.to_string())),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Symmetric => f.write_str("symmetric"),
            Scheme::Asymmetric => f.write_str("asymmetric"),
        }
    }
}

/// Encryption service holding the passphrase and the RSA key pair.
///
/// Both are read-only after construction, so the service can be shared
/// behind an `Arc` by any number of concurrent callers.
#[derive(Debug)]
pub struct EncryptionService {
    passphrase: Option<Arc<Passphrase>>,
    kdf_iterations: u32,
    asymmetric: AsymmetricCipher,
}

impl EncryptionService {
    /// Create a service, generating a fresh RSA key pair
    pub fn new(config: &Config) -> Result<Self> {
        let asymmetric = AsymmetricCipher::generate()?;
        Self::with_key_pair(config, asymmetric)
    }

    /// Create a service around an existing key pair
    pub fn with_key_pair(config: &Config, asymmetric: AsymmetricCipher) -> Result<Self> {
        config.validate()?;

        match &config.passphrase {
            None => warn!("No passphrase configured, symmetric scheme unavailable"),
            Some(p) if crypto::validate_key_material(p.as_bytes()).is_err() => warn!(
                "Passphrase is {} bytes, expected {}; symmetric scheme unavailable",
                p.len(),
                crypto::KEY_SIZE
            ),
            Some(_) => {}
        }

        info!(
            "Encryption service ready (kdf iterations: {}, rsa max plaintext: {} bytes)",
            config.kdf_iterations,
            asymmetric.max_plaintext_len()
        );

        Ok(EncryptionService {
            passphrase: config.passphrase.clone().map(Arc::new),
            kdf_iterations: config.kdf_iterations,
            asymmetric,
        })
    }

    /// Public key of the asymmetric scheme as PEM
    pub fn public_key_pem(&self) -> Result<String> {
        self.asymmetric.public_key_pem()
    }

    /// Encrypt `text` under the scheme named by `method`
    pub async fn encrypt(&self, text: &str, method: &str) -> Result<String> {
        if text.is_empty() {
            return Err(Error::InputRequired);
        }
        self.encrypt_with(text, method.parse()?).await
    }

    /// Decrypt `text` under the scheme named by `method`
    pub async fn decrypt(&self, text: &str, method: &str) -> Result<String> {
        if text.is_empty() {
            return Err(Error::InputRequired);
        }
        self.decrypt_with(text, method.parse()?).await
    }

    /// Encrypt `text` under an already parsed scheme
    pub async fn encrypt_with(&self, text: &str, scheme: Scheme) -> Result<String> {
        if text.is_empty() {
            return Err(Error::InputRequired);
        }

        debug!("Encrypting {} bytes ({})", text.len(), scheme);

        match scheme {
            Scheme::Symmetric => {
                let passphrase = self.symmetric_passphrase()?;
                let iterations = self.kdf_iterations;
                let text = text.to_string();

                let envelope = run_blocking(move || {
                    crypto::encrypt(&text, passphrase.as_bytes(), iterations)
                })
                .await?;

                Ok(envelope.serialize())
            }
            Scheme::Asymmetric => self.asymmetric.encrypt(text),
        }
    }

    /// Decrypt `text` under an already parsed scheme
    pub async fn decrypt_with(&self, text: &str, scheme: Scheme) -> Result<String> {
        if text.is_empty() {
            return Err(Error::InputRequired);
        }

        debug!("Decrypting {} bytes ({})", text.len(), scheme);

        match scheme {
            Scheme::Symmetric => {
                let passphrase = self.symmetric_passphrase()?;
                let iterations = self.kdf_iterations;
                let envelope = Envelope::parse(text.trim())?;

                run_blocking(move || crypto::decrypt(&envelope, passphrase.as_bytes(), iterations))
                    .await
            }
            Scheme::Asymmetric => self.asymmetric.decrypt(text),
        }
    }

    /// The passphrase, if present and of valid length
    fn symmetric_passphrase(&self) -> Result<Arc<Passphrase>> {
        let passphrase = self.passphrase.as_ref().ok_or_else(|| {
            Error::InvalidKeyConfiguration("no passphrase configured".to_string())
        })?;
        crypto::validate_key_material(passphrase.as_bytes())?;
        Ok(Arc::clone(passphrase))
    }
}

/// Run CPU-bound crypto on the blocking pool and wait for it
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Internal(format!("crypto worker failed: {}", e)))?
}
