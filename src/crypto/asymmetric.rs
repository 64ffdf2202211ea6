//! RSA-OAEP encryption with a process-lifetime key pair
//!
//! The key pair is generated once, when the cipher is constructed, and lives
//! only in memory. Ciphertexts are standard base64; OAEP supplies its own
//! randomness so no envelope is needed.

use crate::crypto::RSA_KEY_BITS;
use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use std::sync::Arc;
use tracing::debug;

/// SHA-256 output size, used for the OAEP overhead
const OAEP_HASH_SIZE: usize = 32;

/// RSA key pair shared by all callers of one service
#[derive(Clone)]
pub struct AsymmetricCipher {
    private_key: Arc<RsaPrivateKey>,
    public_key: Arc<RsaPublicKey>,
}

impl AsymmetricCipher {
    /// Generate a new 2048-bit key pair
    pub fn generate() -> Result<Self> {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, RSA_KEY_BITS)
            .map_err(|e| Error::KeyGenerationFailed(e.to_string()))?;
        let public_key = RsaPublicKey::from(&private_key);

        debug!("Generated {}-bit RSA key pair", RSA_KEY_BITS);

        Ok(AsymmetricCipher {
            private_key: Arc::new(private_key),
            public_key: Arc::new(public_key),
        })
    }

    /// Largest plaintext, in bytes, that fits in one OAEP block
    pub fn max_plaintext_len(&self) -> usize {
        self.public_key.size() - 2 * OAEP_HASH_SIZE - 2
    }

    /// Public key as SPKI PEM
    pub fn public_key_pem(&self) -> Result<String> {
        self.public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Encrypt text with the public key, returning base64
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        if plaintext.is_empty() {
            return Err(Error::InputRequired);
        }

        let limit = self.max_plaintext_len();
        if plaintext.len() > limit {
            return Err(Error::PlaintextTooLarge {
                size: plaintext.len(),
                limit,
            });
        }

        let mut rng = rand::thread_rng();
        let ciphertext = self
            .public_key
            .encrypt(&mut rng, Oaep::new::<Sha256>(), plaintext.as_bytes())
            .map_err(|e| Error::Encryption(e.to_string()))?;

        Ok(STANDARD.encode(ciphertext))
    }

    /// Decrypt base64 ciphertext with the private key
    pub fn decrypt(&self, ciphertext: &str) -> Result<String> {
        if ciphertext.is_empty() {
            return Err(Error::InputRequired);
        }

        let bytes = STANDARD
            .decode(ciphertext.trim())
            .map_err(|e| Error::DecryptionFailed(format!("invalid base64: {}", e)))?;

        let plaintext = self
            .private_key
            .decrypt(Oaep::new::<Sha256>(), &bytes)
            .map_err(|e| Error::DecryptionFailed(e.to_string()))?;

        Ok(String::from_utf8(plaintext)?)
    }
}

impl std::fmt::Debug for AsymmetricCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsymmetricCipher")
            .field("bits", &(self.public_key.size() * 8))
            .finish_non_exhaustive()
    }
}
