//! AES-256-GCM Encryption Implementation
//!
//! Text is encrypted using AES-256-GCM with a 128-bit nonce, which provides:
//! - Confidentiality: Data is encrypted
//! - Integrity: Any tampering is detected
//! - Authentication: Verifies the data came from the passphrase holder
//!
//! Each call derives a fresh key from the passphrase and a random salt.

use crate::crypto::{derive_key, Envelope, KEY_SIZE, NONCE_SIZE, SALT_SIZE, TAG_SIZE};
use crate::error::{Error, Result};
use aes_gcm::aead::consts::U16;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::AesGcm;
use rand::RngCore;

/// AES-256-GCM with a 16-byte nonce
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// No associated data is bound into the envelope
const AAD: &[u8] = b"";

/// Check that the passphrase has exactly the AES-256 key length
pub fn validate_key_material(key_material: &[u8]) -> Result<()> {
    if key_material.len() != KEY_SIZE {
        return Err(Error::InvalidKeyConfiguration(format!(
            "expected {} bytes, got {}",
            KEY_SIZE,
            key_material.len()
        )));
    }
    Ok(())
}

/// Encrypt text under a key derived from `key_material`
///
/// # Arguments
/// * `plaintext` - Text to encrypt
/// * `key_material` - 32-byte passphrase
/// * `iterations` - PBKDF2 iteration count
///
/// # Returns
/// Envelope holding nonce, salt, tag and ciphertext
pub fn encrypt(plaintext: &str, key_material: &[u8], iterations: u32) -> Result<Envelope> {
    validate_key_material(key_material)?;

    // Fresh salt and nonce for every call
    let mut rng = rand::thread_rng();
    let mut salt = [0u8; SALT_SIZE];
    rng.fill_bytes(&mut salt);
    let mut nonce = [0u8; NONCE_SIZE];
    rng.fill_bytes(&mut nonce);

    let key = derive_key(key_material, &salt, iterations)?;
    let cipher = Aes256Gcm16::new_from_slice(key.key())
        .map_err(|_| Error::Encryption("Failed to create encryption key".to_string()))?;

    // Encrypt in place, tag is kept detached
    let mut in_out = plaintext.as_bytes().to_vec();
    let tag = cipher
        .encrypt_in_place_detached(GenericArray::from_slice(&nonce), AAD, &mut in_out)
        .map_err(|_| Error::Encryption("Encryption failed".to_string()))?;

    let mut tag_bytes = [0u8; TAG_SIZE];
    tag_bytes.copy_from_slice(&tag);

    Ok(Envelope {
        nonce,
        salt,
        tag: tag_bytes,
        ciphertext: in_out,
    })
}

/// Decrypt an envelope under a key derived from `key_material`
///
/// No plaintext is released unless the tag verifies.
pub fn decrypt(envelope: &Envelope, key_material: &[u8], iterations: u32) -> Result<String> {
    validate_key_material(key_material)?;

    let key = derive_key(key_material, &envelope.salt, iterations)?;
    let cipher = Aes256Gcm16::new_from_slice(key.key())
        .map_err(|_| Error::Encryption("Failed to create decryption key".to_string()))?;

    let mut in_out = envelope.ciphertext.clone();
    cipher
        .decrypt_in_place_detached(
            GenericArray::from_slice(&envelope.nonce),
            AAD,
            &mut in_out,
            GenericArray::from_slice(&envelope.tag),
        )
        .map_err(|_| Error::AuthenticationFailed)?;

    Ok(String::from_utf8(in_out)?)
}
