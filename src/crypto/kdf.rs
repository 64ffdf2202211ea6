//! PBKDF2-HMAC-SHA256 key derivation

use crate::crypto::{KEY_SIZE, SALT_SIZE};
use crate::error::{Error, Result};
use ring::pbkdf2;
use std::num::NonZeroU32;
use zeroize::Zeroizing;

/// A key derived from the passphrase for a single operation
pub struct DerivedKey {
    key: Zeroizing<[u8; KEY_SIZE]>,
}

impl DerivedKey {
    /// Get the raw key bytes
    pub fn key(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey([REDACTED])")
    }
}

/// Derive a 256-bit key from passphrase bytes and salt.
///
/// Deterministic for a given (passphrase, salt, iterations). This is CPU-bound
/// and takes tens of milliseconds at the default cost, so async callers must
/// run it on a blocking thread.
pub fn derive_key(passphrase: &[u8], salt: &[u8; SALT_SIZE], iterations: u32) -> Result<DerivedKey> {
    let iterations = NonZeroU32::new(iterations)
        .ok_or_else(|| Error::KeyDerivation("iteration count must be non-zero".to_string()))?;

    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        salt,
        passphrase,
        &mut key[..],
    );

    Ok(DerivedKey { key })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let salt = [7u8; SALT_SIZE];
        let k1 = derive_key(b"passphrase", &salt, 1000).unwrap();
        let k2 = derive_key(b"passphrase", &salt, 1000).unwrap();
        assert_eq!(k1.key(), k2.key());
    }

    #[test]
    fn test_salt_changes_key() {
        let k1 = derive_key(b"passphrase", &[1u8; SALT_SIZE], 1000).unwrap();
        let k2 = derive_key(b"passphrase", &[2u8; SALT_SIZE], 1000).unwrap();
        assert_ne!(k1.key(), k2.key());
    }

    #[test]
    fn test_iterations_change_key() {
        let salt = [0u8; SALT_SIZE];
        let k1 = derive_key(b"passphrase", &salt, 1000).unwrap();
        let k2 = derive_key(b"passphrase", &salt, 1001).unwrap();
        assert_ne!(k1.key(), k2.key());
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let result = derive_key(b"passphrase", &[0u8; SALT_SIZE], 0);
        assert!(matches!(result, Err(Error::KeyDerivation(_))));
    }

    #[test]
    fn test_debug_redacted() {
        let key = derive_key(b"passphrase", &[0u8; SALT_SIZE], 1).unwrap();
        assert_eq!(format!("{:?}", key), "DerivedKey([REDACTED])");
    }
}
