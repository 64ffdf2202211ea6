//! Cryptography module for textcrypt
//!
//! Provides AES-256-GCM encryption with PBKDF2-HMAC-SHA256 key derivation,
//! packaged as hex envelopes, and RSA-OAEP encryption with an in-memory key pair.

mod asymmetric;
mod envelope;
mod kdf;
mod symmetric;

pub use asymmetric::AsymmetricCipher;
pub use envelope::Envelope;
pub use kdf::{derive_key, DerivedKey};
pub use symmetric::{decrypt, encrypt, validate_key_material};

#[cfg(test)]
pub(crate) use asymmetric::tests::shared_cipher;

/// Size of AES-256 key (and of the passphrase) in bytes
pub const KEY_SIZE: usize = 32;

/// Size of GCM nonce in bytes
pub const NONCE_SIZE: usize = 16;

/// Size of GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Size of salt for key derivation
pub const SALT_SIZE: usize = 16;

/// Default PBKDF2 iteration count
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// RSA modulus size in bits
pub const RSA_KEY_BITS: usize = 2048;
