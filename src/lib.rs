//! textcrypt - Text encryption service
//!
//! This library encrypts and decrypts short texts with either a shared
//! passphrase (PBKDF2 + AES-256-GCM, packaged as a hex envelope) or an
//! in-memory RSA-2048 key pair (OAEP, base64 output).

pub mod config;
pub mod crypto;
pub mod error;
pub mod service;
pub mod session;

pub use config::Config;
pub use error::{Error, Result};
pub use service::{EncryptionService, Scheme};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::service::{EncryptionService, Scheme};
}
