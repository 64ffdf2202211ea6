//! Error types for textcrypt

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for textcrypt
#[derive(Error, Debug)]
pub enum Error {
    // Request validation errors
    #[error("Text is required")]
    InputRequired,

    #[error("Invalid method: {0}")]
    InvalidMethod(String),

    // Symmetric scheme errors
    #[error("Invalid encryption key configuration: {0}")]
    InvalidKeyConfiguration(String),

    #[error("Invalid encrypted format: {0}")]
    MalformedEnvelope(String),

    #[error("Authentication failed: data corrupted or wrong key")]
    AuthenticationFailed,

    #[error("Decrypted data is not valid UTF-8: {0}")]
    Decode(String),

    // Asymmetric scheme errors
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Failed to generate key pair: {0}")]
    KeyGenerationFailed(String),

    #[error("Plaintext too large: {size} bytes exceeds limit of {limit} bytes")]
    PlaintextTooLarge { size: usize, limit: usize },

    // Primitive failures
    #[error("Key derivation error: {0}")]
    KeyDerivation(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            Error::InputRequired => "input_required",
            Error::InvalidMethod(_) => "invalid_method",
            Error::InvalidKeyConfiguration(_) => "invalid_key_configuration",
            Error::MalformedEnvelope(_) => "malformed_envelope",
            Error::AuthenticationFailed => "authentication_failed",
            Error::Decode(_) => "decode_error",
            Error::DecryptionFailed(_) => "decryption_failed",
            Error::KeyGenerationFailed(_) => "key_generation_failed",
            Error::PlaintextTooLarge { .. } => "plaintext_too_large",
            Error::KeyDerivation(_) | Error::Encryption(_) | Error::Internal(_) => "internal_error",
            Error::Config(_) | Error::InvalidConfig(_) => "config_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Error::Decode(e.utf8_error().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(Error::InputRequired.code(), "input_required");
        assert_eq!(Error::InvalidMethod("XYZ".into()).code(), "invalid_method");
        assert_eq!(Error::AuthenticationFailed.code(), "authentication_failed");
        assert_eq!(
            Error::PlaintextTooLarge { size: 200, limit: 190 }.code(),
            "plaintext_too_large"
        );
        assert_eq!(Error::KeyDerivation("x".into()).code(), "internal_error");
    }

    #[test]
    fn test_utf8_conversion() {
        let err: Error = String::from_utf8(vec![0xff, 0xfe]).unwrap_err().into();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_messages() {
        assert_eq!(Error::InputRequired.to_string(), "Text is required");
        assert_eq!(
            Error::InvalidMethod("XYZ".into()).to_string(),
            "Invalid method: XYZ"
        );
    }
}
