//! Configuration management for textcrypt

use crate::crypto::PBKDF2_ITERATIONS;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::Level;
use zeroize::Zeroizing;

/// Environment variable holding the symmetric passphrase
pub const ENV_PASSPHRASE: &str = "ENCRYPTION_KEY";

/// Environment variable overriding the PBKDF2 iteration count
pub const ENV_KDF_ITERATIONS: &str = "TEXTCRYPT_KDF_ITERATIONS";

/// Environment variable overriding the log level
pub const ENV_LOG_LEVEL: &str = "TEXTCRYPT_LOG_LEVEL";

/// Shared passphrase for the symmetric scheme.
///
/// Never serialized and never printed.
#[derive(Clone, Deserialize)]
#[serde(from = "String")]
pub struct Passphrase(Zeroizing<Vec<u8>>);

impl Passphrase {
    /// Raw passphrase bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Passphrase {
    fn from(s: String) -> Self {
        Passphrase(Zeroizing::new(s.into_bytes()))
    }
}

impl From<&str> for Passphrase {
    fn from(s: &str) -> Self {
        Passphrase(Zeroizing::new(s.as_bytes().to_vec()))
    }
}

impl std::fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Passphrase([REDACTED; {} bytes])", self.len())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Parsed log level
    pub fn level(&self) -> Result<Level> {
        Level::from_str(self.level.trim())
            .map_err(|_| Error::InvalidConfig(format!("Unknown log level: {}", self.level)))
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Symmetric passphrase (usually from the environment)
    #[serde(default, skip_serializing)]
    pub passphrase: Option<Passphrase>,

    /// PBKDF2 iteration count
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_kdf_iterations() -> u32 {
    PBKDF2_ITERATIONS
}

impl Default for Config {
    fn default() -> Self {
        Config {
            passphrase: None,
            kdf_iterations: PBKDF2_ITERATIONS,
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Create a config with the given passphrase and default tunables
    pub fn with_passphrase(passphrase: impl Into<Passphrase>) -> Self {
        Config {
            passphrase: Some(passphrase.into()),
            ..Config::default()
        }
    }

    /// Load configuration from a file, with environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!("Failed to read config file: {}", e))
        })?;

        let mut config: Config = serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse config file: {}", e))
        })?;

        // Override with environment variables if set
        config.apply_env_overrides();

        config.validate()?;
        Ok(config)
    }

    /// Create a new config from environment variables only
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to the environment
    pub fn load_or_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Self::from_env()
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // The passphrase is taken verbatim, whitespace is significant
        if let Some(passphrase) = lookup(ENV_PASSPHRASE) {
            if !passphrase.is_empty() {
                self.passphrase = Some(Passphrase::from(passphrase));
            }
        }

        if let Some(iterations) = lookup(ENV_KDF_ITERATIONS) {
            if let Ok(n) = iterations.trim().parse::<u32>() {
                self.kdf_iterations = n;
            }
        }

        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            let level = level.trim().to_string();
            if !level.is_empty() {
                self.logging.level = level;
            }
        }
    }

    /// Save configuration to a file (the passphrase is never written)
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            Error::Config(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path.as_ref(), content).map_err(|e| {
            Error::Config(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Validate the configuration.
    ///
    /// The passphrase is checked per call instead: a missing or wrong-length
    /// passphrase disables only the symmetric scheme.
    pub fn validate(&self) -> Result<()> {
        if self.kdf_iterations == 0 {
            return Err(Error::InvalidConfig(
                "KDF iterations must be greater than 0".to_string(),
            ));
        }

        self.logging.level()?;

        Ok(())
    }
}
