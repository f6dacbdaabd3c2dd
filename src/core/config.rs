//! Configuration file management.
//!
//! Handles reading, writing, and validating the optional `.keyscope.toml`
//! at the root of a store. A store without the file uses defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::constants;
use crate::error::{ConfigError, Result};

/// Store configuration stored in `.keyscope.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub gpg: GpgConfig,
    pub age: AgeConfig,
}

/// `[store]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Alias of this tree when mounted inside a larger store.
    pub alias: String,
    /// Crypto backend.
    pub crypto: CryptoKind,
    /// Versioned storage backend.
    pub storage: StorageKind,
    /// Extension of secret files, without the leading dot.
    pub secret_extension: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            alias: String::new(),
            crypto: CryptoKind::default(),
            storage: StorageKind::default(),
            secret_extension: constants::SECRET_EXTENSION.to_string(),
        }
    }
}

/// Crypto backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CryptoKind {
    #[default]
    Gpg,
    Age,
}

impl std::str::FromStr for CryptoKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gpg" => Ok(Self::Gpg),
            "age" => Ok(Self::Age),
            other => Err(ConfigError::UnknownCrypto(other.to_string())),
        }
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Git,
    Fs,
}

/// `[gpg]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpgConfig {
    /// gpg binary; looked up on `PATH` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary: Option<PathBuf>,
    /// Keyring directory (`--homedir`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homedir: Option<PathBuf>,
}

/// `[age]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgeConfig {
    /// File with the private identities used for decryption.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_file: Option<PathBuf>,
}

impl Config {
    /// Path to the configuration file of a store.
    pub fn config_path(root: &Path) -> PathBuf {
        root.join(constants::CONFIG_FILE)
    }

    /// Load configuration for a store root.
    ///
    /// A missing file yields the defaults. `KEYSCOPE_CRYPTO` overrides the
    /// configured crypto backend.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` if the TOML is malformed, or a validation
    /// error for invalid values.
    pub fn load(root: &Path) -> Result<Self> {
        let path = Self::config_path(root);
        debug!(path = %path.display(), "loading config");

        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(ConfigError::ReadFile)?;
            toml::from_str(&contents).map_err(ConfigError::Parse)?
        } else {
            debug!("no config file, using defaults");
            Self::default()
        };

        if let Ok(crypto) = std::env::var(constants::CRYPTO_ENV) {
            config.store.crypto = crypto.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the store root.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or file write fails.
    pub fn save(&self, root: &Path) -> Result<()> {
        debug!("saving config");
        let contents = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(Self::config_path(root), contents)?;
        Ok(())
    }

    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` on validation failure.
    pub fn validate(&self) -> Result<()> {
        let ext = &self.store.secret_extension;
        if ext.is_empty() || ext.contains(['.', '/']) {
            return Err(ConfigError::InvalidValue {
                field: "store.secret_extension",
                reason: format!("must be a bare extension like \"gpg\", got {:?}", ext),
            }
            .into());
        }

        if self.store.alias.contains('/') {
            return Err(ConfigError::InvalidValue {
                field: "store.alias",
                reason: "cannot contain '/'".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Default store root: `KEYSCOPE_STORE`, else `~/.keyscope/store`.
///
/// # Errors
///
/// Returns `ConfigError::NoHomeDir` if the home directory cannot be found.
pub fn default_root() -> Result<PathBuf> {
    if let Ok(root) = std::env::var(constants::STORE_ENV) {
        return Ok(PathBuf::from(root));
    }
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(constants::STORE_DIR))
}
