//! Constants used throughout keyscope.
//!
//! Centralizes magic strings and configuration values.

/// Recipient manifest file name, identical in every scope directory.
pub const MANIFEST_FILE: &str = ".gpg-id";

/// Store configuration file name, located at the store root.
pub const CONFIG_FILE: &str = ".keyscope.toml";

/// Default extension of encrypted secret files (without the dot).
pub const SECRET_EXTENSION: &str = "gpg";

/// Default store location relative to HOME (~/.keyscope/store).
pub const STORE_DIR: &str = ".keyscope/store";

/// Environment variable selecting the store root.
pub const STORE_ENV: &str = "KEYSCOPE_STORE";

/// Environment variable overriding the configured crypto backend.
pub const CRYPTO_ENV: &str = "KEYSCOPE_CRYPTO";

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "KEYSCOPE_LOG";

/// Environment variable switching log output to JSON lines (`json`).
pub const LOG_FORMAT_ENV: &str = "KEYSCOPE_LOG_FORMAT";
