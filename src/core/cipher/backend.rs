//! Crypto backend selection.
//!
//! Builds the configured `Crypto` implementation:
//! - **gpg** (default): the gpg CLI, optionally pinned to a binary and keyring
//! - **age**: x25519 identities loaded from the configured identity file

use tracing::{debug, warn};

use super::{AgeKeyring, Crypto, Gpg};
use crate::core::config::{Config, CryptoKind};
use crate::error::Result;

/// Open the crypto backend named by `config`.
///
/// # Errors
///
/// Returns `CipherError::BackendUnavailable` if gpg is selected and not
/// installed, or an error if the age identity file cannot be loaded.
pub fn open_backend(config: &Config) -> Result<Box<dyn Crypto>> {
    match config.store.crypto {
        CryptoKind::Gpg => {
            let mut gpg = match &config.gpg.binary {
                Some(binary) => Gpg::with_binary(binary),
                None => Gpg::new()?,
            };
            if let Some(homedir) = &config.gpg.homedir {
                gpg = gpg.with_homedir(homedir);
            }
            debug!(?gpg, "creating gpg crypto backend");
            Ok(Box::new(gpg))
        }
        CryptoKind::Age => {
            let keyring = match &config.age.identity_file {
                Some(path) => AgeKeyring::load(path)?,
                None => {
                    warn!("no age identity file configured; secrets cannot be decrypted");
                    AgeKeyring::new()
                }
            };
            debug!(?keyring, "creating age crypto backend");
            Ok(Box::new(keyring))
        }
    }
}
