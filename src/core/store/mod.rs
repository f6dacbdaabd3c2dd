//! The primary interface for keyscope operations.
//!
//! A `Store` owns the crypto and storage backends of one secret tree and
//! provides every recipient operation on it.

mod recipients;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::cipher::{self, Crypto};
use crate::core::config::Config;
use crate::core::constants;
use crate::core::mutator::Mutator;
use crate::core::reencrypt::Reencryptor;
use crate::core::resolver::Resolver;
use crate::core::storage::{self, Storage};
use crate::error::Result;

/// One mounted secret tree.
///
/// There is no global registry: callers hold one `Store` per alias and
/// serialize mutations against it.
pub struct Store {
    alias: String,
    root: PathBuf,
    secret_extension: String,
    crypto: Box<dyn Crypto>,
    storage: Box<dyn Storage>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("alias", &self.alias)
            .field("root", &self.root)
            .field("crypto", &self.crypto.name())
            .field("storage", &self.storage.name())
            .finish()
    }
}

impl Store {
    /// Build a store from explicit collaborators.
    pub fn new(
        alias: impl Into<String>,
        root: impl Into<PathBuf>,
        crypto: Box<dyn Crypto>,
        storage: Box<dyn Storage>,
    ) -> Self {
        Self {
            alias: alias.into(),
            root: root.into(),
            secret_extension: constants::SECRET_EXTENSION.to_string(),
            crypto,
            storage,
        }
    }

    /// Open the store at `root` with the backends named by `config`.
    ///
    /// The alias defaults to the root directory name.
    ///
    /// # Errors
    ///
    /// Returns error if a configured backend is unavailable, e.g. gpg is not
    /// installed or git storage is configured outside a git work tree.
    pub fn open(root: &Path, config: &Config) -> Result<Self> {
        let crypto = cipher::open_backend(config)?;
        let storage = storage::open_backend(root, config.store.storage)?;

        let alias = if config.store.alias.is_empty() {
            root.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        } else {
            config.store.alias.clone()
        };

        let store = Self::new(alias, root, crypto, storage)
            .with_secret_extension(&config.store.secret_extension);
        debug!(?store, "opened store");
        Ok(store)
    }

    /// Use a secret file extension other than `gpg`.
    pub fn with_secret_extension(mut self, extension: &str) -> Self {
        self.secret_extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn crypto(&self) -> &dyn Crypto {
        self.crypto.as_ref()
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    /// Read-only resolution over this store's manifests.
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self.storage.as_ref(), &self.secret_extension)
    }

    /// Manifest writes without the follow-up re-encryption.
    pub fn mutator(&self) -> Mutator<'_> {
        Mutator::new(
            self.storage.as_ref(),
            self.crypto.as_ref(),
            &self.secret_extension,
        )
    }

    pub(crate) fn reencryptor(&self) -> Reencryptor<'_> {
        Reencryptor::new(
            self.storage.as_ref(),
            self.crypto.as_ref(),
            &self.secret_extension,
        )
    }
}
