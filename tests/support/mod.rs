//! Test support utilities for keyscope integration tests.
//!
//! Provides isolated store trees, age keys, and helper commands.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fixtures;
pub mod skip;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;

use std::fs;
use std::path::{Path, PathBuf};

use age::secrecy::ExposeSecret;
use age::x25519;
use keyscope::core::cipher::{AgeKeyring, Crypto};
use keyscope::core::config::{Config, CryptoKind, StorageKind};
use keyscope::core::storage::Filesystem;
use keyscope::{Context, Store};
use tempfile::TempDir;

/// Test environment with isolated temp directories.
///
/// `dir` is the store root and `home` the HOME of child processes. No
/// process-global state is mutated, so tests can run in parallel.
pub struct Test {
    /// Store root
    pub dir: TempDir,
    /// Temporary home directory
    pub home: TempDir,
}

/// An age keypair with its identity file written to disk.
pub struct Key {
    pub identity: x25519::Identity,
    pub public: String,
    pub identity_file: PathBuf,
}

impl Test {
    /// Create a new empty store tree.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let home = TempDir::new().expect("failed to create temp home");
        Self { dir, home }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Generate an age keypair and write its identity file under `home`.
    pub fn key(&self, name: &str) -> Key {
        let identity = x25519::Identity::generate();
        let public = identity.to_public().to_string();
        let identity_file = self.home.path().join(format!("{}.key", name));
        fs::write(
            &identity_file,
            format!(
                "# public key: {}\n{}\n",
                public,
                identity.to_string().expose_secret()
            ),
        )
        .expect("failed to write identity file");
        Key {
            identity,
            public,
            identity_file,
        }
    }

    /// Write `.keyscope.toml` selecting age with `owner`'s identity.
    pub fn write_config(&self, owner: &Key) {
        let mut config = Config::default();
        config.store.crypto = CryptoKind::Age;
        config.store.storage = StorageKind::Fs;
        config.age.identity_file = Some(owner.identity_file.clone());
        config.save(self.root()).expect("failed to save config");
    }

    /// Open the store as `key` would, with fs storage.
    pub fn store_as(&self, key: &Key) -> Store {
        let keyring = AgeKeyring::new().with_identity(key.identity.clone());
        Store::new(
            "test",
            self.root(),
            Box::new(keyring),
            Box::new(Filesystem::new(self.root())),
        )
    }

    /// Write a file relative to the store root, creating parents.
    pub fn write(&self, path: &str, contents: impl AsRef<[u8]>) {
        let full = self.root().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).expect("failed to create dirs");
        }
        fs::write(full, contents).expect("failed to write file");
    }

    /// Read a file relative to the store root.
    pub fn read(&self, path: &str) -> Vec<u8> {
        fs::read(self.root().join(path)).expect("failed to read file")
    }

    /// Encrypt `plaintext` for `recipients` and store it as secret `path`.
    pub fn seal(&self, path: &str, plaintext: &str, recipients: &[&Key]) {
        let ids: Vec<String> = recipients.iter().map(|k| k.public.clone()).collect();
        let ciphertext = AgeKeyring::new()
            .encrypt(&Context::background(), plaintext.as_bytes(), &ids)
            .expect("failed to encrypt fixture");
        self.write(&format!("{}.gpg", path), ciphertext);
    }

    /// Decrypt secret `path` with only `key`'s identity.
    pub fn open_as(&self, path: &str, key: &Key) -> Option<String> {
        let keyring = AgeKeyring::new().with_identity(key.identity.clone());
        keyring
            .decrypt(&Context::background(), &self.read(&format!("{}.gpg", path)))
            .ok()
            .map(|p| String::from_utf8(p).expect("plaintext is utf-8"))
    }
}
