//! Versioned storage.
//!
//! Provides the file and history operations keyscope needs from the store
//! backend, with implementations for different backends.
//!
//! ## Backends
//!
//! - **fs**: plain filesystem, history recording is a no-op.
//! - **git**: filesystem plus `git add` / `git commit` per recorded change.
//! - **memory**: in-memory tree with fault injection, used by tests.
//!
//! ## Adding a New Storage Backend
//!
//! 1. Implement the `Storage` trait
//! 2. Add the implementation in a new file (e.g., `s3.rs`)
//! 3. Re-export from this module

use crate::core::context::Context;
use crate::error::StorageError;

mod backend;
mod fs;
mod git;
#[cfg(any(test, feature = "test-support"))]
mod memory;

pub use backend::open_backend;
pub use fs::Filesystem;
pub use git::Git;
#[cfg(any(test, feature = "test-support"))]
pub use memory::{MemoryStorage, RecordedChange};

/// Result type for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// A single directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
}

impl Entry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
        }
    }

    /// Hidden entries (`.git`, manifests) are never treated as secrets.
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }
}

/// Versioned storage trait.
///
/// Paths are `/`-separated and relative to the store root. Implementations
/// must report a missing file as `StorageError::NotFound` so callers can tell
/// "absent" from "unreadable".
pub trait Storage {
    /// Write a file, replacing any previous contents.
    ///
    /// Missing parent directories are created.
    fn write_file(&self, ctx: &Context, path: &str, contents: &[u8]) -> StorageResult<()>;

    /// Read a whole file.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the file does not exist.
    fn read_file(&self, ctx: &Context, path: &str) -> StorageResult<Vec<u8>>;

    /// Remove a file.
    fn remove_file(&self, ctx: &Context, path: &str) -> StorageResult<()>;

    /// List a directory, sorted by name.
    ///
    /// A missing directory lists as empty.
    fn list_directory(&self, ctx: &Context, path: &str) -> StorageResult<Vec<Entry>>;

    /// Record changed paths as one logical history entry.
    ///
    /// An empty path list is a no-op.
    fn record_change(&self, ctx: &Context, paths: &[String], description: &str)
        -> StorageResult<()>;

    /// Backend name for display/config.
    fn name(&self) -> &'static str;
}

/// Fail fast when the context is done.
pub(crate) fn check(ctx: &Context) -> StorageResult<()> {
    if ctx.is_done() {
        return Err(StorageError::Cancelled);
    }
    Ok(())
}
