//! Backend selection logic for versioned storage.
//!
//! Determines which storage backend to use (git vs plain filesystem) from
//! the store configuration.

use std::path::Path;

use tracing::info;

use super::{Filesystem, Git, Storage};
use crate::core::config::StorageKind;
use crate::error::Result;

/// Open the configured storage backend for a store root.
///
/// # Errors
///
/// Returns `StorageError::Vcs` if git storage is configured but the root is
/// not a git work tree or git is not installed.
pub fn open_backend(root: &Path, kind: StorageKind) -> Result<Box<dyn Storage>> {
    match kind {
        StorageKind::Git => {
            info!(root = %root.display(), "using git storage backend");
            Ok(Box::new(Git::open(root)?))
        }
        StorageKind::Fs => {
            info!(root = %root.display(), "using filesystem storage backend");
            Ok(Box::new(Filesystem::new(root)))
        }
    }
}
