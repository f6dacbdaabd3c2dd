//! Filesystem-based storage implementation.
//!
//! Reads and writes store files directly below a root directory. Writes are
//! atomic (temp file + rename) so a secret is never left half-written.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{check, Entry, EntryKind, Storage, StorageResult};
use crate::core::context::Context;
use crate::error::StorageError;

/// Filesystem storage rooted at a store directory.
#[derive(Debug, Clone)]
pub struct Filesystem {
    root: PathBuf,
}

impl Filesystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a store-relative path.
    pub fn full_path(&self, path: &str) -> PathBuf {
        let mut full = self.root.clone();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            full.push(part);
        }
        full
    }
}

/// Restrict permissions on a file (Unix only).
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

impl Storage for Filesystem {
    fn write_file(&self, ctx: &Context, path: &str, contents: &[u8]) -> StorageResult<()> {
        check(ctx)?;
        let target = self.full_path(path);
        debug!(path = %target.display(), bytes = contents.len(), "writing file");

        let dir = target
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        fs::create_dir_all(&dir).map_err(|e| StorageError::io(path, e))?;

        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let tmp = dir.join(format!(".{}.tmp-{}", file_name, std::process::id()));

        let write = || -> std::io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            restrict_permissions(&tmp)?;
            file.write_all(contents)?;
            file.sync_all()?;
            fs::rename(&tmp, &target)
        };

        if let Err(e) = write() {
            let _ = fs::remove_file(&tmp);
            return Err(StorageError::io(path, e));
        }

        Ok(())
    }

    fn read_file(&self, ctx: &Context, path: &str) -> StorageResult<Vec<u8>> {
        check(ctx)?;
        fs::read(self.full_path(path)).map_err(|e| StorageError::io(path, e))
    }

    fn remove_file(&self, ctx: &Context, path: &str) -> StorageResult<()> {
        check(ctx)?;
        debug!(path, "removing file");
        fs::remove_file(self.full_path(path)).map_err(|e| StorageError::io(path, e))
    }

    fn list_directory(&self, ctx: &Context, path: &str) -> StorageResult<Vec<Entry>> {
        check(ctx)?;
        let dir = self.full_path(path);
        let read = match fs::read_dir(&dir) {
            Ok(read) => read,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(path, e)),
        };

        let mut entries = Vec::new();
        for item in read {
            let item = item.map_err(|e| StorageError::io(path, e))?;
            // Follow symlinks so linked sub-trees behave like directories.
            let metadata = fs::metadata(item.path()).map_err(|e| StorageError::io(path, e))?;
            let kind = if metadata.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            entries.push(Entry {
                name: item.file_name().to_string_lossy().to_string(),
                kind,
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn record_change(
        &self,
        _ctx: &Context,
        paths: &[String],
        description: &str,
    ) -> StorageResult<()> {
        if !paths.is_empty() {
            debug!(files = paths.len(), description, "change recorded (no history)");
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fs"
    }
}
