//! Git storage backend.
//!
//! Files live in a git work tree; every recorded change becomes one commit
//! containing exactly the recorded paths.
//!
//! ## Requirements
//!
//! - `git` CLI must be installed
//! - The store root must be a git work tree (`git init` it first)

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::{debug, info};

use super::{check, Entry, Filesystem, Storage, StorageResult};
use crate::core::context::Context;
use crate::error::StorageError;

/// Filesystem storage with git history.
#[derive(Debug, Clone)]
pub struct Git {
    fs: Filesystem,
    binary: PathBuf,
}

impl Git {
    /// Open the git work tree at `root`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Vcs` if git is not installed or `root` is not a
    /// git work tree.
    pub fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        let binary = which::which("git").map_err(|_| {
            StorageError::Vcs("git CLI not found. Install git or set storage = \"fs\"".to_string())
        })?;

        if !root.join(".git").exists() {
            return Err(StorageError::Vcs(format!(
                "{} is not a git repository (run: git init)",
                root.display()
            )));
        }

        Ok(Self {
            fs: Filesystem::new(root),
            binary,
        })
    }

    /// Store root directory.
    pub fn root(&self) -> &Path {
        self.fs.root()
    }

    fn git(&self, ctx: &Context, args: &[&str]) -> StorageResult<Output> {
        check(ctx)?;
        debug!(?args, "running git");
        Command::new(&self.binary)
            .current_dir(self.root())
            .args(args)
            .output()
            .map_err(|e| StorageError::Vcs(format!("failed to run git: {}", e)))
    }

    fn git_ok(&self, ctx: &Context, args: &[&str]) -> StorageResult<Output> {
        let output = self.git(ctx, args)?;
        if !output.status.success() {
            return Err(StorageError::Vcs(format!(
                "git {} failed: {}",
                args.first().copied().unwrap_or_default(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(output)
    }

    /// Author overrides when the repository has no identity configured.
    fn identity_args(&self, ctx: &Context) -> StorageResult<Vec<String>> {
        let configured = self.git(ctx, &["config", "user.email"])?;
        let email = String::from_utf8_lossy(&configured.stdout);
        if configured.status.success() && !email.trim().is_empty() {
            return Ok(Vec::new());
        }

        let user = whoami::username();
        let host = whoami::fallible::hostname().unwrap_or_else(|_| "localhost".to_string());
        Ok(vec![
            "-c".to_string(),
            format!("user.name={}", user),
            "-c".to_string(),
            format!("user.email={}@{}", user, host),
        ])
    }
}

impl Storage for Git {
    fn write_file(&self, ctx: &Context, path: &str, contents: &[u8]) -> StorageResult<()> {
        self.fs.write_file(ctx, path, contents)
    }

    fn read_file(&self, ctx: &Context, path: &str) -> StorageResult<Vec<u8>> {
        self.fs.read_file(ctx, path)
    }

    fn remove_file(&self, ctx: &Context, path: &str) -> StorageResult<()> {
        self.fs.remove_file(ctx, path)
    }

    fn list_directory(&self, ctx: &Context, path: &str) -> StorageResult<Vec<Entry>> {
        self.fs.list_directory(ctx, path)
    }

    fn record_change(
        &self,
        ctx: &Context,
        paths: &[String],
        description: &str,
    ) -> StorageResult<()> {
        if paths.is_empty() {
            return Ok(());
        }

        let mut add = vec!["add", "--all", "--"];
        add.extend(paths.iter().map(String::as_str));
        self.git_ok(ctx, &add)?;

        let mut staged = vec!["diff", "--cached", "--quiet", "--"];
        staged.extend(paths.iter().map(String::as_str));
        if self.git(ctx, &staged)?.status.success() {
            debug!(description, "nothing to commit");
            return Ok(());
        }

        let identity = self.identity_args(ctx)?;
        let mut commit: Vec<&str> = identity.iter().map(String::as_str).collect();
        commit.extend(["commit", "--quiet", "-m", description, "--"]);
        commit.extend(paths.iter().map(String::as_str));
        self.git_ok(ctx, &commit)?;

        info!(files = paths.len(), description, "committed");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "git"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn git_available() -> bool {
        which::which("git").is_ok()
    }

    fn init_repo(dir: &Path) {
        let status = Command::new("git")
            .args(["init", "--quiet"])
            .current_dir(dir)
            .status()
            .unwrap();
        assert!(status.success());
    }

    fn log_subjects(dir: &Path) -> Vec<String> {
        let output = Command::new("git")
            .args(["log", "--format=%s"])
            .current_dir(dir)
            .output()
            .unwrap();
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_open_requires_repository() {
        if !git_available() {
            eprintln!("Skipping git tests - git not installed");
            return;
        }
        let tmp = TempDir::new().unwrap();
        assert!(matches!(Git::open(tmp.path()), Err(StorageError::Vcs(_))));
    }

    #[test]
    fn test_record_change_commits_paths() {
        if !git_available() {
            eprintln!("Skipping git tests - git not installed");
            return;
        }
        let tmp = TempDir::new().unwrap();
        init_repo(tmp.path());
        let git = Git::open(tmp.path()).unwrap();
        let ctx = Context::background();

        git.write_file(&ctx, ".gpg-id", b"0xA\n").unwrap();
        git.record_change(&ctx, &[".gpg-id".to_string()], "Added recipient 0xA")
            .unwrap();

        assert_eq!(log_subjects(tmp.path()), vec!["Added recipient 0xA"]);
    }

    #[test]
    fn test_record_change_skips_unchanged_and_empty() {
        if !git_available() {
            eprintln!("Skipping git tests - git not installed");
            return;
        }
        let tmp = TempDir::new().unwrap();
        init_repo(tmp.path());
        let git = Git::open(tmp.path()).unwrap();
        let ctx = Context::background();

        git.write_file(&ctx, ".gpg-id", b"0xA\n").unwrap();
        git.record_change(&ctx, &[".gpg-id".to_string()], "first").unwrap();
        git.record_change(&ctx, &[".gpg-id".to_string()], "second").unwrap();
        git.record_change(&ctx, &[], "empty").unwrap();

        assert_eq!(log_subjects(tmp.path()), vec!["first"]);
    }
}
