//! In-memory storage.
//!
//! A cheap, cloneable store tree used by the test suite and benchmarks.
//! Clones share state, so a test can hand one clone to a `Store` and inspect
//! files and recorded history through another.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use super::{check, Entry, Storage, StorageResult};
use crate::core::context::Context;
use crate::error::StorageError;

/// One call to `record_change`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedChange {
    pub paths: Vec<String>,
    pub description: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<String, Vec<u8>>,
    changes: Vec<RecordedChange>,
    failing_reads: BTreeSet<String>,
    failing_writes: BTreeSet<String>,
    read_hooks: BTreeMap<String, ReadHook>,
}

/// Side effect fired once, right after a successful read of a path.
#[derive(Debug)]
enum ReadHook {
    Replace(Vec<u8>),
    Cancel(Context),
}

/// In-memory storage with fault injection.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<State>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_file(self, path: &str, contents: impl AsRef<[u8]>) -> Self {
        self.insert(path, contents);
        self
    }

    /// Put a file in place without recording a change.
    pub fn insert(&self, path: &str, contents: impl AsRef<[u8]>) {
        self.state()
            .files
            .insert(path.to_string(), contents.as_ref().to_vec());
    }

    /// Current contents of a file.
    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        self.state().files.get(path).cloned()
    }

    /// Every stored path, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.state().files.keys().cloned().collect()
    }

    /// Recorded history, oldest first.
    pub fn changes(&self) -> Vec<RecordedChange> {
        self.state().changes.clone()
    }

    /// Make reads of `path` fail with an I/O error.
    pub fn fail_reads_of(&self, path: &str) {
        self.state().failing_reads.insert(path.to_string());
    }

    /// Make writes to `path` fail with an I/O error.
    pub fn fail_writes_to(&self, path: &str) {
        self.state().failing_writes.insert(path.to_string());
    }

    /// Drop every injected read and write failure.
    pub fn clear_failures(&self) {
        let mut state = self.state();
        state.failing_reads.clear();
        state.failing_writes.clear();
    }

    /// Overwrite `path` right after its next read, as a concurrent writer would.
    pub fn replace_after_read(&self, path: &str, contents: impl AsRef<[u8]>) {
        self.state().read_hooks.insert(
            path.to_string(),
            ReadHook::Replace(contents.as_ref().to_vec()),
        );
    }

    /// Cancel `ctx` right after the next read of `path`.
    pub fn cancel_after_read(&self, path: &str, ctx: &Context) {
        self.state()
            .read_hooks
            .insert(path.to_string(), ReadHook::Cancel(ctx.clone()));
    }

    fn injected(path: &str) -> StorageError {
        StorageError::Io {
            path: path.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "injected failure"),
        }
    }
}

impl Storage for MemoryStorage {
    fn write_file(&self, ctx: &Context, path: &str, contents: &[u8]) -> StorageResult<()> {
        check(ctx)?;
        let mut state = self.state();
        if state.failing_writes.contains(path) {
            return Err(Self::injected(path));
        }
        state.files.insert(path.to_string(), contents.to_vec());
        Ok(())
    }

    fn read_file(&self, ctx: &Context, path: &str) -> StorageResult<Vec<u8>> {
        check(ctx)?;
        let mut state = self.state();
        if state.failing_reads.contains(path) {
            return Err(Self::injected(path));
        }
        let contents = state
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))?;

        match state.read_hooks.remove(path) {
            Some(ReadHook::Replace(next)) => {
                state.files.insert(path.to_string(), next);
            }
            Some(ReadHook::Cancel(target)) => target.cancel(),
            None => {}
        }
        Ok(contents)
    }

    fn remove_file(&self, ctx: &Context, path: &str) -> StorageResult<()> {
        check(ctx)?;
        self.state()
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    fn list_directory(&self, ctx: &Context, path: &str) -> StorageResult<Vec<Entry>> {
        check(ctx)?;
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{}/", path.trim_end_matches('/'))
        };

        let mut files = BTreeSet::new();
        let mut dirs = BTreeSet::new();
        for key in self.state().files.keys() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((dir, _)) => {
                    dirs.insert(dir.to_string());
                }
                None => {
                    files.insert(rest.to_string());
                }
            }
        }

        let mut entries: Vec<Entry> = dirs
            .into_iter()
            .map(Entry::directory)
            .chain(files.into_iter().map(Entry::file))
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
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
        check(ctx)?;
        self.state().changes.push(RecordedChange {
            paths: paths.to_vec(),
            description: description.to_string(),
            at: Utc::now(),
        });
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
