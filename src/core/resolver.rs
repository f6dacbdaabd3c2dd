//! Hierarchical recipient resolution.
//!
//! The recipients of a secret are those listed in the nearest manifest found
//! walking from the secret's directory towards the store root. The nearest
//! manifest replaces its ancestors entirely. An empty manifest counts as
//! absent, so its scope keeps inheriting.

use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::core::context::Context;
use crate::core::domain::{Scope, ScopeEntry, SecretEntry};
use crate::core::manifest;
use crate::core::storage::{EntryKind, Storage};
use crate::core::types::{RecipientId, SecretPath};
use crate::error::{Error, ManifestError, Result, StorageError};

/// Read-only view of the manifest tree of one store.
pub struct Resolver<'a> {
    storage: &'a dyn Storage,
    secret_extension: &'a str,
}

/// Manifest governing a scope: where it lives and what it lists.
type Governing = Option<(Scope, Vec<RecipientId>)>;

/// Everything one tree walk finds.
#[derive(Debug, Default)]
struct Tree {
    secrets: Vec<SecretEntry>,
    manifests: Vec<ScopeEntry>,
}

impl<'a> Resolver<'a> {
    pub fn new(storage: &'a dyn Storage, secret_extension: &'a str) -> Self {
        Self {
            storage,
            secret_extension,
        }
    }

    /// Storage path of the ciphertext for a secret.
    pub fn secret_file(&self, path: &str) -> String {
        format!("{}.{}", path, self.secret_extension)
    }

    /// Read the manifest materialized at exactly `scope`.
    ///
    /// Returns `None` when the scope has no manifest file. The contents are
    /// returned as stored, possibly empty.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::ReadFailed` if the file exists but cannot be read.
    pub fn read_manifest(&self, ctx: &Context, scope: &Scope) -> Result<Option<Vec<RecipientId>>> {
        ctx.check()?;
        let path = scope.manifest_path();
        match self.storage.read_file(ctx, &path) {
            Ok(bytes) => {
                let ids = manifest::decode(&bytes);
                debug!(scope = %scope, recipients = ids.len(), "read manifest");
                Ok(Some(ids))
            }
            Err(StorageError::NotFound(_)) => {
                trace!(scope = %scope, "no manifest");
                Ok(None)
            }
            Err(StorageError::Cancelled) => Err(ctx.interrupted()),
            Err(source) => Err(ManifestError::ReadFailed {
                scope: scope.to_string(),
                source,
            }
            .into()),
        }
    }

    /// Whether `scope` has its own manifest file.
    pub fn manifest_exists(&self, ctx: &Context, scope: &Scope) -> Result<bool> {
        Ok(self.read_manifest(ctx, scope)?.is_some())
    }

    /// Find the nearest non-empty manifest at or above `start`.
    fn nearest(&self, ctx: &Context, start: &Scope) -> Result<Governing> {
        for scope in start.ancestors() {
            if let Some(ids) = self.read_manifest(ctx, &scope)? {
                if !ids.is_empty() {
                    return Ok(Some((scope, ids)));
                }
            }
        }
        Ok(None)
    }

    /// Effective recipients of a secret.
    ///
    /// The walk starts at the directory containing `path`; the empty path
    /// starts at the root. No manifest anywhere yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::ReadFailed` if a manifest on the way is
    /// unreadable, or `ValidationError::InvalidPath` for a malformed path.
    pub fn resolve(&self, ctx: &Context, path: &str) -> Result<Vec<RecipientId>> {
        let scope = Scope::of_secret(path)?;
        self.resolve_scope(ctx, &scope)
    }

    /// Effective recipients of a directory scope.
    pub fn resolve_scope(&self, ctx: &Context, scope: &Scope) -> Result<Vec<RecipientId>> {
        Ok(self
            .nearest(ctx, scope)?
            .map(|(_, ids)| ids)
            .unwrap_or_default())
    }

    /// Scope whose manifest applies to a secret path, if any.
    pub fn governing_scope(&self, ctx: &Context, path: &str) -> Result<Option<Scope>> {
        let scope = Scope::of_secret(path)?;
        Ok(self.nearest(ctx, &scope)?.map(|(scope, _)| scope))
    }

    /// Every secret below `scope` with the manifest that applies to it, sorted by path.
    pub fn secrets_under(&self, ctx: &Context, scope: &Scope) -> Result<Vec<SecretEntry>> {
        Ok(self.walk(ctx, scope)?.secrets)
    }

    /// Every secret path below `scope`, sorted.
    pub fn list_secrets(&self, ctx: &Context, scope: &Scope) -> Result<Vec<SecretPath>> {
        Ok(self
            .secrets_under(ctx, scope)?
            .into_iter()
            .map(|entry| entry.path)
            .collect())
    }

    /// Sorted union of the recipients of every secret, plus the root scope's.
    pub fn resolve_all(&self, ctx: &Context) -> Result<Vec<RecipientId>> {
        let root = Scope::root();
        let mut all: BTreeSet<RecipientId> = self.resolve_scope(ctx, &root)?.into_iter().collect();
        for entry in self.secrets_under(ctx, &root)? {
            all.extend(entry.recipients);
        }
        Ok(all.into_iter().collect())
    }

    /// Every scope that has its own manifest file, sorted.
    pub fn scopes(&self, ctx: &Context) -> Result<Vec<ScopeEntry>> {
        Ok(self.walk(ctx, &Scope::root())?.manifests)
    }

    /// Walk the tree below `start`, carrying the governing manifest down.
    ///
    /// Hidden entries are skipped, which keeps `.git` and the manifests
    /// themselves out of the secret list.
    fn walk(&self, ctx: &Context, start: &Scope) -> Result<Tree> {
        let inherited = match start.parent() {
            Some(parent) => self.nearest(ctx, &parent)?,
            None => None,
        };

        let suffix = format!(".{}", self.secret_extension);
        let mut tree = Tree::default();
        let mut stack: Vec<(Scope, Governing)> = vec![(start.clone(), inherited)];

        while let Some((scope, mut governing)) = stack.pop() {
            if let Some(ids) = self.read_manifest(ctx, &scope)? {
                if !ids.is_empty() {
                    governing = Some((scope.clone(), ids.clone()));
                }
                tree.manifests.push(ScopeEntry {
                    scope: scope.clone(),
                    recipients: ids,
                });
            }

            let entries = self
                .storage
                .list_directory(ctx, scope.as_str())
                .map_err(|e| storage_error(ctx, e))?;

            for entry in entries.into_iter().filter(|e| !e.is_hidden()) {
                match entry.kind {
                    EntryKind::Directory => {
                        stack.push((scope.child(&entry.name), governing.clone()));
                    }
                    EntryKind::File => {
                        let Some(stem) = entry.name.strip_suffix(&suffix) else {
                            continue;
                        };
                        if stem.is_empty() {
                            continue;
                        }
                        let (owner, recipients) = match &governing {
                            Some((owner, ids)) => (owner.clone(), ids.clone()),
                            None => (Scope::root(), Vec::new()),
                        };
                        tree.secrets.push(SecretEntry {
                            path: scope.join(stem),
                            scope: owner,
                            recipients,
                        });
                    }
                }
            }
        }

        tree.secrets.sort_by(|a, b| a.path.cmp(&b.path));
        tree.manifests.sort_by(|a, b| a.scope.cmp(&b.scope));
        debug!(
            scope = %start,
            secrets = tree.secrets.len(),
            manifests = tree.manifests.len(),
            "walked store tree"
        );
        Ok(tree)
    }
}

/// Map a storage failure outside manifest reads.
pub(crate) fn storage_error(ctx: &Context, err: StorageError) -> Error {
    match err {
        StorageError::Cancelled => ctx.interrupted(),
        other => other.into(),
    }
}
