//! Recipient manifest mutations.
//!
//! Every mutation resolves the effective list of its scope, validates the
//! ids it introduces against the crypto backend, writes the manifest at
//! exactly that scope and records the write in versioned storage. Unsafe
//! mutations are rejected before anything is written.

use tracing::{debug, info, warn};

use crate::core::cipher::Crypto;
use crate::core::context::Context;
use crate::core::domain::{RecipientChange, Scope};
use crate::core::manifest;
use crate::core::resolver::Resolver;
use crate::core::storage::Storage;
use crate::core::types::RecipientId;
use crate::core::validation::validate_recipient;
use crate::error::{ManifestError, RecipientError, Result, StorageError};

/// Writes recipient manifests for one store.
pub struct Mutator<'a> {
    storage: &'a dyn Storage,
    crypto: &'a dyn Crypto,
    resolver: Resolver<'a>,
}

impl<'a> Mutator<'a> {
    pub fn new(storage: &'a dyn Storage, crypto: &'a dyn Crypto, secret_extension: &'a str) -> Self {
        Self {
            storage,
            crypto,
            resolver: Resolver::new(storage, secret_extension),
        }
    }

    /// Add a recipient to a scope.
    ///
    /// The scope's effective list gains `id` and is written at `scope`, which
    /// materializes a manifest there if the scope used to inherit. An id that
    /// is already effective is a no-op and nothing is written.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a malformed id, `RecipientError::Invalid`
    /// if the backend rejects it, or a manifest error if reading or writing
    /// fails.
    pub fn add(&self, ctx: &Context, scope: &Scope, id: &str) -> Result<RecipientChange> {
        let id = validate_recipient(id)?;
        let old = self.resolver.resolve_scope(ctx, scope)?;

        if old.contains(&id) {
            debug!(scope = %scope, id = %id, "recipient already present");
            return Ok(RecipientChange::unchanged(scope.clone(), old));
        }

        let warnings = self.check_recipients(ctx, std::slice::from_ref(&id))?;

        let mut new = old.clone();
        new.push(id.clone());
        let description = ctx.describe(&format!("Added Recipient {}", id));
        self.write_manifest(ctx, scope, &new, &description)?;

        info!(scope = %scope, id = %id, "added recipient");
        Ok(RecipientChange {
            scope: scope.clone(),
            old,
            new,
            warnings,
        })
    }

    /// Remove every occurrence of a recipient from a scope.
    ///
    /// An id that is not effective is a no-op. A non-root scope left without
    /// recipients keeps an empty manifest and inherits from its ancestors.
    ///
    /// # Errors
    ///
    /// Returns `RecipientError::WouldRemoveLastRootRecipient` if the root
    /// would be left empty, `RecipientError::NoRecipients` if a non-root
    /// scope would be left with nothing to inherit, or
    /// `RecipientError::StillInherited` if the emptied scope would inherit
    /// `id` again. Nothing is written in any of these cases.
    pub fn remove(&self, ctx: &Context, scope: &Scope, id: &str) -> Result<RecipientChange> {
        let id = validate_recipient(id)?;
        let old = self.resolver.resolve_scope(ctx, scope)?;

        if !old.contains(&id) {
            debug!(scope = %scope, id = %id, "recipient not present");
            return Ok(RecipientChange::unchanged(scope.clone(), old));
        }

        let remaining: Vec<RecipientId> = old.iter().filter(|r| **r != id).cloned().collect();
        let new = if remaining.is_empty() {
            let inherited = self.inherited(ctx, scope)?;
            if inherited.contains(&id) {
                return Err(RecipientError::StillInherited {
                    scope: scope.to_string(),
                    id,
                }
                .into());
            }
            inherited
        } else {
            remaining.clone()
        };

        let description = ctx.describe(&format!("Removed Recipient {}", id));
        self.write_manifest(ctx, scope, &remaining, &description)?;

        info!(scope = %scope, id = %id, "removed recipient");
        Ok(RecipientChange {
            scope: scope.clone(),
            old,
            new,
            warnings: Vec::new(),
        })
    }

    /// Write a manifest verbatim.
    ///
    /// Duplicates collapse to their first occurrence. Without `overwrite`,
    /// a manifest already materialized at `scope` is left alone.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::AlreadyExists` when a manifest exists and
    /// `overwrite` is false, or `RecipientError::WouldRemoveLastRootRecipient`
    /// for an empty root list.
    pub fn save(
        &self,
        ctx: &Context,
        scope: &Scope,
        ids: &[RecipientId],
        description: &str,
        overwrite: bool,
    ) -> Result<RecipientChange> {
        let ids = ids
            .iter()
            .map(|id| validate_recipient(id))
            .collect::<Result<Vec<_>>>()?;
        let ids = manifest::dedup(&ids);

        if !overwrite && self.resolver.manifest_exists(ctx, scope)? {
            return Err(ManifestError::AlreadyExists(scope.to_string()).into());
        }
        if ids.is_empty() {
            self.inherited(ctx, scope)?;
        }

        let warnings = self.check_recipients(ctx, &ids)?;
        let old = self.resolver.resolve_scope(ctx, scope)?;
        self.write_manifest(ctx, scope, &ids, description)?;
        let new = self.resolver.resolve_scope(ctx, scope)?;

        info!(scope = %scope, recipients = ids.len(), "saved recipients");
        Ok(RecipientChange {
            scope: scope.clone(),
            old,
            new,
            warnings,
        })
    }

    /// Validate ids against the crypto backend.
    ///
    /// Unrecognized ids are returned as warnings; definitively invalid ids
    /// are an error.
    pub fn check_recipients(
        &self,
        ctx: &Context,
        ids: &[RecipientId],
    ) -> Result<Vec<RecipientError>> {
        let mut warnings = Vec::new();
        for id in ids {
            ctx.check()?;
            if self.crypto.is_invalid_recipient(ctx, id) {
                return Err(RecipientError::Invalid(id.clone()).into());
            }
            if !self.crypto.is_recognized_recipient(ctx, id) {
                warn!(
                    id = %id,
                    backend = self.crypto.name(),
                    "recipient not recognized by crypto backend"
                );
                warnings.push(RecipientError::NotRecognized(id.clone()));
            }
        }
        Ok(warnings)
    }

    /// The set `scope` falls back to once its own manifest is empty.
    ///
    /// The root has nothing to fall back to, and a non-root scope must
    /// inherit at least one recipient.
    fn inherited(&self, ctx: &Context, scope: &Scope) -> Result<Vec<RecipientId>> {
        let Some(parent) = scope.parent() else {
            return Err(RecipientError::WouldRemoveLastRootRecipient.into());
        };
        let inherited = self.resolver.resolve_scope(ctx, &parent)?;
        if inherited.is_empty() {
            return Err(RecipientError::NoRecipients(scope.to_string()).into());
        }
        Ok(inherited)
    }

    /// Encode, write and record the manifest of `scope`.
    fn write_manifest(
        &self,
        ctx: &Context,
        scope: &Scope,
        ids: &[RecipientId],
        description: &str,
    ) -> Result<()> {
        ctx.check()?;
        let path = scope.manifest_path();
        let failed = |source: StorageError| match source {
            StorageError::Cancelled => ctx.interrupted(),
            source => ManifestError::WriteFailed {
                scope: scope.to_string(),
                source,
            }
            .into(),
        };

        self.storage
            .write_file(ctx, &path, &manifest::encode(ids))
            .map_err(failed)?;
        self.storage
            .record_change(ctx, std::slice::from_ref(&path), description)
            .map_err(failed)?;

        debug!(path = %path, recipients = ids.len(), "wrote manifest");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cipher::MockCrypto;
    use crate::core::storage::MemoryStorage;
    use crate::error::Error;

    fn ids(list: &[&str]) -> Vec<RecipientId> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn sub(dir: &str) -> Scope {
        Scope::new(dir).unwrap()
    }

    #[test]
    fn test_add_appends_and_records() {
        let storage = MemoryStorage::new().with_file(".gpg-id", "A\n");
        let crypto = MockCrypto::new();
        let mutator = Mutator::new(&storage, &crypto, "gpg");

        let change = mutator
            .add(&Context::background(), &Scope::root(), "B")
            .unwrap();

        assert_eq!(change.old, ids(&["A"]));
        assert_eq!(change.new, ids(&["A", "B"]));
        assert_eq!(storage.contents(".gpg-id").unwrap(), b"A\nB\n");
        assert_eq!(storage.changes().len(), 1);
        assert_eq!(storage.changes()[0].description, "Added Recipient B");
    }

    #[test]
    fn test_add_existing_is_noop() {
        let storage = MemoryStorage::new().with_file(".gpg-id", "A\n");
        let crypto = MockCrypto::new();
        let mutator = Mutator::new(&storage, &crypto, "gpg");

        let change = mutator
            .add(&Context::background(), &Scope::root(), " A ")
            .unwrap();

        assert!(change.is_noop());
        assert!(storage.changes().is_empty());
    }

    #[test]
    fn test_add_materializes_subscope() {
        let storage = MemoryStorage::new().with_file(".gpg-id", "A\n");
        let crypto = MockCrypto::new();
        let mutator = Mutator::new(&storage, &crypto, "gpg");

        mutator
            .add(&Context::background(), &sub("team"), "B")
            .unwrap();

        assert_eq!(storage.contents("team/.gpg-id").unwrap(), b"A\nB\n");
        assert_eq!(storage.contents(".gpg-id").unwrap(), b"A\n");
    }

    #[test]
    fn test_add_unrecognized_warns_but_writes() {
        let storage = MemoryStorage::new().with_file(".gpg-id", "A\n");
        let crypto = MockCrypto::new().recognizing(["A"]);
        let mutator = Mutator::new(&storage, &crypto, "gpg");

        let change = mutator
            .add(&Context::background(), &Scope::root(), "B")
            .unwrap();

        assert_eq!(
            change.warnings,
            vec![RecipientError::NotRecognized("B".to_string())]
        );
        assert_eq!(storage.contents(".gpg-id").unwrap(), b"A\nB\n");
    }

    #[test]
    fn test_add_invalid_is_rejected_before_write() {
        let storage = MemoryStorage::new().with_file(".gpg-id", "A\n");
        let crypto = MockCrypto::new().rejecting(["Z"]);
        let mutator = Mutator::new(&storage, &crypto, "gpg");

        let err = mutator
            .add(&Context::background(), &Scope::root(), "Z")
            .unwrap_err();

        assert!(matches!(err, Error::Recipient(RecipientError::Invalid(_))));
        assert_eq!(storage.contents(".gpg-id").unwrap(), b"A\n");
    }

    #[test]
    fn test_remove_last_root_recipient_fails() {
        let storage = MemoryStorage::new().with_file(".gpg-id", "A\n");
        let crypto = MockCrypto::new();
        let mutator = Mutator::new(&storage, &crypto, "gpg");

        let err = mutator
            .remove(&Context::background(), &Scope::root(), "A")
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Recipient(RecipientError::WouldRemoveLastRootRecipient)
        ));
        assert_eq!(storage.contents(".gpg-id").unwrap(), b"A\n");
        assert!(storage.changes().is_empty());
    }

    #[test]
    fn test_remove_emptying_subscope_reverts_to_inheritance() {
        let storage = MemoryStorage::new()
            .with_file(".gpg-id", "A\n")
            .with_file("team/.gpg-id", "B\n");
        let crypto = MockCrypto::new();
        let mutator = Mutator::new(&storage, &crypto, "gpg");

        let change = mutator
            .remove(&Context::background(), &sub("team"), "B")
            .unwrap();

        assert_eq!(change.new, ids(&["A"]));
        assert_eq!(storage.contents("team/.gpg-id").unwrap(), b"");
    }

    #[test]
    fn test_remove_refuses_id_the_parent_grants_again() {
        let storage = MemoryStorage::new()
            .with_file(".gpg-id", "A\nB\n")
            .with_file("team/.gpg-id", "B\n");
        let crypto = MockCrypto::new();
        let mutator = Mutator::new(&storage, &crypto, "gpg");

        let err = mutator
            .remove(&Context::background(), &sub("team"), "B")
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Recipient(RecipientError::StillInherited { ref scope, ref id })
                if scope == "team" && id == "B"
        ));
        assert_eq!(storage.contents("team/.gpg-id").unwrap(), b"B\n");
        assert!(storage.changes().is_empty());
    }

    #[test]
    fn test_remove_inherited_only_id_writes_nothing() {
        let storage = MemoryStorage::new().with_file(".gpg-id", "A\n");
        let crypto = MockCrypto::new();
        let mutator = Mutator::new(&storage, &crypto, "gpg");

        let err = mutator
            .remove(&Context::background(), &sub("team"), "A")
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Recipient(RecipientError::StillInherited { .. })
        ));
        assert!(storage.contents("team/.gpg-id").is_none());
        assert!(storage.changes().is_empty());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let storage = MemoryStorage::new().with_file(".gpg-id", "A\nB\n");
        let crypto = MockCrypto::new();
        let mutator = Mutator::new(&storage, &crypto, "gpg");

        let change = mutator
            .remove(&Context::background(), &Scope::root(), "C")
            .unwrap();

        assert!(change.is_noop());
        assert!(storage.changes().is_empty());
    }

    #[test]
    fn test_save_without_overwrite_keeps_existing() {
        let storage = MemoryStorage::new().with_file(".gpg-id", "A\n");
        let crypto = MockCrypto::new();
        let mutator = Mutator::new(&storage, &crypto, "gpg");

        let err = mutator
            .save(&Context::background(), &Scope::root(), &ids(&["B"]), "save", false)
            .unwrap_err();

        assert!(matches!(err, Error::Manifest(ManifestError::AlreadyExists(_))));
        assert_eq!(storage.contents(".gpg-id").unwrap(), b"A\n");
    }

    #[test]
    fn test_save_dedups_and_overwrites() {
        let storage = MemoryStorage::new().with_file(".gpg-id", "A\n");
        let crypto = MockCrypto::new();
        let mutator = Mutator::new(&storage, &crypto, "gpg");

        let change = mutator
            .save(
                &Context::background(),
                &Scope::root(),
                &ids(&["B", "C", "B"]),
                "Save Recipients",
                true,
            )
            .unwrap();

        assert_eq!(change.new, ids(&["B", "C"]));
        assert_eq!(storage.contents(".gpg-id").unwrap(), b"B\nC\n");
        assert_eq!(storage.changes()[0].paths, vec![".gpg-id".to_string()]);
    }

    #[test]
    fn test_save_empty_root_fails() {
        let storage = MemoryStorage::new();
        let crypto = MockCrypto::new();
        let mutator = Mutator::new(&storage, &crypto, "gpg");

        let err = mutator
            .save(&Context::background(), &Scope::root(), &[], "save", true)
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Recipient(RecipientError::WouldRemoveLastRootRecipient)
        ));
        assert!(storage.paths().is_empty());
    }

    #[test]
    fn test_write_failure_is_attributed_to_scope() {
        let storage = MemoryStorage::new().with_file(".gpg-id", "A\n");
        storage.fail_writes_to("team/.gpg-id");
        let crypto = MockCrypto::new();
        let mutator = Mutator::new(&storage, &crypto, "gpg");

        let err = mutator
            .add(&Context::background(), &sub("team"), "B")
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Manifest(ManifestError::WriteFailed { ref scope, .. }) if scope == "team"
        ));
    }
}
