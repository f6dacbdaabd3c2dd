//! Recipient operations.
//!
//! Manage who can decrypt the secrets of each scope. Every mutation that
//! changes a scope's effective recipients re-encrypts the secrets it governs.

use tracing::{info, warn};

use super::Store;
use crate::core::context::Context;
use crate::core::domain::{
    RecipientChange, RecipientUpdate, ReencryptReport, Scope, ScopeEntry, SecretEntry,
};
use crate::core::types::RecipientId;
use crate::error::Result;

impl Store {
    /// Effective recipients of a secret path, for display.
    ///
    /// Never fails: resolution errors are logged and yield an empty list.
    pub fn recipients(&self, ctx: &Context, path: &str) -> Vec<RecipientId> {
        match self.get_recipients(ctx, path) {
            Ok(ids) => ids,
            Err(e) => {
                warn!(alias = %self.alias, path, error = %e, "failed to resolve recipients");
                Vec::new()
            }
        }
    }

    /// Effective recipients of a secret path.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::ReadFailed` if a manifest on the way cannot be read.
    pub fn get_recipients(&self, ctx: &Context, path: &str) -> Result<Vec<RecipientId>> {
        self.resolver().resolve(ctx, path)
    }

    /// Every recipient of any secret in the store, sorted.
    pub fn list_recipients(&self, ctx: &Context) -> Result<Vec<RecipientId>> {
        self.resolver().resolve_all(ctx)
    }

    /// Scopes with their own manifest.
    pub fn scopes(&self, ctx: &Context) -> Result<Vec<ScopeEntry>> {
        self.resolver().scopes(ctx)
    }

    /// Secrets below a scope with the recipients that apply to each.
    pub fn secrets(&self, ctx: &Context, scope: &Scope) -> Result<Vec<SecretEntry>> {
        self.resolver().secrets_under(ctx, scope)
    }

    /// Add a recipient at the root scope and re-encrypt.
    ///
    /// # Errors
    ///
    /// Returns error if the id is rejected, the manifest cannot be written,
    /// or any secret fails to re-encrypt.
    pub fn add_recipient(&self, ctx: &Context, id: &str) -> Result<RecipientUpdate> {
        self.add_recipient_at(ctx, &Scope::root(), id)
    }

    /// Add a recipient at `scope` and re-encrypt the secrets it governs.
    pub fn add_recipient_at(
        &self,
        ctx: &Context,
        scope: &Scope,
        id: &str,
    ) -> Result<RecipientUpdate> {
        let change = self.mutator().add(ctx, scope, id)?;
        self.apply(ctx, change)
    }

    /// Remove a recipient from the root scope and re-encrypt.
    ///
    /// # Errors
    ///
    /// Returns `RecipientError::WouldRemoveLastRootRecipient` if it is the
    /// last root recipient; nothing is written in that case.
    pub fn remove_recipient(&self, ctx: &Context, id: &str) -> Result<RecipientUpdate> {
        self.remove_recipient_at(ctx, &Scope::root(), id)
    }

    /// Remove a recipient from `scope` and re-encrypt the secrets it governs.
    pub fn remove_recipient_at(
        &self,
        ctx: &Context,
        scope: &Scope,
        id: &str,
    ) -> Result<RecipientUpdate> {
        let change = self.mutator().remove(ctx, scope, id)?;
        self.apply(ctx, change)
    }

    /// Persist the current root recipient list unconditionally.
    ///
    /// # Errors
    ///
    /// Returns `RecipientError::WouldRemoveLastRootRecipient` if the root
    /// has no recipients to save.
    pub fn save_recipients(&self, ctx: &Context) -> Result<RecipientChange> {
        let root = Scope::root();
        let ids = self
            .resolver()
            .read_manifest(ctx, &root)?
            .unwrap_or_default();
        self.mutator()
            .save(ctx, &root, &ids, &ctx.describe("Save Recipients"), true)
    }

    /// Re-encrypt the secrets of `scope` for its current recipients.
    ///
    /// Used to finish the job after a partial failure. A ciphertext does not
    /// reveal which recipients it targets, so every secret the scope governs
    /// is rewritten, including those that were already up to date. The run
    /// records one change touching every rewritten file.
    pub fn reencrypt(&self, ctx: &Context, scope: &Scope) -> Result<ReencryptReport> {
        let current = self.resolver().resolve_scope(ctx, scope)?;
        self.reencryptor().run(ctx, scope, &current)
    }

    fn apply(&self, ctx: &Context, change: RecipientChange) -> Result<RecipientUpdate> {
        if change.is_noop() {
            return Ok(RecipientUpdate {
                report: ReencryptReport::new(change.scope.clone()),
                change,
            });
        }

        let report = self
            .reencryptor()
            .reencrypt(ctx, &change.scope, &change.old, &change.new)?;
        info!(
            alias = %self.alias,
            scope = %change.scope,
            secrets = report.succeeded.len(),
            "recipients updated"
        );
        Ok(RecipientUpdate { change, report })
    }
}
