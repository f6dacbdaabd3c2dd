//! Re-encryption of secrets after a recipient change.
//!
//! Each affected secret is read, decrypted, encrypted for the new recipient
//! set and written back. A secret is replaced only if its ciphertext is
//! byte-identical to what was decrypted, so every secret ends up either fully
//! re-encrypted or untouched. Failures are attributed to their path and never
//! stop the remaining secrets.

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::core::cipher::Crypto;
use crate::core::context::Context;
use crate::core::domain::{same_set, FailureReason, ReencryptReport, Scope, SecretFailure};
use crate::core::resolver::Resolver;
use crate::core::storage::Storage;
use crate::core::types::RecipientId;
use crate::error::{CipherError, ReencryptError, RecipientError, Result, StorageError};

/// Re-encrypts the secrets of one store.
pub struct Reencryptor<'a> {
    storage: &'a dyn Storage,
    crypto: &'a dyn Crypto,
    resolver: Resolver<'a>,
}

/// How processing of a single secret ended, short of success.
enum Outcome {
    Failed(FailureReason),
    Interrupted,
}

impl From<StorageError> for Outcome {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Cancelled => Self::Interrupted,
            other => Self::Failed(FailureReason::ReadFailed(other.to_string())),
        }
    }
}

impl<'a> Reencryptor<'a> {
    pub fn new(storage: &'a dyn Storage, crypto: &'a dyn Crypto, secret_extension: &'a str) -> Self {
        Self {
            storage,
            crypto,
            resolver: Resolver::new(storage, secret_extension),
        }
    }

    /// Re-encrypt the secrets governed by `scope` after its recipients moved
    /// from `old` to `new`.
    ///
    /// Equal sets are a no-op with an empty report.
    ///
    /// # Errors
    ///
    /// Returns `RecipientError::NoRecipients` if `new` is empty, before any
    /// secret is touched. Returns `ReencryptError::PartialFailure` carrying
    /// the full report if any secret failed or was not processed.
    pub fn reencrypt(
        &self,
        ctx: &Context,
        scope: &Scope,
        old: &[RecipientId],
        new: &[RecipientId],
    ) -> Result<ReencryptReport> {
        if new.is_empty() {
            return Err(RecipientError::NoRecipients(scope.to_string()).into());
        }
        if same_set(old, new) {
            debug!(scope = %scope, "recipients unchanged, nothing to re-encrypt");
            return Ok(ReencryptReport::new(scope.clone()));
        }
        self.run(ctx, scope, new)
    }

    /// Re-encrypt every secret governed by `scope` for `new`, unconditionally.
    ///
    /// Running it again with the same set is safe and leaves plaintexts as
    /// they were.
    pub fn run(&self, ctx: &Context, scope: &Scope, new: &[RecipientId]) -> Result<ReencryptReport> {
        if new.is_empty() {
            return Err(RecipientError::NoRecipients(scope.to_string()).into());
        }

        // Listed with a detached context so a cancelled run still names every target.
        let targets: Vec<String> = self
            .resolver
            .secrets_under(&ctx.detached(), scope)?
            .into_iter()
            .filter(|entry| scope.is_within(&entry.scope))
            .map(|entry| entry.path)
            .collect();

        info!(
            scope = %scope,
            secrets = targets.len(),
            recipients = new.len(),
            "re-encrypting secrets"
        );

        let mut report = ReencryptReport::new(scope.clone());
        let mut written = Vec::new();
        for path in targets {
            if ctx.is_done() {
                report.not_processed.push(path);
                continue;
            }

            let file = self.resolver.secret_file(&path);
            match self.reencrypt_one(ctx, &file, new) {
                Ok(()) => {
                    debug!(path = %path, "re-encrypted");
                    written.push(file);
                    report.succeeded.push(path);
                }
                Err(Outcome::Interrupted) => report.not_processed.push(path),
                Err(Outcome::Failed(reason)) => {
                    warn!(path = %path, reason = %reason, "failed to re-encrypt secret");
                    report.failed.push(SecretFailure { path, reason });
                }
            }
        }

        if !written.is_empty() {
            let description = ctx.describe(&format!(
                "Re-encrypted {} secrets of {} for {} recipients",
                written.len(),
                scope,
                new.len()
            ));
            // Files already replaced on disk are recorded even after cancellation.
            if let Err(source) = self
                .storage
                .record_change(&ctx.detached(), &written, &description)
            {
                return Err(ReencryptError::RecordFailed {
                    report: Box::new(report),
                    source,
                }
                .into());
            }
        }

        if !report.is_complete() {
            warn!(
                scope = %scope,
                succeeded = report.succeeded.len(),
                failed = report.failed.len(),
                not_processed = report.not_processed.len(),
                "re-encryption incomplete"
            );
            return Err(ReencryptError::PartialFailure(Box::new(report)).into());
        }

        info!(scope = %scope, secrets = report.succeeded.len(), "re-encryption complete");
        Ok(report)
    }

    fn reencrypt_one(
        &self,
        ctx: &Context,
        file: &str,
        new: &[RecipientId],
    ) -> std::result::Result<(), Outcome> {
        let ciphertext = self.storage.read_file(ctx, file)?;
        let digest = Sha256::digest(&ciphertext);

        let plaintext = Zeroizing::new(
            self.crypto
                .decrypt(ctx, &ciphertext)
                .map_err(|e| cipher_outcome(e, FailureReason::DecryptionFailed))?,
        );
        let reencrypted = self
            .crypto
            .encrypt(ctx, &plaintext, new)
            .map_err(|e| cipher_outcome(e, FailureReason::EncryptionFailed))?;

        let current = self.storage.read_file(ctx, file)?;
        if Sha256::digest(&current) != digest {
            return Err(Outcome::Failed(FailureReason::Modified));
        }

        self.storage
            .write_file(ctx, file, &reencrypted)
            .map_err(|e| match e {
                StorageError::Cancelled => Outcome::Interrupted,
                other => Outcome::Failed(FailureReason::WriteFailed(other.to_string())),
            })
    }
}

fn cipher_outcome(err: CipherError, reason: fn(String) -> FailureReason) -> Outcome {
    match err {
        CipherError::Cancelled => Outcome::Interrupted,
        CipherError::EncryptionFailed(msg)
        | CipherError::DecryptionFailed(msg)
        | CipherError::BackendUnavailable(msg) => Outcome::Failed(reason(msg)),
    }
}
