//! Re-encryption report.
//!
//! A complete per-secret account of one re-encryption pass, so an operator
//! can see exactly which secrets now target the new recipients.

use serde::Serialize;

use crate::core::domain::Scope;
use crate::core::types::SecretPath;

/// Why a single secret could not be re-encrypted.
///
/// The secret's original ciphertext is left untouched in every case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum FailureReason {
    ReadFailed(String),
    DecryptionFailed(String),
    EncryptionFailed(String),
    /// The ciphertext changed on disk while it was being re-encrypted.
    Modified,
    WriteFailed(String),
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadFailed(msg) => write!(f, "read failed: {}", msg),
            Self::DecryptionFailed(msg) => write!(f, "decryption failed: {}", msg),
            Self::EncryptionFailed(msg) => write!(f, "encryption failed: {}", msg),
            Self::Modified => write!(f, "modified concurrently"),
            Self::WriteFailed(msg) => write!(f, "write failed: {}", msg),
        }
    }
}

/// A secret that failed to re-encrypt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecretFailure {
    pub path: SecretPath,
    pub reason: FailureReason,
}

/// Outcome of re-encrypting the secrets governed by one scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReencryptReport {
    pub scope: Scope,
    /// Secrets now encrypted for the new recipient set.
    pub succeeded: Vec<SecretPath>,
    /// Secrets left untouched because of an error.
    pub failed: Vec<SecretFailure>,
    /// Secrets skipped after cancellation.
    pub not_processed: Vec<SecretPath>,
}

impl ReencryptReport {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            ..Self::default()
        }
    }

    /// Every targeted secret was re-encrypted.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.not_processed.is_empty()
    }

    /// Number of secrets this pass targeted.
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len() + self.not_processed.len()
    }
}
