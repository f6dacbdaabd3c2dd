//! Recipient set changes.

use serde::Serialize;

use crate::core::domain::{ReencryptReport, Scope};
use crate::core::types::RecipientId;
use crate::error::RecipientError;

/// The effect of a manifest mutation on one scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientChange {
    pub scope: Scope,
    /// Effective recipients before the write.
    pub old: Vec<RecipientId>,
    /// Effective recipients after the write.
    pub new: Vec<RecipientId>,
    /// Non-fatal validation findings, e.g. ids the backend does not know.
    pub warnings: Vec<RecipientError>,
}

impl RecipientChange {
    /// A change that left the effective set as it was.
    pub fn unchanged(scope: Scope, current: Vec<RecipientId>) -> Self {
        Self {
            scope,
            old: current.clone(),
            new: current,
            warnings: Vec::new(),
        }
    }

    /// Whether the effective recipient set is the same before and after.
    pub fn is_noop(&self) -> bool {
        same_set(&self.old, &self.new)
    }
}

/// A mutation together with the re-encryption it triggered.
#[derive(Debug, Clone)]
pub struct RecipientUpdate {
    pub change: RecipientChange,
    pub report: ReencryptReport,
}

/// A secret found while walking the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecretEntry {
    pub path: String,
    /// Scope whose manifest applies to this secret.
    pub scope: Scope,
    pub recipients: Vec<RecipientId>,
}

/// A scope with its own materialized manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeEntry {
    pub scope: Scope,
    pub recipients: Vec<RecipientId>,
}

/// Order-insensitive comparison of two recipient lists.
pub fn same_set(a: &[RecipientId], b: &[RecipientId]) -> bool {
    let a: std::collections::BTreeSet<&str> = a.iter().map(String::as_str).collect();
    let b: std::collections::BTreeSet<&str> = b.iter().map(String::as_str).collect();
    a == b
}
