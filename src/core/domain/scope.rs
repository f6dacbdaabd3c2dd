//! Recipient scopes.
//!
//! A scope is a directory of the store tree that may carry its own
//! recipient manifest.

use std::fmt;

use serde::Serialize;

use crate::core::constants;
use crate::core::validation::normalize_path;
use crate::error::Result;

/// A directory within the store tree, identified by its normalized path.
///
/// The root scope is the empty path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Scope(String);

impl Scope {
    /// The store root.
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Scope for a directory path.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidPath` if the path escapes the store.
    pub fn new(dir: &str) -> Result<Self> {
        Ok(Self(normalize_path(dir)?))
    }

    /// Scope of the directory containing a secret.
    ///
    /// `"foo/bar/baz"` lives in `"foo/bar"`; a top-level secret and the
    /// empty path both map to the root.
    pub fn of_secret(path: &str) -> Result<Self> {
        let normalized = normalize_path(path)?;
        Ok(match normalized.rsplit_once('/') {
            Some((dir, _)) => Self(dir.to_string()),
            None => Self::root(),
        })
    }

    /// Whether this is the store root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The normalized directory path (`""` for the root).
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The enclosing scope, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        Some(match self.0.rsplit_once('/') {
            Some((dir, _)) => Self(dir.to_string()),
            None => Self::root(),
        })
    }

    /// This scope followed by each enclosing scope, ending at the root.
    pub fn ancestors(&self) -> Ancestors {
        Ancestors {
            next: Some(self.clone()),
        }
    }

    /// Whether this scope is `other` or lies beneath it.
    pub fn is_within(&self, other: &Scope) -> bool {
        other.is_root()
            || self.0 == other.0
            || (self.0.starts_with(&other.0) && self.0[other.0.len()..].starts_with('/'))
    }

    /// Storage path of the manifest for this scope.
    pub fn manifest_path(&self) -> String {
        self.join(constants::MANIFEST_FILE)
    }

    /// Storage path of an entry directly inside this scope.
    pub fn join(&self, name: &str) -> String {
        if self.is_root() {
            name.to_string()
        } else {
            format!("{}/{}", self.0, name)
        }
    }

    /// Child scope for a subdirectory name.
    pub fn child(&self, name: &str) -> Self {
        Self(self.join(name))
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "/")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Iterator over a scope and its ancestors, most specific first.
#[derive(Debug, Clone)]
pub struct Ancestors {
    next: Option<Scope>,
}

impl Iterator for Ancestors {
    type Item = Scope;

    fn next(&mut self) -> Option<Scope> {
        let current = self.next.take()?;
        self.next = current.parent();
        Some(current)
    }
}
