//! Input validation for keyscope operations.
//!
//! Validates recipient ids and store-relative paths before they reach a
//! manifest or the storage backend.

use crate::core::types::RecipientId;
use crate::error::{Result, ValidationError};

/// Validate a recipient id and return its trimmed form.
///
/// Recipient ids are opaque to keyscope, but they must survive a round trip
/// through the line-based manifest format:
/// - Cannot be empty after trimming
/// - Cannot contain line breaks
/// - Cannot start with `#` (it would be read back as a comment)
///
/// # Errors
///
/// Returns `ValidationError` if the id is invalid.
pub fn validate_recipient(id: &str) -> Result<RecipientId> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyRecipient.into());
    }

    if trimmed.contains(['\n', '\r']) {
        return Err(ValidationError::InvalidRecipient {
            id: trimmed.to_string(),
            reason: "cannot contain line breaks".to_string(),
        }
        .into());
    }

    if trimmed.starts_with('#') {
        return Err(ValidationError::InvalidRecipient {
            id: trimmed.to_string(),
            reason: "cannot start with '#'".to_string(),
        }
        .into());
    }

    Ok(trimmed.to_string())
}

/// Normalize a store-relative path.
///
/// Empty components and `.` are dropped, so `"/foo//bar/"` becomes
/// `"foo/bar"` and `""` stays the root.
///
/// # Errors
///
/// Returns `ValidationError::InvalidPath` for `..` components or backslashes.
pub fn normalize_path(path: &str) -> Result<String> {
    if path.contains('\\') {
        return Err(invalid_path(path, "backslashes are not allowed"));
    }

    let mut parts = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => continue,
            ".." => return Err(invalid_path(path, "'..' components are not allowed")),
            other => parts.push(other),
        }
    }

    Ok(parts.join("/"))
}

fn invalid_path(path: &str, reason: &str) -> crate::error::Error {
    ValidationError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    }
    .into()
}
