//! Type aliases for domain concepts.
//!
//! Provides semantic type aliases to make function signatures more descriptive.

/// A recipient identifier (GPG fingerprint, key id, email, or age public key).
///
/// Compared as exact strings after trimming surrounding whitespace.
pub type RecipientId = String;

/// A slash-separated secret name relative to the store root, without extension.
pub type SecretPath = String;

/// A message recorded alongside a change in versioned storage.
pub type ChangeDescription = String;
