use thiserror::Error;

use crate::core::domain::ReencryptReport;

/// Top-level error type for keyscope.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Recipient(#[from] RecipientError),

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Reencrypt(#[from] ReencryptError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("operation cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),
}

/// Failures reading or writing a recipient manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("failed to read recipients of {scope}: {source}")]
    ReadFailed {
        scope: String,
        #[source]
        source: StorageError,
    },

    #[error("failed to write recipients of {scope}: {source}")]
    WriteFailed {
        scope: String,
        #[source]
        source: StorageError,
    },

    #[error("recipients already defined for {0} (use overwrite to replace them)")]
    AlreadyExists(String),
}

/// Recipient validation and safety errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecipientError {
    /// Not fatal on its own; surfaced as a warning next to a successful write.
    #[error("recipient not recognized by the crypto backend: {0}")]
    NotRecognized(String),

    #[error("recipient rejected by the crypto backend: {0}")]
    Invalid(String),

    #[error("refusing to leave the root scope without recipients")]
    WouldRemoveLastRootRecipient,

    #[error("no recipients resolved for {0}")]
    NoRecipients(String),

    /// The id would come back through inheritance once the scope is emptied.
    #[error("{id} would still be inherited by {scope} from a parent scope")]
    StillInherited { scope: String, id: String },
}

/// Crypto backend errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("crypto backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("crypto operation cancelled")]
    Cancelled,
}

/// Versioned storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("version control error: {0}")]
    Vcs(String),

    #[error("storage operation cancelled")]
    Cancelled,
}

impl StorageError {
    pub(crate) fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::NotFound(path.into());
        }
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Re-encryption outcome errors.
#[derive(Error, Debug)]
pub enum ReencryptError {
    #[error(
        "re-encryption incomplete: {} re-encrypted, {} failed, {} not processed",
        .0.succeeded.len(),
        .0.failed.len(),
        .0.not_processed.len()
    )]
    PartialFailure(Box<ReencryptReport>),

    #[error("re-encrypted {} secrets but failed to record the change: {source}", .report.succeeded.len())]
    RecordFailed {
        report: Box<ReencryptReport>,
        #[source]
        source: StorageError,
    },
}

impl ReencryptError {
    /// The per-secret account carried by this error.
    pub fn report(&self) -> &ReencryptReport {
        match self {
            Self::PartialFailure(report) => report,
            Self::RecordFailed { report, .. } => report,
        }
    }
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("unknown crypto backend: {0} (supported: gpg, age)")]
    UnknownCrypto(String),

    #[error("invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("unable to determine home directory")]
    NoHomeDir,
}

/// Input validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("recipient id cannot be empty")]
    EmptyRecipient,

    #[error("invalid recipient id '{id}': {reason}")]
    InvalidRecipient { id: String, reason: String },

    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
