//! Domain types.

mod change;
mod report;
mod scope;

pub use change::{same_set, RecipientChange, RecipientUpdate, ScopeEntry, SecretEntry};
pub use report::{FailureReason, ReencryptReport, SecretFailure};
pub use scope::{Ancestors, Scope};
