//! Recipient management commands.
//!
//! List, show, add, remove, and save recipients.

mod add;
mod list;
mod rm;
mod save;
mod show;

pub use add::execute as add;
pub use list::execute as list;
pub use rm::execute as rm;
pub use save::execute as save;
pub use show::execute as show;

use crate::cli::output;
use crate::core::domain::RecipientChange;

/// Print the non-fatal findings of a mutation.
fn print_warnings(change: &RecipientChange) {
    for warning in &change.warnings {
        output::warn(&warning.to_string());
    }
}
