//! Recipients save command.

use crate::cli::output;
use crate::core::context::Context;
use crate::core::store::Store;
use crate::error::Result;

/// Rewrite the root manifest in canonical form and record it.
pub fn execute(store: &Store, ctx: &Context) -> Result<()> {
    let change = store.save_recipients(ctx)?;
    super::print_warnings(&change);
    output::success(&format!(
        "saved {} root recipients",
        output::count(change.new.len())
    ));
    Ok(())
}
