//! Recipients add command.

use tracing::info;

use crate::cli::{output, reencrypt};
use crate::core::context::Context;
use crate::core::domain::Scope;
use crate::core::store::Store;
use crate::error::Result;

/// Add a recipient at a scope and re-encrypt its secrets.
pub fn execute(store: &Store, ctx: &Context, scope: &str, id: &str) -> Result<()> {
    let scope = Scope::new(scope)?;
    info!(scope = %scope, id, "adding recipient");

    let update = store
        .add_recipient_at(ctx, &scope, id)
        .map_err(reencrypt::report_failure)?;
    super::print_warnings(&update.change);

    if update.change.is_noop() {
        output::dimmed(&format!("{} already a recipient of {}", id, scope));
        return Ok(());
    }

    output::success(&format!(
        "added {} to {}",
        output::id(id),
        output::scope(&scope)
    ));
    reencrypt::print_report(&update.report);
    Ok(())
}
