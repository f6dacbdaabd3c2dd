//! Recipients remove command.

use std::io::{self, IsTerminal};

use dialoguer::Confirm;
use tracing::info;

use crate::cli::{output, reencrypt};
use crate::core::context::Context;
use crate::core::domain::Scope;
use crate::core::store::Store;
use crate::error::Result;

/// Remove a recipient from a scope and re-encrypt its secrets.
///
/// Asks for confirmation on a terminal unless `yes` is set.
pub fn execute(store: &Store, ctx: &Context, scope: &str, id: &str, yes: bool) -> Result<()> {
    let scope = Scope::new(scope)?;

    if !yes && io::stdin().is_terminal() {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Remove {} from {} and re-encrypt its secrets?",
                id, scope
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            output::dimmed("aborted");
            return Ok(());
        }
    }

    info!(scope = %scope, id, "removing recipient");
    let update = store
        .remove_recipient_at(ctx, &scope, id)
        .map_err(reencrypt::report_failure)?;

    if update.change.is_noop() {
        output::dimmed(&format!("{} is not a recipient of {}", id, scope));
        return Ok(());
    }

    output::success(&format!(
        "removed {} from {}",
        output::id(id),
        output::scope(&scope)
    ));
    reencrypt::print_report(&update.report);
    Ok(())
}
