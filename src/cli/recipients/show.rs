//! Recipients show command.
//!
//! With a path, shows who can decrypt that secret and which scope decides
//! it. Without one, shows every scope that has its own manifest.

use crate::cli::output;
use crate::core::context::Context;
use crate::core::store::Store;
use crate::error::Result;

pub fn execute(store: &Store, ctx: &Context, path: Option<&str>, json: bool) -> Result<()> {
    match path {
        Some(path) => show_path(store, ctx, path, json),
        None => show_scopes(store, ctx, json),
    }
}

fn show_path(store: &Store, ctx: &Context, path: &str, json: bool) -> Result<()> {
    let recipients = store.get_recipients(ctx, path)?;
    let scope = store.resolver().governing_scope(ctx, path)?;

    if json {
        let result = serde_json::json!({
            "path": path,
            "scope": scope,
            "recipients": recipients,
        });
        output::data(&serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    match scope {
        Some(scope) => output::kv("scope", output::scope(&scope)),
        None => {
            output::dimmed("no recipients defined anywhere above this path");
            return Ok(());
        }
    }
    for id in &recipients {
        output::list_item(output::id(id));
    }
    Ok(())
}

fn show_scopes(store: &Store, ctx: &Context, json: bool) -> Result<()> {
    let scopes = store.scopes(ctx)?;

    if json {
        output::data(&serde_json::to_string_pretty(&scopes)?);
        return Ok(());
    }
    if scopes.is_empty() {
        output::dimmed("no recipient manifests");
        return Ok(());
    }

    for (i, entry) in scopes.iter().enumerate() {
        if i > 0 {
            output::blank();
        }
        output::header(&output::scope(&entry.scope));
        if entry.recipients.is_empty() {
            output::dimmed("  (empty, inherits from parent)");
        }
        for id in &entry.recipients {
            output::list_item(output::id(id));
        }
    }
    Ok(())
}
