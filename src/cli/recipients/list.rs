//! Recipients list command.

use crate::cli::output;
use crate::core::context::Context;
use crate::core::store::Store;
use crate::error::Result;

/// List every recipient of any secret in the store.
pub fn execute(store: &Store, ctx: &Context, json: bool) -> Result<()> {
    let recipients = store.list_recipients(ctx)?;

    if json {
        let result = serde_json::json!({
            "store": store.alias(),
            "recipients": recipients,
            "count": recipients.len(),
        });
        output::data(&serde_json::to_string_pretty(&result)?);
    } else if recipients.is_empty() {
        output::dimmed("no recipients");
    } else {
        output::header(&format!("{} recipients", output::count(recipients.len())));
        output::rule();
        for id in &recipients {
            output::list_item(output::id(id));
        }
    }

    Ok(())
}
