//! Re-encrypt command.
//!
//! Finishes an interrupted or partially failed recipient change by
//! re-encrypting a scope for its current recipients.

use crate::cli::output;
use crate::core::context::Context;
use crate::core::domain::{ReencryptReport, Scope};
use crate::core::store::Store;
use crate::error::{Error, Result};

pub fn execute(store: &Store, ctx: &Context, scope: &str, json: bool) -> Result<()> {
    let scope = Scope::new(scope)?;

    let result = store.reencrypt(ctx, &scope);
    if json {
        let report = match &result {
            Ok(report) => report,
            Err(Error::Reencrypt(e)) => e.report(),
            Err(_) => return result.map(|_| ()),
        };
        output::data(&serde_json::to_string_pretty(report)?);
        return result.map(|_| ());
    }

    let report = result.map_err(report_failure)?;
    print_report(&report);
    Ok(())
}

/// Print the report carried by a failed re-encryption, then hand the error on.
pub fn report_failure(err: Error) -> Error {
    if let Error::Reencrypt(failure) = &err {
        print_report(failure.report());
    }
    err
}

/// Print the per-secret account of a re-encryption pass.
pub fn print_report(report: &ReencryptReport) {
    if report.total() == 0 {
        output::dimmed("no secrets to re-encrypt");
        return;
    }

    output::kv("re-encrypted", report.succeeded.len());
    for failure in &report.failed {
        output::error(&format!("{}: {}", failure.path, failure.reason));
    }
    if !report.not_processed.is_empty() {
        output::warn(&format!(
            "{} secrets not processed:",
            report.not_processed.len()
        ));
        for path in &report.not_processed {
            output::list_item(path);
        }
    }
}
