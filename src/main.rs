//! keyscope - Manage who can decrypt each corner of a GPG secret store.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use keyscope::cli::{execute, output, Cli};
use keyscope::core::constants;
use keyscope::error::{CipherError, Error, ManifestError, RecipientError, StorageError};

fn main() {
    let cli = Cli::parse();
    output::init();

    let filter = EnvFilter::try_from_env(constants::LOG_ENV).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("keyscope=debug")
        } else {
            EnvFilter::new("keyscope=warn")
        }
    });

    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var(constants::LOG_FORMAT_ENV).is_ok_and(|v| v == "json") {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .without_time()
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    if let Err(e) = execute(cli.command, cli.store) {
        let suggestion = match &e {
            Error::Recipient(RecipientError::WouldRemoveLastRootRecipient) => {
                Some("add another root recipient first: keyscope recipients add <ID>")
            }
            Error::Recipient(RecipientError::StillInherited { .. }) => {
                Some("remove it from the parent scope first, or leave another recipient here")
            }
            Error::Manifest(ManifestError::AlreadyExists(_)) => {
                Some("use keyscope recipients add/rm to change an existing manifest")
            }
            Error::Reencrypt(_) => {
                Some("fix the failures above, then run: keyscope reencrypt <SCOPE>")
            }
            Error::Cipher(CipherError::BackendUnavailable(_)) => {
                Some("install GnuPG, or set crypto = \"age\" in .keyscope.toml")
            }
            Error::Storage(StorageError::Vcs(_)) => {
                Some("run git init in the store root, or set storage = \"fs\" in .keyscope.toml")
            }
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
