//! Command-line interface.

pub mod completions;
pub mod output;
pub mod recipients;
pub mod reencrypt;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::core::config::{self, Config};
use crate::core::context::Context;
use crate::core::store::Store;
use crate::error::Result;

/// keyscope - Manage who can decrypt each corner of a GPG secret store.
#[derive(Parser)]
#[command(
    name = "keyscope",
    about = "Manage who can decrypt each corner of a GPG secret store",
    version
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Store root directory (default: ~/.keyscope/store)
    #[arg(long, global = true, env = "KEYSCOPE_STORE")]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Manage recipients
    Recipients {
        #[command(subcommand)]
        action: RecipientsAction,
    },

    /// Re-encrypt the secrets of a scope for its current recipients
    Reencrypt {
        /// Scope directory (default: store root)
        #[arg(default_value = "")]
        scope: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Recipient subcommands.
#[derive(Subcommand)]
pub enum RecipientsAction {
    /// List every recipient of any secret in the store
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the recipients of a secret, or of every scope
    Show {
        /// Secret path (omit to show every scope with its own recipients)
        path: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a recipient and re-encrypt the affected secrets
    Add {
        /// Recipient id (key fingerprint, email, or age public key)
        id: String,
        /// Scope directory (default: store root)
        #[arg(short, long, default_value = "")]
        scope: String,
    },

    /// Remove a recipient and re-encrypt the affected secrets
    Rm {
        /// Recipient id
        id: String,
        /// Scope directory (default: store root)
        #[arg(short, long, default_value = "")]
        scope: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Rewrite the root recipient list and record it
    Save,
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Execute a command.
///
/// # Errors
///
/// Returns error if the store cannot be opened or the command fails.
pub fn execute(command: Command, store: Option<PathBuf>) -> Result<()> {
    if let Command::Completions { shell } = command {
        return completions::execute(shell);
    }

    let store = open_store(store)?;
    let ctx = Context::background().with_new_correlation();
    debug!(correlation = ctx.correlation(), "executing command");

    match command {
        Command::Recipients { action } => match action {
            RecipientsAction::List { json } => recipients::list(&store, &ctx, json),
            RecipientsAction::Show { path, json } => {
                recipients::show(&store, &ctx, path.as_deref(), json)
            }
            RecipientsAction::Add { id, scope } => recipients::add(&store, &ctx, &scope, &id),
            RecipientsAction::Rm { id, scope, yes } => {
                recipients::rm(&store, &ctx, &scope, &id, yes)
            }
            RecipientsAction::Save => recipients::save(&store, &ctx),
        },
        Command::Reencrypt { scope, json } => reencrypt::execute(&store, &ctx, &scope, json),
        Command::Completions { .. } => Ok(()),
    }
}

/// Open the store at `root`, or the default root.
fn open_store(root: Option<PathBuf>) -> Result<Store> {
    let root = match root {
        Some(root) => root,
        None => config::default_root()?,
    };
    let config = Config::load(&root)?;
    Store::open(&root, &config)
}
