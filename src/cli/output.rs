//! Shared CLI output helpers.
//!
//! Color scheme (disabled by `NO_COLOR` or a non-terminal stdout):
//! - Green: success
//! - Red: errors and failed secrets
//! - Yellow: warnings
//! - Cyan: recipient ids, scopes, hints
//! - Dim: secondary info

use std::fmt::Display;

use console::style;

const RULE_WIDTH: usize = 56;

/// Apply `NO_COLOR` before anything is printed.
pub fn init() {
    if std::env::var_os("NO_COLOR").is_some() {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }
}

/// `✓ msg`
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green(), msg);
}

/// `✗ msg` on stderr.
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red().for_stderr(), msg);
}

/// `⚠ msg` on stderr.
pub fn warn(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow().for_stderr(), msg);
}

/// `→ msg` on stderr.
pub fn hint(msg: &str) {
    eprintln!(
        "{} {}",
        style("→").cyan().for_stderr(),
        style(msg).cyan().for_stderr()
    );
}

pub fn header(title: &str) {
    println!("{}", style(title).bold());
}

/// Label dimmed, value bold.
pub fn kv(label: &str, value: impl Display) {
    println!("  {}  {}", style(label).dim(), style(value).bold());
}

pub fn list_item(item: impl Display) {
    println!("  • {}", item);
}

pub fn rule() {
    println!("{}", style("─".repeat(RULE_WIDTH)).dim());
}

pub fn dimmed(msg: &str) {
    println!("{}", style(msg).dim());
}

pub fn blank() {
    println!();
}

/// Raw machine-readable output.
pub fn data(text: &str) {
    println!("{}", text);
}

/// A recipient id, inline.
pub fn id(id: &str) -> String {
    style(id).cyan().to_string()
}

/// A scope, inline.
pub fn scope(scope: impl Display) -> String {
    style(scope).cyan().to_string()
}

/// A bold count, inline.
pub fn count(n: usize) -> String {
    style(n).bold().to_string()
}
