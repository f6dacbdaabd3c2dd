//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

impl Test {
    /// Create a keyscope command bound to this store.
    ///
    /// Returns a Command configured with:
    /// - HOME set to the temporary home directory
    /// - KEYSCOPE_STORE set to the store root
    /// - colors and the crypto override cleared
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("keyscope").expect("failed to find keyscope binary");
        cmd.env("HOME", self.home.path());
        cmd.env("USERPROFILE", self.home.path());
        cmd.env("KEYSCOPE_STORE", self.root());
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("KEYSCOPE_CRYPTO");
        cmd.env_remove("KEYSCOPE_LOG");
        cmd.env_remove("KEYSCOPE_LOG_FORMAT");
        cmd.current_dir(self.home.path());
        cmd
    }

    /// Run keyscope with `args`.
    pub fn run(&self, args: &[&str]) -> Output {
        self.cmd()
            .args(args)
            .output()
            .expect("failed to run keyscope")
    }

    /// Shortcut for `keyscope recipients add`.
    pub fn add(&self, id: &str) -> Output {
        self.run(&["recipients", "add", id])
    }

    /// Shortcut for `keyscope recipients rm --yes`.
    pub fn rm(&self, id: &str) -> Output {
        self.run(&["recipients", "rm", "--yes", id])
    }

    /// Shortcut for `keyscope recipients list --json`.
    pub fn list_json(&self) -> Output {
        self.run(&["recipients", "list", "--json"])
    }
}
