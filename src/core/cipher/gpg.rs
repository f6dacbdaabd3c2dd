//! GPG cipher backend.
//!
//! Encrypts secrets using GnuPG (GNU Privacy Guard) through the gpg CLI.
//!
//! ## Requirements
//!
//! - `gpg` (or `gpg2`) CLI must be installed
//! - GPG keyring must hold the recipients' public keys
//! - A private key for one of a secret's recipients must be available to decrypt it
//!
//! ## Usage
//!
//! ```toml
//! [store]
//! crypto = "gpg"
//!
//! [gpg]
//! homedir = "/home/alice/.gnupg"
//! ```

use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use tracing::{debug, trace};

use super::{check, CipherResult, Crypto};
use crate::core::context::Context;
use crate::error::CipherError;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// GPG cipher backend using the gpg CLI.
#[derive(Debug, Clone)]
pub struct Gpg {
    binary: PathBuf,
    homedir: Option<PathBuf>,
}

/// Captured result of one gpg invocation.
struct GpgOutput {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

/// What a `--list-keys --with-colons` listing says about a recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyStatus {
    /// No public key matched.
    Unknown,
    /// At least one matching key can encrypt.
    Usable,
    /// Keys matched, but all are revoked, expired, disabled, or cannot encrypt.
    Unusable,
}

impl Gpg {
    /// Locate `gpg` (or `gpg2`) on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::BackendUnavailable` if neither is installed.
    pub fn new() -> CipherResult<Self> {
        let binary = which::which("gpg")
            .or_else(|_| which::which("gpg2"))
            .map_err(|_| {
                CipherError::BackendUnavailable(
                    "gpg CLI not found. Install GnuPG from https://gnupg.org/download/"
                        .to_string(),
                )
            })?;
        Ok(Self::with_binary(binary))
    }

    /// Use an explicit gpg binary.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            homedir: None,
        }
    }

    /// Use a keyring directory other than the default `~/.gnupg`.
    pub fn with_homedir(mut self, homedir: impl Into<PathBuf>) -> Self {
        self.homedir = Some(homedir.into());
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        if let Some(home) = &self.homedir {
            cmd.arg("--homedir").arg(home);
        }
        cmd.args(["--batch", "--yes", "--quiet"]);
        cmd
    }

    /// Run gpg with `input` on stdin, killing it if the context is cancelled.
    ///
    /// Stdin, stdout, and stderr are serviced on their own threads so large
    /// payloads cannot deadlock on a full pipe.
    fn run(
        &self,
        ctx: &Context,
        mut cmd: Command,
        input: &[u8],
        to_error: fn(String) -> CipherError,
    ) -> CipherResult<GpgOutput> {
        check(ctx)?;

        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| to_error(format!("failed to spawn gpg: {}", e)))?;

        let mut stdin = child.stdin.take();
        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();

        thread::scope(|scope| {
            let writer = scope.spawn(move || -> std::io::Result<()> {
                if let Some(pipe) = stdin.as_mut() {
                    pipe.write_all(input)?;
                }
                // Dropping closes the pipe so gpg sees EOF.
                drop(stdin);
                Ok(())
            });
            let out_reader = scope.spawn(move || read_all(stdout.as_mut()));
            let err_reader = scope.spawn(move || read_all(stderr.as_mut()));

            let status = wait_or_kill(ctx, &mut child)?;

            let write_result = writer.join().unwrap_or(Ok(()));
            let stdout = join_reader(out_reader.join(), "stdout").map_err(to_error)?;
            let stderr = join_reader(err_reader.join(), "stderr").map_err(to_error)?;

            if let Err(e) = write_result {
                // gpg exits early (closing stdin) on bad input; its stderr says why.
                if status.success() {
                    return Err(to_error(format!("failed to write to gpg: {}", e)));
                }
            }

            Ok(GpgOutput {
                status,
                stdout,
                stderr,
            })
        })
    }

    fn key_status(&self, ctx: &Context, id: &str) -> KeyStatus {
        let mut cmd = self.command();
        cmd.args(["--with-colons", "--list-keys", "--", id]);
        match self.run(ctx, cmd, b"", CipherError::BackendUnavailable) {
            Ok(output) if output.status.success() => {
                parse_key_listing(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(_) => KeyStatus::Unknown,
            Err(e) => {
                debug!(id, error = %e, "gpg key lookup failed");
                KeyStatus::Unknown
            }
        }
    }
}

fn read_all<R: Read>(pipe: Option<&mut R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(pipe) = pipe {
        pipe.read_to_end(&mut buf)?;
    }
    Ok(buf)
}

/// Turn a finished reader thread into the bytes it collected.
fn join_reader(
    joined: thread::Result<std::io::Result<Vec<u8>>>,
    stream: &str,
) -> Result<Vec<u8>, String> {
    match joined {
        Ok(Ok(buf)) => Ok(buf),
        Ok(Err(e)) => Err(format!("failed to read gpg {}: {}", stream, e)),
        Err(_) => Err(format!("gpg {} reader panicked", stream)),
    }
}

fn wait_or_kill(ctx: &Context, child: &mut Child) -> CipherResult<ExitStatus> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {}
            Err(e) => {
                let _ = child.kill();
                return Err(CipherError::BackendUnavailable(format!("gpg wait: {}", e)));
            }
        }
        if ctx.is_done() {
            let _ = child.kill();
            let _ = child.wait();
            return Err(CipherError::Cancelled);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Interpret `gpg --with-colons --list-keys` output.
///
/// Field 2 of a `pub` record is the validity (`r` revoked, `e` expired,
/// `i` invalid, `d` disabled); field 12 holds the key capabilities, where an
/// upper-case `E` means the key as a whole can encrypt.
fn parse_key_listing(listing: &str) -> KeyStatus {
    let mut status = KeyStatus::Unknown;
    for line in listing.lines() {
        let fields: Vec<&str> = line.split(':').collect();
        if fields.first() != Some(&"pub") {
            continue;
        }
        let validity = fields.get(1).copied().unwrap_or_default();
        let capabilities = fields.get(11).copied().unwrap_or_default();
        let dead = matches!(validity, "r" | "e" | "i" | "d");
        if !dead && capabilities.contains('E') {
            return KeyStatus::Usable;
        }
        status = KeyStatus::Unusable;
    }
    status
}

impl Crypto for Gpg {
    fn name(&self) -> &'static str {
        "gpg"
    }

    fn encrypt(
        &self,
        ctx: &Context,
        plaintext: &[u8],
        recipients: &[String],
    ) -> CipherResult<Vec<u8>> {
        trace!(
            recipients = recipients.len(),
            plaintext_len = plaintext.len(),
            "encrypting with GPG"
        );

        if recipients.is_empty() {
            return Err(CipherError::EncryptionFailed(
                "no recipients provided".to_string(),
            ));
        }

        let mut cmd = self.command();
        cmd.args(["--encrypt", "--trust-model", "always", "--no-encrypt-to"]);
        for recipient in recipients {
            cmd.args(["--recipient", recipient]);
        }

        let output = self.run(ctx, cmd, plaintext, CipherError::EncryptionFailed)?;
        if !output.status.success() {
            return Err(CipherError::EncryptionFailed(format!(
                "gpg encrypt failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        trace!(ciphertext_len = output.stdout.len(), "encrypted with GPG");
        Ok(output.stdout)
    }

    fn decrypt(&self, ctx: &Context, ciphertext: &[u8]) -> CipherResult<Vec<u8>> {
        trace!(ciphertext_len = ciphertext.len(), "decrypting with GPG");

        let mut cmd = self.command();
        cmd.arg("--decrypt");

        let output = self.run(ctx, cmd, ciphertext, CipherError::DecryptionFailed)?;
        if !output.status.success() {
            return Err(CipherError::DecryptionFailed(format!(
                "gpg decrypt failed: {}. Ensure you have the private key in your keyring.",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        trace!(plaintext_len = output.stdout.len(), "decrypted with GPG");
        Ok(output.stdout)
    }

    fn is_recognized_recipient(&self, ctx: &Context, id: &str) -> bool {
        self.key_status(ctx, id) == KeyStatus::Usable
    }

    fn is_invalid_recipient(&self, ctx: &Context, id: &str) -> bool {
        self.key_status(ctx, id) == KeyStatus::Unusable
    }
}
