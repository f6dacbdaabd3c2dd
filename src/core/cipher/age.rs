//! Age encryption backend implementation.
//!
//! Provides encryption/decryption using the age format with x25519 keys
//! and ASCII armor encoding. Private identities are held in memory; any of
//! them may decrypt.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use ::age::x25519;
use tracing::{debug, trace};

use super::{check, CipherResult, Crypto};
use crate::core::context::Context;
use crate::error::{CipherError, ConfigError, Result};

/// Age-based crypto backend holding a set of x25519 identities.
#[derive(Default)]
pub struct AgeKeyring {
    identities: Vec<x25519::Identity>,
}

impl std::fmt::Debug for AgeKeyring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgeKeyring")
            .field("identities", &self.public_keys())
            .finish()
    }
}

impl AgeKeyring {
    /// An empty keyring: can encrypt, cannot decrypt.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a private identity.
    pub fn with_identity(mut self, identity: x25519::Identity) -> Self {
        self.identities.push(identity);
        self
    }

    /// Load identities from an age identity file.
    ///
    /// One `AGE-SECRET-KEY-...` per line; blank lines and `#` comments are
    /// skipped, as written by `age-keygen`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadFile` if the file cannot be read, or
    /// `CipherError::BackendUnavailable` if a line is not a valid identity.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading age identities");
        let contents = fs::read_to_string(path).map_err(ConfigError::ReadFile)?;

        let mut keyring = Self::new();
        for line in contents.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let identity: x25519::Identity = line.parse().map_err(|e: &str| {
                CipherError::BackendUnavailable(format!(
                    "invalid age identity in {}: {}",
                    path.display(),
                    e
                ))
            })?;
            keyring.identities.push(identity);
        }

        debug!(identities = keyring.identities.len(), "age identities loaded");
        Ok(keyring)
    }

    /// Public keys of every held identity.
    pub fn public_keys(&self) -> Vec<String> {
        self.identities
            .iter()
            .map(|i| i.to_public().to_string())
            .collect()
    }
}

impl Crypto for AgeKeyring {
    fn name(&self) -> &'static str {
        "age"
    }

    fn encrypt(
        &self,
        ctx: &Context,
        plaintext: &[u8],
        recipients: &[String],
    ) -> CipherResult<Vec<u8>> {
        check(ctx)?;
        trace!(
            recipients = recipients.len(),
            plaintext_len = plaintext.len(),
            "encrypting"
        );

        let recipients = recipients
            .iter()
            .map(|r| parse_recipient(r))
            .collect::<CipherResult<Vec<_>>>()?;

        let encryptor =
            age::Encryptor::with_recipients(recipients.iter().map(|r| r as &dyn age::Recipient))
                .map_err(|e| CipherError::EncryptionFailed(format!("{}", e)))?;

        let mut encrypted = Vec::new();
        let armor = age::armor::ArmoredWriter::wrap_output(
            &mut encrypted,
            age::armor::Format::AsciiArmor,
        )
        .map_err(|e| CipherError::EncryptionFailed(format!("{}", e)))?;
        let mut writer = encryptor
            .wrap_output(armor)
            .map_err(|e| CipherError::EncryptionFailed(format!("{}", e)))?;

        writer
            .write_all(plaintext)
            .map_err(|e| CipherError::EncryptionFailed(format!("{}", e)))?;
        let armored = writer
            .finish()
            .map_err(|e| CipherError::EncryptionFailed(format!("{}", e)))?;
        armored
            .finish()
            .map_err(|e| CipherError::EncryptionFailed(format!("armor: {}", e)))?;

        trace!(ciphertext_len = encrypted.len(), "encrypted");
        Ok(encrypted)
    }

    fn decrypt(&self, ctx: &Context, ciphertext: &[u8]) -> CipherResult<Vec<u8>> {
        check(ctx)?;
        trace!(ciphertext_len = ciphertext.len(), "decrypting");

        if self.identities.is_empty() {
            return Err(CipherError::DecryptionFailed(
                "no age identity loaded".to_string(),
            ));
        }

        let reader = age::armor::ArmoredReader::new(ciphertext);
        let decryptor = age::Decryptor::new(reader)
            .map_err(|e| CipherError::DecryptionFailed(format!("{}", e)))?;

        let mut decrypted = Vec::new();
        let mut reader = decryptor
            .decrypt(self.identities.iter().map(|i| i as &dyn age::Identity))
            .map_err(|e| CipherError::DecryptionFailed(format!("{}", e)))?;

        reader
            .read_to_end(&mut decrypted)
            .map_err(|e| CipherError::DecryptionFailed(format!("{}", e)))?;

        trace!(plaintext_len = decrypted.len(), "decrypted");
        Ok(decrypted)
    }

    fn is_recognized_recipient(&self, _ctx: &Context, id: &str) -> bool {
        parse_recipient(id).is_ok()
    }

    fn is_invalid_recipient(&self, _ctx: &Context, id: &str) -> bool {
        parse_recipient(id).is_err()
    }
}

/// Parse a public key string into an age recipient.
///
/// # Errors
///
/// Returns `CipherError::EncryptionFailed` if the key format is invalid.
pub fn parse_recipient(key: &str) -> CipherResult<x25519::Recipient> {
    key.parse::<x25519::Recipient>()
        .map_err(|_| CipherError::EncryptionFailed(format!("invalid age public key: {}", key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let identity = x25519::Identity::generate();
        let recipient = identity.to_public().to_string();
        let keyring = AgeKeyring::new().with_identity(identity);
        let ctx = Context::background();

        let encrypted = keyring.encrypt(&ctx, b"Hello, World!", &[recipient]).unwrap();
        assert!(String::from_utf8_lossy(&encrypted).contains("-----BEGIN AGE ENCRYPTED FILE-----"));

        let decrypted = keyring.decrypt(&ctx, &encrypted).unwrap();
        assert_eq!(decrypted, b"Hello, World!");
    }

    #[test]
    fn test_decrypt_without_matching_identity_fails() {
        let alice = x25519::Identity::generate();
        let bob = x25519::Identity::generate();
        let ctx = Context::background();

        let encrypted = AgeKeyring::new()
            .encrypt(&ctx, b"for alice", &[alice.to_public().to_string()])
            .unwrap();

        let bob_keyring = AgeKeyring::new().with_identity(bob);
        assert!(matches!(
            bob_keyring.decrypt(&ctx, &encrypted),
            Err(CipherError::DecryptionFailed(_))
        ));
    }

    #[test]
    fn test_recipient_recognition() {
        let keyring = AgeKeyring::new();
        let ctx = Context::background();
        let key = x25519::Identity::generate().to_public().to_string();

        assert!(keyring.is_recognized_recipient(&ctx, &key));
        assert!(!keyring.is_invalid_recipient(&ctx, &key));
        assert!(!keyring.is_recognized_recipient(&ctx, "0xDEADBEEF"));
        assert!(keyring.is_invalid_recipient(&ctx, "0xDEADBEEF"));
    }

    #[test]
    fn test_load_identity_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let identity = x25519::Identity::generate();
        let public = identity.to_public().to_string();

        use age::secrecy::ExposeSecret;
        let path = tmp.path().join("identity.key");
        fs::write(
            &path,
            format!(
                "# created: today\n# public key: {}\n{}\n",
                public,
                identity.to_string().expose_secret()
            ),
        )
        .unwrap();

        let keyring = AgeKeyring::load(&path).unwrap();
        assert_eq!(keyring.public_keys(), vec![public]);
    }
}
