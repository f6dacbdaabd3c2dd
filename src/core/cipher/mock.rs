//! Mock crypto backend.
//!
//! Deterministic stand-in for a real keyring, used by the test suite and
//! benchmarks. Ciphertext records its recipients in a header, and decryption
//! succeeds only if the mock "holds" a private key for one of them, so tests
//! can check who is able to read a secret without real key material.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{check, CipherResult, Crypto};
use crate::core::context::Context;
use crate::error::CipherError;

const MAGIC: &[u8] = b"MOCK-ENCRYPTED\n";

#[derive(Debug, Default)]
struct State {
    /// `None` holds every private key.
    held: Option<BTreeSet<String>>,
    /// `None` recognizes every recipient.
    recognized: Option<BTreeSet<String>>,
    rejected: BTreeSet<String>,
    failing_plaintexts: BTreeSet<Vec<u8>>,
}

/// Mock crypto backend. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockCrypto {
    state: Arc<Mutex<State>>,
}

impl MockCrypto {
    /// A mock that holds every key and recognizes every recipient.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hold private keys only for `ids`.
    pub fn holding<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state().held = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Recognize only `ids`; others are unverified.
    pub fn recognizing<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state().recognized = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Report `ids` as definitively invalid.
    pub fn rejecting<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state().rejected = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Make encryption of this exact plaintext fail.
    pub fn fail_encrypting(&self, plaintext: impl AsRef<[u8]>) {
        self.state()
            .failing_plaintexts
            .insert(plaintext.as_ref().to_vec());
    }

    /// Recipients recorded in a mock ciphertext, or `None` if it is not one.
    pub fn recipients_of(ciphertext: &[u8]) -> Option<Vec<String>> {
        let (recipients, _) = split(ciphertext)?;
        Some(recipients)
    }

    /// Decrypt as if only `key` were held, regardless of configuration.
    pub fn decrypt_with(key: &str, ciphertext: &[u8]) -> CipherResult<Vec<u8>> {
        let (recipients, body) = split(ciphertext)
            .ok_or_else(|| CipherError::DecryptionFailed("not a mock ciphertext".to_string()))?;
        if !recipients.iter().any(|r| r == key) {
            return Err(CipherError::DecryptionFailed(format!(
                "{} is not a recipient",
                key
            )));
        }
        Ok(body.to_vec())
    }
}

fn split(ciphertext: &[u8]) -> Option<(Vec<String>, &[u8])> {
    let rest = ciphertext.strip_prefix(MAGIC)?;
    let newline = rest.iter().position(|b| *b == b'\n')?;
    let header = std::str::from_utf8(&rest[..newline]).ok()?;
    let recipients = header
        .split(',')
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect();
    Some((recipients, &rest[newline + 1..]))
}

impl Crypto for MockCrypto {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn encrypt(
        &self,
        ctx: &Context,
        plaintext: &[u8],
        recipients: &[String],
    ) -> CipherResult<Vec<u8>> {
        check(ctx)?;
        if recipients.is_empty() {
            return Err(CipherError::EncryptionFailed(
                "no recipients provided".to_string(),
            ));
        }
        if self.state().failing_plaintexts.contains(plaintext) {
            return Err(CipherError::EncryptionFailed("injected failure".to_string()));
        }

        let mut out = MAGIC.to_vec();
        out.extend_from_slice(recipients.join(",").as_bytes());
        out.push(b'\n');
        out.extend_from_slice(plaintext);
        Ok(out)
    }

    fn decrypt(&self, ctx: &Context, ciphertext: &[u8]) -> CipherResult<Vec<u8>> {
        check(ctx)?;
        let (recipients, body) = split(ciphertext)
            .ok_or_else(|| CipherError::DecryptionFailed("not a mock ciphertext".to_string()))?;

        let state = self.state();
        let readable = match &state.held {
            None => true,
            Some(held) => recipients.iter().any(|r| held.contains(r)),
        };
        if !readable {
            return Err(CipherError::DecryptionFailed(
                "no secret key for any recipient".to_string(),
            ));
        }
        Ok(body.to_vec())
    }

    fn is_recognized_recipient(&self, _ctx: &Context, id: &str) -> bool {
        let state = self.state();
        !state.rejected.contains(id)
            && state.recognized.as_ref().map_or(true, |r| r.contains(id))
    }

    fn is_invalid_recipient(&self, _ctx: &Context, id: &str) -> bool {
        self.state().rejected.contains(id)
    }
}
