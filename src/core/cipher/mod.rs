//! Cryptographic operations.
//!
//! Provides the encryption capability keyscope needs and its implementations.
//! The core never inspects keys itself: key validity and trust are whatever
//! the backend reports.
//!
//! ## Backends
//!
//! - **gpg**: Default. Uses GnuPG via the gpg CLI and the user's keyring.
//! - **age**: x25519 identities held in memory, `age1...` recipients.
//! - **mock**: deterministic test double with a configurable set of held keys.
//!
//! ## Adding a New Backend
//!
//! 1. Implement the `Crypto` trait
//! 2. Add the implementation in a new file (e.g., `pkcs11.rs`)
//! 3. Select it in `backend.rs`

use crate::core::context::Context;
use crate::error::CipherError;

mod age;
mod backend;
mod gpg;
#[cfg(any(test, feature = "test-support"))]
mod mock;

pub use age::{parse_recipient, AgeKeyring};
pub use backend::open_backend;
pub use gpg::Gpg;
#[cfg(any(test, feature = "test-support"))]
pub use mock::MockCrypto;

/// Result type for crypto operations.
pub type CipherResult<T> = std::result::Result<T, CipherError>;

/// Cryptographic backend trait.
///
/// Recipients are backend-specific strings:
/// - gpg: key fingerprints, key ids, or email addresses
/// - age: public keys (age1...)
pub trait Crypto {
    /// Encrypt plaintext so that any of `recipients` can decrypt it.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::EncryptionFailed` if any recipient is unusable.
    fn encrypt(
        &self,
        ctx: &Context,
        plaintext: &[u8],
        recipients: &[String],
    ) -> CipherResult<Vec<u8>>;

    /// Decrypt ciphertext with whichever private key the backend holds.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::DecryptionFailed` if no held key matches any
    /// recipient the ciphertext was encrypted for.
    fn decrypt(&self, ctx: &Context, ciphertext: &[u8]) -> CipherResult<Vec<u8>>;

    /// Best-effort check that `id` is a known, usable encryption target.
    ///
    /// `false` means unverified, not unusable.
    fn is_recognized_recipient(&self, ctx: &Context, id: &str) -> bool;

    /// Whether the backend definitively rejects `id` (revoked, expired,
    /// malformed). Backends that cannot tell return `false`.
    fn is_invalid_recipient(&self, _ctx: &Context, _id: &str) -> bool {
        false
    }

    /// Backend name for display/config.
    fn name(&self) -> &'static str;
}

/// Fail fast when the context is done.
pub(crate) fn check(ctx: &Context) -> CipherResult<()> {
    if ctx.is_done() {
        return Err(CipherError::Cancelled);
    }
    Ok(())
}
