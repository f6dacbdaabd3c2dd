//! Test fixtures and constants.

use keyscope::core::cipher::{Crypto, MockCrypto};
use keyscope::core::storage::MemoryStorage;
use keyscope::{Context, Store};

/// GPG-style key ids used with the mock backend.
pub const DEADBEEF: &str = "0xDEADBEEF";
pub const FEEDBEEF: &str = "0xFEEDBEEF";

/// Email recipients used in the sub-scope scenarios.
pub const JANE: &str = "jane@example.com";
pub const JOHN: &str = "john.doe@example.com";

/// A store over in-memory storage and the mock backend.
///
/// The returned handles share state with the store.
pub fn memory_store(storage: &MemoryStorage, crypto: &MockCrypto) -> Store {
    Store::new(
        "memory",
        "/memory",
        Box::new(crypto.clone()),
        Box::new(storage.clone()),
    )
}

/// Mock ciphertext of `plaintext` for `recipients`.
pub fn sealed(recipients: &[&str], plaintext: &str) -> Vec<u8> {
    let ids: Vec<String> = recipients.iter().map(|s| s.to_string()).collect();
    MockCrypto::new()
        .encrypt(&Context::background(), plaintext.as_bytes(), &ids)
        .expect("mock encryption never fails for non-empty recipients")
}
