//! keyscope - Hierarchical recipient management for GPG secret stores.
//!
//! Every directory of a secret tree may carry a `.gpg-id` manifest naming
//! the recipients allowed to decrypt the secrets beneath it. The nearest
//! manifest above a secret wins. Changing a scope's recipients re-encrypts
//! every secret that scope governs.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── recipients    # list, show, add, rm, save
//! │   ├── reencrypt     # Retry re-encryption of a scope
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── config        # .keyscope.toml management
//!     ├── context       # Cancellation, deadline, correlation
//!     ├── manifest      # Manifest codec
//!     ├── resolver      # Nearest-manifest resolution
//!     ├── mutator       # Manifest add/remove/save
//!     ├── reencrypt     # Re-encryption engine
//!     ├── store/        # Store facade
//!     ├── cipher/       # Crypto backends
//!     │   ├── gpg       # gpg CLI
//!     │   ├── age       # age x25519 keyring
//!     │   └── mock      # Test double
//!     └── storage/      # Versioned storage backends
//!         ├── fs        # Plain filesystem
//!         ├── git       # Filesystem + git commits
//!         └── memory    # Test double
//! ```
//!
//! # Example
//!
//! ```no_run
//! use keyscope::core::cipher::Gpg;
//! use keyscope::core::context::Context;
//! use keyscope::core::storage::Git;
//! use keyscope::core::store::Store;
//!
//! # fn main() -> keyscope::error::Result<()> {
//! let root = "/home/jane/.password-store";
//! let store = Store::new("personal", root, Box::new(Gpg::new()?), Box::new(Git::open(root)?));
//!
//! let ctx = Context::background().with_new_correlation();
//! let update = store.add_recipient(&ctx, "0xFEEDBEEF")?;
//! println!("re-encrypted {} secrets", update.report.succeeded.len());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod core;
pub mod error;

pub use crate::core::context::Context;
pub use crate::core::store::Store;
pub use crate::error::{Error, Result};
