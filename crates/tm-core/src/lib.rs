//! Repository synchronization engine for Test Machine
//!
//! Sits above the vault, Git transport and storage crates:
//!
//! ```text
//!                tm-cli
//!                  |
//!               tm-core
//!                  |
//!     +------------+------------+
//!     |            |            |
//! tm-vault      tm-git      tm-store
//! ```
//!
//! - **Configuration**: file plus environment, including the credential key
//! - **Ref classification**: branches, tags and the default branch
//! - **RepositorySynchronizer**: the locked list-classify-replace sequence
//! - **Engine**: builds everything from a [`Config`]

pub mod config;
pub mod engine;
pub mod error;
pub mod lock;
pub mod refs;
pub mod sync;

pub use config::{Config, DEVELOPMENT_ENCRYPTION_KEY, KeySource};
pub use engine::Engine;
pub use error::{Error, Result};
pub use lock::RepositoryLocks;
pub use refs::{RefSnapshot, classify_refs, select_default_branch};
pub use sync::{RepositorySynchronizer, SYNC_SUCCEEDED, SyncResult};
