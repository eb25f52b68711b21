//! Persistence for Test Machine
//!
//! Plain entity rows for repositories and their branch/tag snapshots, the
//! [`RepositoryStore`] seam used by the synchronizer, and [`SqliteStore`],
//! which also implements [`tm_vault::CredentialStore`].

mod credentials;
pub mod error;
pub mod model;
pub mod schema;
pub mod sqlite;
pub mod store;

pub use error::{Error, Result};
pub use model::{
    Branch, BranchRecord, NewRepository, RefReplacement, Repository, RepositoryUpdate, Tag,
    TagRecord,
};
pub use sqlite::SqliteStore;
pub use store::RepositoryStore;
