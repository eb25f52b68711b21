//! Error types for tm-core

use std::path::PathBuf;

/// Result type for tm-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tm-core operations.
///
/// Failures talking to a remote are not errors here; they are reported
/// through [`crate::SyncResult`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Repository id does not exist
    #[error("Repository {id} not found")]
    RepositoryNotFound { id: i64 },

    /// Credential is still referenced by repositories
    #[error("Credential {id} is used by repositories {repository_ids:?}")]
    CredentialInUse { id: i64, repository_ids: Vec<i64> },

    /// Configuration file not found at expected path
    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Configuration error: {message}")]
    Config { message: String },

    // Transparent wrappers for underlying crate errors
    /// Error from tm-vault
    #[error(transparent)]
    Vault(#[from] tm_vault::Error),

    /// Error from tm-git
    #[error(transparent)]
    Git(#[from] tm_git::Error),

    /// Error from tm-store
    #[error(transparent)]
    Store(#[from] tm_store::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
