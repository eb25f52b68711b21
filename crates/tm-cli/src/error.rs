//! Error types for tm-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from tm-core
    #[error(transparent)]
    Core(#[from] tm_core::Error),

    /// Error from tm-vault
    #[error(transparent)]
    Vault(#[from] tm_vault::Error),

    /// Error from tm-store
    #[error(transparent)]
    Store(#[from] tm_store::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Interactive prompt error
    #[error("Interactive prompt error: {0}")]
    Dialoguer(#[from] dialoguer::Error),

    /// A sync ran but did not succeed; the result has already been printed
    #[error("{message}")]
    SyncFailed { message: String },

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
