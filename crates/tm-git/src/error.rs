//! Error types for tm-git

/// Result type for tm-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while authenticating against or listing a remote
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The stored credential cannot be turned into a transport credential
    #[error("{message}")]
    Auth { message: String },

    /// Connection, authentication, lookup or protocol failure at the remote
    #[error("{message}")]
    RemoteAccess { message: String },

    /// Error from the credential vault
    #[error(transparent)]
    Vault(#[from] tm_vault::Error),
}

impl Error {
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    pub fn remote_access(message: impl Into<String>) -> Self {
        Self::RemoteAccess {
            message: message.into(),
        }
    }
}

impl From<git2::Error> for Error {
    fn from(err: git2::Error) -> Self {
        Self::remote_access(err.message().to_string())
    }
}
