//! Error types for tm-vault

/// Result type for tm-vault operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in vault operations.
///
/// None of the variants ever carry secret material.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed input to credential creation or update
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Sealing a secret failed
    #[error("Encryption failed: {message}")]
    Encryption { message: String },

    /// Ciphertext failed to authenticate (wrong key, corruption or tampering)
    #[error("Decryption failed: {message}")]
    Decryption { message: String },

    /// A stored credential kind that the vault does not know how to handle
    #[error("Unsupported credential kind: {kind}")]
    UnsupportedCredentialKind { kind: String },

    /// Credential id does not exist
    #[error("Credential {id} not found")]
    NotFound { id: i64 },

    /// Failure reported by the backing credential store
    #[error("Credential storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn decryption(message: impl Into<String>) -> Self {
        Self::Decryption {
            message: message.into(),
        }
    }

    /// Wrap an error raised by a [`crate::CredentialStore`] implementation.
    pub fn storage(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage(Box::new(source))
    }
}
