//! Error types for tm-store

/// Result type for tm-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in storage operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Underlying SQLite failure
    #[error("SQLite error: {0}")]
    Sqlite(#[source] rusqlite::Error),

    /// A uniqueness, foreign key or trigger constraint rejected the write
    #[error("Constraint violation: {message}")]
    Constraint { message: String },

    /// Entity row does not exist
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Input rejected before reaching the database
    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl Error {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, message)
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::Constraint {
                    message: message.clone().unwrap_or_else(|| failure.to_string()),
                }
            }
            _ => Self::Sqlite(err),
        }
    }
}

impl From<Error> for tm_vault::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound {
                entity: "credential",
                id,
            } => tm_vault::Error::NotFound { id },
            other => tm_vault::Error::storage(other),
        }
    }
}
