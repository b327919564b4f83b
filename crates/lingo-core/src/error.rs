//! Error types for the lingo platform.

use thiserror::Error;

/// Result type alias using lingo's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for lingo operations.
///
/// Consumers classify these into the pipeline's failure taxonomy: invalid
/// input and not-found errors drop a single message; `Conflict` is an
/// idempotent no-op; `Database` propagates so a message stays unacked and
/// is redelivered.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// User not found
    #[error("User not found: {0}")]
    UserNotFound(uuid::Uuid),

    /// Vocabulary item not found
    #[error("Vocabulary not found: {0}")]
    VocabularyNotFound(uuid::Uuid),

    /// Quiz attempt not found
    #[error("Attempt not found: {0}")]
    AttemptNotFound(uuid::Uuid),

    /// Duplicate or terminal-state operation (treated as a no-op by consumers)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Message fabric error
    #[error("Fabric error: {0}")]
    Fabric(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication/authorization failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl Error {
    /// True when reprocessing the message cannot succeed (bad payload,
    /// missing entity, terminal state). The consumer logs and acknowledges.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_)
                | Error::UserNotFound(_)
                | Error::VocabularyNotFound(_)
                | Error::AttemptNotFound(_)
                | Error::Conflict(_)
                | Error::InvalidInput(_)
                | Error::Serialization(_)
                | Error::Unauthorized(_)
        )
    }
}
