//! Error types for the store module.

use thiserror::Error;

use signet_core::{ApplicationId, GroupId, NotFound};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A referenced application, signature, or grant does not exist.
    #[error(transparent)]
    NotFound(#[from] NotFound),

    /// A grant already exists for this pair with different operations.
    #[error("permission conflict: application {application}, group {group} already granted with different operations")]
    Conflict {
        application: ApplicationId,
        group: GroupId,
    },

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Record serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Storage momentarily unreachable; the mutation did not commit and
    /// the caller may retry.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether this error means the entity was absent (as opposed to the
    /// operation failing).
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
