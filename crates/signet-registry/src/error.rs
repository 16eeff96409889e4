//! Error types for the registry façade.
//!
//! Store errors propagate through unchanged; the façade adds nothing
//! beyond the identifiers already carried in the error variants. The only
//! errors raised by the façade itself are the existence preconditions,
//! which surface as the same [`NotFound`] type the stores use.

use thiserror::Error;

use signet_core::NotFound;
use signet_store::StoreError;

/// Errors returned by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A referenced application, signature, or grant does not exist.
    /// Never retried automatically.
    #[error(transparent)]
    NotFound(#[from] NotFound),

    /// A store-level failure: conflict, database error, or transient
    /// unavailability (retryable, nothing committed).
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for RegistryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(not_found) => RegistryError::NotFound(not_found),
            other => RegistryError::Store(other),
        }
    }
}

impl RegistryError {
    /// Whether this error means a referenced entity was absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFound(_))
    }

    /// Whether this error is a permission-grant conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, RegistryError::Store(StoreError::Conflict { .. }))
    }
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
