//! Error types for the events module.

use thiserror::Error;

/// Errors that can occur while consuming events.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
    /// The bounded wait expired before a matching event arrived.
    ///
    /// Means "event not yet observed", never "the mutation failed";
    /// callers reconcile by re-reading the registry.
    #[error("timed out waiting for event")]
    Timeout,

    /// The publisher was dropped and the journal is fully drained.
    #[error("event channel closed")]
    Closed,
}

/// Result type for event operations.
pub type Result<T> = std::result::Result<T, EventError>;
