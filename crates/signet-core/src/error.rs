//! Error types for the Signet core.
//!
//! Absence is signalled with an explicit [`NotFound`] value rather than
//! exceptions or empty results; call sites match on the variant. The store
//! and registry crates embed this type in their own error enums.

use thiserror::Error;

use crate::types::{ApplicationId, GroupId, KeyTimestamp};

/// A reference to a registry entity that does not currently exist.
///
/// Lookups against a deleted application fail with
/// [`NotFound::Application`], never with an empty result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFound {
    #[error("application not found: {0}")]
    Application(ApplicationId),

    #[error("signature not found: application {application}, timestamp {timestamp}")]
    Signature {
        application: ApplicationId,
        timestamp: KeyTimestamp,
    },

    #[error("permission grant not found: application {application}, group {group}")]
    Permission {
        application: ApplicationId,
        group: GroupId,
    },
}
