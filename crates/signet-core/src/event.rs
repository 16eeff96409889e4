//! Registry change events.
//!
//! Every committed state transition produces exactly one event. Events are
//! immutable, append-only, and compared by content: delivery is
//! at-least-once, and listeners treat a duplicate of an event they have
//! already handled as a no-op.

use serde::{Deserialize, Serialize};

use crate::types::{ApplicationId, GroupId, KeyTimestamp};

/// A committed state transition in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    /// A signature was set (application created or key rotated).
    SignatureSet {
        application: ApplicationId,
        timestamp: KeyTimestamp,
    },

    /// A permission grant was created for an application.
    PermissionCreated {
        application: ApplicationId,
        group: GroupId,
    },

    /// A permission grant was deleted from an application.
    PermissionDeleted {
        application: ApplicationId,
        group: GroupId,
    },

    /// An application and all its signatures and grants were deleted.
    ApplicationDeleted { application: ApplicationId },
}

impl Event {
    /// The application this event concerns.
    ///
    /// Events for the same application are delivered in the order their
    /// mutations committed; there is no cross-application ordering.
    pub fn application(&self) -> &ApplicationId {
        match self {
            Event::SignatureSet { application, .. }
            | Event::PermissionCreated { application, .. }
            | Event::PermissionDeleted { application, .. }
            | Event::ApplicationDeleted { application } => application,
        }
    }

    /// Short name of the event kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::SignatureSet { .. } => "signature-set",
            Event::PermissionCreated { .. } => "permission-created",
            Event::PermissionDeleted { .. } => "permission-deleted",
            Event::ApplicationDeleted { .. } => "application-deleted",
        }
    }
}
