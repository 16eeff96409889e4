//! Store traits: the abstract interfaces for signature and permission
//! persistence.
//!
//! The two traits keep the registry storage-agnostic. Both backends
//! ([`crate::SqliteStore`] and [`crate::MemoryStore`]) implement both
//! traits, so a single value can back the whole registry.

use async_trait::async_trait;
use signet_core::{ApplicationId, GroupId, KeyTimestamp, PermissionGrant, SignatureRecord};

use crate::error::Result;

/// Result of putting a signature record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// A new `(application, timestamp)` record was written.
    Inserted,
    /// An existing record at this key was overwritten with new material.
    Replaced,
    /// The identical record was already present (idempotent - not an error).
    Unchanged,
}

/// Result of creating a permission grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// A new grant was written.
    Created,
    /// The identical grant was already present (idempotent - not an error).
    Unchanged,
}

/// Persistence of per-application signature records.
///
/// Application existence is *derived* from this store: an application
/// exists iff it has at least one signature record. Putting the first
/// record for a fresh identifier is what brings an application into
/// existence, so `put_signature` has no existence precondition.
#[async_trait]
pub trait SignatureStore: Send + Sync {
    /// Insert or replace the record for `(application, timestamp)`.
    ///
    /// Re-putting identical values returns [`PutOutcome::Unchanged`];
    /// different material at an existing key replaces that record only.
    async fn put_signature(&self, record: &SignatureRecord) -> Result<PutOutcome>;

    /// Get the record for `(application, timestamp)`.
    ///
    /// Fails with `NotFound` if the application or that specific timestamp
    /// has no record, including after the application was deleted.
    async fn get_signature(
        &self,
        application: &ApplicationId,
        timestamp: &KeyTimestamp,
    ) -> Result<SignatureRecord>;

    /// All records for one application, ordered by timestamp label.
    ///
    /// Empty when the application does not exist.
    async fn list_signatures(&self, application: &ApplicationId) -> Result<Vec<SignatureRecord>>;

    /// Distinct application identifiers with at least one record, sorted.
    async fn list_applications(&self) -> Result<Vec<ApplicationId>>;

    /// Whether the application currently exists (has any record).
    async fn application_exists(&self, application: &ApplicationId) -> Result<bool>;

    /// Remove every record for the application.
    ///
    /// Idempotent; returns the number of records removed (0 if none).
    async fn delete_all_signatures(&self, application: &ApplicationId) -> Result<u64>;
}

/// Persistence of per-application permission grants.
///
/// The application-existence precondition for writes is enforced by the
/// registry façade, not here; the store only owns the
/// `(application, group)` uniqueness and conflict rules.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Create a grant for `(application, group)`.
    ///
    /// An identical existing grant returns [`CreateOutcome::Unchanged`];
    /// an existing grant with *different* operations fails with `Conflict`.
    async fn create_permission(&self, grant: &PermissionGrant) -> Result<CreateOutcome>;

    /// All grants for one application, sorted by group id.
    ///
    /// Empty when there are no grants; existence checks belong to the
    /// caller.
    async fn get_permissions(&self, application: &ApplicationId) -> Result<Vec<PermissionGrant>>;

    /// Delete the grant for `(application, group)`.
    ///
    /// Idempotent; returns whether a grant was actually removed.
    async fn delete_permission(&self, application: &ApplicationId, group: &GroupId)
        -> Result<bool>;

    /// Remove every grant for the application.
    ///
    /// Idempotent; returns the number of grants removed.
    async fn delete_all_permissions(&self, application: &ApplicationId) -> Result<u64>;
}

/// A backend holding both sides of an application's state.
///
/// Adds the one operation that must span the two stores: deleting an
/// application takes out its grants *and* its key history as a single
/// atomic unit, so no observer or failure can see grants without
/// signatures or signatures without their grants removed.
#[async_trait]
pub trait ApplicationStore: SignatureStore + PermissionStore {
    /// Remove every grant and every signature record for the application
    /// atomically.
    ///
    /// Idempotent; returns `(grants_removed, signatures_removed)`.
    async fn delete_application(&self, application: &ApplicationId) -> Result<(u64, u64)>;
}
