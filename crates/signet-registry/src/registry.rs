//! The registry façade: signature and permission state plus change events.
//!
//! `ApplicationRegistry` composes a storage backend with an event
//! publisher and enforces the existence invariant: an application exists
//! iff it has at least one signature record. Permission writes check that
//! invariant before touching the permission side, and application deletion
//! clears both sides under one lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use signet_core::{
    ApplicationId, CallerContext, Event, GroupId, KeyTimestamp, NotFound, PermissionGrant,
    Signature, SignatureRecord,
};
use signet_events::{EventPublisher, EventSubscription};
use signet_store::ApplicationStore;

use crate::error::Result;

/// The application trust registry.
///
/// Generic over a backend implementing [`ApplicationStore`]. All mutating
/// operations on one application identifier serialize on a per-application
/// lock; operations on distinct identifiers run concurrently. Each
/// committed mutation publishes exactly one event before the lock is
/// released, so per-application event order matches commit order.
pub struct ApplicationRegistry<S> {
    store: Arc<S>,
    publisher: EventPublisher,
    /// Per-application mutation locks. Entries are never removed: an
    /// identifier reused after deletion must keep serializing against
    /// in-flight operations holding the old entry.
    locks: Mutex<HashMap<ApplicationId, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S> ApplicationRegistry<S>
where
    S: ApplicationStore,
{
    /// Create a registry over the given backend with a fresh publisher.
    pub fn new(store: S) -> Self {
        Self::with_publisher(store, EventPublisher::new())
    }

    /// Create a registry over the given backend and publisher.
    pub fn with_publisher(store: S, publisher: EventPublisher) -> Self {
        Self {
            store: Arc::new(store),
            publisher,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Get the storage backend.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the event publisher (for `events_since` reconciliation).
    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }

    /// Subscribe to events published after this call.
    pub fn subscribe(&self) -> EventSubscription {
        self.publisher.subscribe()
    }

    fn app_lock(&self, application: &ApplicationId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            locks
                .entry(application.clone())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        )
    }

    // ─────────────────────────────────────────────────────────────────────
    // Signature Operations
    // ─────────────────────────────────────────────────────────────────────

    /// Set the signature for `(application, timestamp)`.
    ///
    /// The first signature for a fresh identifier brings the application
    /// into existence; later calls add or replace rotation epochs.
    /// Publishes a `SignatureSet` event on success.
    pub async fn set_application_signature(
        &self,
        ctx: &CallerContext,
        application: &ApplicationId,
        timestamp: &KeyTimestamp,
        signature: Signature,
    ) -> Result<()> {
        let lock = self.app_lock(application);
        let _guard = lock.lock().await;

        let record = SignatureRecord::new(application.clone(), timestamp.clone(), signature);
        let outcome = self.store.put_signature(&record).await?;

        tracing::info!(caller = %ctx, application = %application, timestamp = %timestamp,
            ?outcome, "application signature set");

        self.publisher.publish(Event::SignatureSet {
            application: application.clone(),
            timestamp: timestamp.clone(),
        });

        Ok(())
    }

    /// Get the signature for `(application, timestamp)`.
    ///
    /// Fails `NotFound` when the application or that rotation epoch has no
    /// record, including after the application was deleted.
    pub async fn get_application_signature(
        &self,
        _ctx: &CallerContext,
        application: &ApplicationId,
        timestamp: &KeyTimestamp,
    ) -> Result<Signature> {
        let record = self.store.get_signature(application, timestamp).await?;
        Ok(record.signature)
    }

    /// The full key history of one application, ordered by timestamp label.
    pub async fn get_application_signatures(
        &self,
        _ctx: &CallerContext,
        application: &ApplicationId,
    ) -> Result<Vec<SignatureRecord>> {
        let records = self.store.list_signatures(application).await?;
        if records.is_empty() {
            return Err(NotFound::Application(application.clone()).into());
        }
        Ok(records)
    }

    /// All application identifiers that currently exist, sorted.
    pub async fn get_applications(&self, _ctx: &CallerContext) -> Result<Vec<ApplicationId>> {
        Ok(self.store.list_applications().await?)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Permission Operations
    // ─────────────────────────────────────────────────────────────────────

    /// Grant the operations in `grant` to its application.
    ///
    /// Fails `NotFound` unless the application exists, `Conflict` if a
    /// different grant exists for the same group; re-creating an identical
    /// grant is idempotent. Publishes a `PermissionCreated` event on
    /// success.
    pub async fn create_application_permission(
        &self,
        ctx: &CallerContext,
        grant: PermissionGrant,
    ) -> Result<()> {
        let lock = self.app_lock(&grant.application);
        let _guard = lock.lock().await;

        self.require_exists(&grant.application).await?;

        let outcome = self.store.create_permission(&grant).await?;

        tracing::info!(caller = %ctx, application = %grant.application, group = %grant.group,
            ?outcome, "application permission created");

        self.publisher.publish(Event::PermissionCreated {
            application: grant.application.clone(),
            group: grant.group.clone(),
        });

        Ok(())
    }

    /// All grants for one application, sorted by group id.
    ///
    /// Empty when the application exists but has no grants; `NotFound`
    /// when the application does not exist. Takes the per-application
    /// lock: the existence check and the grant read are two store calls,
    /// and without the lock a concurrent deletion could slip between
    /// them, yielding an empty result for an application that held
    /// grants a moment earlier.
    pub async fn get_application_permissions(
        &self,
        _ctx: &CallerContext,
        application: &ApplicationId,
    ) -> Result<Vec<PermissionGrant>> {
        let lock = self.app_lock(application);
        let _guard = lock.lock().await;

        self.require_exists(application).await?;
        Ok(self.store.get_permissions(application).await?)
    }

    /// Delete the grant for `(application, group)`.
    ///
    /// Fails `NotFound` unless the application exists; deleting an absent
    /// grant is otherwise idempotent. Publishes a `PermissionDeleted`
    /// event on success.
    pub async fn delete_application_permission(
        &self,
        ctx: &CallerContext,
        application: &ApplicationId,
        group: &GroupId,
    ) -> Result<()> {
        let lock = self.app_lock(application);
        let _guard = lock.lock().await;

        self.require_exists(application).await?;

        let removed = self.store.delete_permission(application, group).await?;

        tracing::info!(caller = %ctx, application = %application, group = %group,
            removed, "application permission deleted");

        self.publisher.publish(Event::PermissionDeleted {
            application: application.clone(),
            group: group.clone(),
        });

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Application Deletion
    // ─────────────────────────────────────────────────────────────────────

    /// Delete an application: every signature record and every grant.
    ///
    /// Fails `NotFound` unless the application exists. Afterwards any
    /// signature or permission lookup for the identifier fails `NotFound`.
    /// Publishes an `ApplicationDeleted` event on success.
    pub async fn delete_application(
        &self,
        ctx: &CallerContext,
        application: &ApplicationId,
    ) -> Result<()> {
        let lock = self.app_lock(application);
        let _guard = lock.lock().await;

        self.require_exists(application).await?;

        // Grants and signatures go in one atomic store operation: a
        // failure commits nothing, so the application never ends up
        // existing with half its state gone.
        let (grants_removed, signatures_removed) =
            self.store.delete_application(application).await?;

        tracing::info!(caller = %ctx, application = %application,
            grants_removed, signatures_removed, "application deleted");

        self.publisher.publish(Event::ApplicationDeleted {
            application: application.clone(),
        });

        Ok(())
    }

    /// Existence precondition shared by the permission and delete paths.
    async fn require_exists(&self, application: &ApplicationId) -> Result<()> {
        if self.store.application_exists(application).await? {
            Ok(())
        } else {
            Err(NotFound::Application(application.clone()).into())
        }
    }
}
