//! Test fixtures and helpers.
//!
//! Common setup code for registry tests: a memory-backed registry, a
//! key-pair factory, and a system caller context.

use std::sync::atomic::{AtomicU32, Ordering};

use signet_core::{
    AllowedOperation, ApplicationId, CallerContext, GroupId, KeyPairFactory, KeyTimestamp,
    PermissionGrant,
};
use signet_events::EventSubscription;
use signet_registry::ApplicationRegistry;
use signet_store::MemoryStore;

static NEXT_APP: AtomicU32 = AtomicU32::new(100);

/// A test fixture with a memory-backed registry and key-pair factory.
pub struct TestFixture {
    pub registry: ApplicationRegistry<MemoryStore>,
    pub factory: KeyPairFactory,
    pub ctx: CallerContext,
}

impl TestFixture {
    /// Create a fresh fixture.
    pub fn new() -> Self {
        Self {
            registry: ApplicationRegistry::new(MemoryStore::new()),
            factory: KeyPairFactory::new(),
            ctx: CallerContext::system(),
        }
    }

    /// Subscribe to the fixture registry's events.
    pub fn subscribe(&self) -> EventSubscription {
        self.registry.subscribe()
    }

    /// A process-unique application id in the `testNNN-v1` shape.
    pub fn unique_application_id(&self) -> ApplicationId {
        let n = NEXT_APP.fetch_add(1, Ordering::Relaxed);
        ApplicationId::new(format!("test{n}-v1"))
    }

    /// Register an application with a fresh key pair.
    ///
    /// Returns the identifier and the rotation label that was set.
    pub async fn register_application(&self) -> (ApplicationId, KeyTimestamp) {
        let application = self.unique_application_id();
        let key = self.factory.generate();

        self.registry
            .set_application_signature(&self.ctx, &application, &key.timestamp, key.signature())
            .await
            .expect("set signature");

        (application, key.timestamp)
    }

    /// Build a grant for the given application.
    pub fn grant(
        &self,
        application: &ApplicationId,
        group: &str,
        operations: impl IntoIterator<Item = AllowedOperation>,
    ) -> PermissionGrant {
        PermissionGrant::new(application.clone(), GroupId::new(group), operations)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
