//! # Signet Registry
//!
//! The application trust registry: client applications register a
//! rotating signing key, the platform grants and revokes fine-grained
//! API permissions, and every committed state change is observable as an
//! at-least-once event.
//!
//! ## Key Concepts
//!
//! - **Derived existence**: an application exists iff it has at least one
//!   signature record. The first `set_application_signature` call for a
//!   fresh identifier creates the application; `delete_application`
//!   removes every signature and grant atomically.
//! - **Per-application isolation**: mutations on the same identifier
//!   serialize; distinct identifiers never block each other.
//! - **Event correspondence**: one event per committed mutation, published
//!   before the per-application lock is released, delivered at-least-once.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use signet_core::{ApplicationId, CallerContext, KeyPairFactory};
//! use signet_registry::ApplicationRegistry;
//! use signet_store::SqliteStore;
//!
//! async fn example() {
//!     let store = SqliteStore::open("registry.db").unwrap();
//!     let registry = ApplicationRegistry::new(store);
//!     let ctx = CallerContext::new("acme", "operator");
//!
//!     let mut events = registry.subscribe();
//!
//!     let key = KeyPairFactory::new().generate();
//!     registry
//!         .set_application_signature(
//!             &ctx,
//!             &ApplicationId::new("payments-v1"),
//!             &key.timestamp,
//!             key.signature(),
//!         )
//!         .await
//!         .unwrap();
//!
//!     // let event = events.recv().await.unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `signet_registry::core` - identifiers, grants, events, caller context
//! - `signet_registry::store` - storage traits and backends
//! - `signet_registry::events` - publisher and subscriptions

pub mod error;
pub mod registry;

// Re-export component crates
pub use signet_core as core;
pub use signet_events as events;
pub use signet_store as store;

// Re-export main types for convenience
pub use error::{RegistryError, Result};
pub use registry::ApplicationRegistry;

// Re-export commonly used core types
pub use signet_core::{
    AllowedOperation, ApplicationId, CallerContext, Event, GroupId, KeyPairFactory, KeyTimestamp,
    PermissionGrant, Signature, SignatureRecord,
};
