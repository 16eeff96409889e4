//! # Signet Store
//!
//! Storage abstraction for the Signet registry. Signature records and
//! permission grants sit behind two async traits with SQLite and in-memory
//! implementations.
//!
//! ## Key Types
//!
//! - [`SignatureStore`] - per-application key material, keyed by
//!   `(application, timestamp)`
//! - [`PermissionStore`] - per-application grants, keyed by
//!   `(application, group)`
//! - [`ApplicationStore`] - both sides together, plus atomic
//!   whole-application deletion
//! - [`SqliteStore`] - persistent backend (rusqlite + spawn_blocking)
//! - [`MemoryStore`] - in-memory backend for tests
//!
//! ## Design Notes
//!
//! - **Derived existence**: an application exists iff the signature store
//!   has at least one record for it. `application_exists` is the only
//!   source of truth; there is no stored flag.
//! - **Idempotent writes**: re-putting an identical signature returns
//!   [`PutOutcome::Unchanged`]; re-creating an identical grant returns
//!   [`CreateOutcome::Unchanged`]. Only *different* operations on an
//!   existing grant are a [`StoreError::Conflict`].
//! - **Absence is an error**: `get_signature` on a missing or deleted
//!   record fails `NotFound` rather than returning an empty result.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{ApplicationStore, CreateOutcome, PermissionStore, PutOutcome, SignatureStore};
