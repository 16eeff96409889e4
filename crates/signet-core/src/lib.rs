//! # Signet Core
//!
//! Pure primitives for the Signet application trust registry: identifiers,
//! signature records, permission grants, events, and the caller context.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`ApplicationId`] / [`KeyTimestamp`] / [`GroupId`] - identifier newtypes
//! - [`SignatureRecord`] - one rotation epoch of an application's key
//! - [`PermissionGrant`] - allowed operations on a permittable endpoint group
//! - [`Event`] - an immutable record of a committed state change
//! - [`KeyPairFactory`] - opaque key material plus rotation labels
//! - [`CallerContext`] - explicit acting identity for every operation

pub mod context;
pub mod error;
pub mod event;
pub mod keypair;
pub mod types;

pub use context::CallerContext;
pub use error::NotFound;
pub use event::Event;
pub use keypair::{KeyPairFactory, KeyPairHolder};
pub use types::{
    AllowedOperation, ApplicationId, GroupId, KeyTimestamp, PermissionGrant, Signature,
    SignatureRecord,
};
