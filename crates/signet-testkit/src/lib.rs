//! # Signet Testkit
//!
//! Testing utilities for the Signet registry.
//!
//! ## Overview
//!
//! - **Fixtures**: a memory-backed registry with a key-pair factory and
//!   caller context, plus helpers for registering applications
//! - **Generators**: proptest strategies for identifiers, signature
//!   records, and permission grants
//!
//! ## Test Fixtures
//!
//! ```rust
//! use signet_testkit::TestFixture;
//!
//! # async fn example() {
//! let fixture = TestFixture::new();
//! let (app, timestamp) = fixture.register_application().await;
//! # }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use signet_testkit::generators::permission_grant;
//!
//! proptest! {
//!     #[test]
//!     fn grants_are_well_formed(grant in permission_grant()) {
//!         prop_assert!(!grant.allowed_operations.is_empty());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::TestFixture;
