//! Caller context passed into every registry operation.
//!
//! The acting identity is an explicit parameter, not ambient state: an
//! upstream security layer authenticates the caller and hands the registry a
//! `CallerContext`. The registry uses it for tracing only; authorization
//! decisions happen upstream.

use std::fmt;

/// The authenticated identity on whose behalf a registry call is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    tenant: String,
    user: String,
}

impl CallerContext {
    /// Create a context for the given tenant and user.
    pub fn new(tenant: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            user: user.into(),
        }
    }

    /// A context for in-process system callers (tests, reconcilers).
    pub fn system() -> Self {
        Self::new("system", "system")
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub fn user(&self) -> &str {
        &self.user
    }
}

impl fmt::Display for CallerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tenant, self.user)
    }
}
