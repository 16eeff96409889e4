//! Strong type definitions for the Signet registry.
//!
//! All identifiers are newtypes to prevent misuse at compile time.

use std::collections::BTreeSet;
use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A caller-chosen application identifier, unique across the registry.
///
/// An application exists iff it currently has at least one signature
/// record; there is no separate existence flag anywhere in the system.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(String);

impl ApplicationId {
    /// Create an application id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApplicationId({})", self.0)
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ApplicationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ApplicationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// An opaque key-rotation epoch label.
///
/// The registry never parses this label; `(application, timestamp)` is the
/// primary key of a signature record, and distinct labels distinguish
/// rotation epochs. [`crate::KeyPairFactory`] produces labels that are
/// strictly increasing within a process.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyTimestamp(String);

impl KeyTimestamp {
    /// Create a timestamp label from any string-like value.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Get the label as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for KeyTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyTimestamp({})", self.0)
    }
}

impl fmt::Display for KeyTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for KeyTimestamp {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An opaque permittable-endpoint-group identifier.
///
/// Names a bundle of API endpoints to which operations can be granted.
/// Validation against a group catalog is a gateway responsibility; the
/// registry stores whatever it is handed.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    /// Create a group id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupId({})", self.0)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Public signing-key material for an application: modulus and exponent.
///
/// Stored exactly as received from the key-pair supplier. The registry
/// never validates cryptographic soundness.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Public key modulus, opaque bytes.
    pub modulus: Bytes,
    /// Public key exponent, opaque bytes.
    pub exponent: Bytes,
}

impl Signature {
    /// Create a signature from raw modulus and exponent bytes.
    pub fn new(modulus: impl Into<Bytes>, exponent: impl Into<Bytes>) -> Self {
        Self {
            modulus: modulus.into(),
            exponent: exponent.into(),
        }
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = hex::encode(&self.modulus[..self.modulus.len().min(8)]);
        write!(
            f,
            "Signature(modulus {prefix}.. {} bytes, exponent {})",
            self.modulus.len(),
            hex::encode(&self.exponent),
        )
    }
}

/// A signature record: one rotation epoch of one application's key.
///
/// `(application, timestamp)` is the primary key. Multiple records may
/// coexist for one application (key history); re-putting an identical
/// record is idempotent, and putting different material for an existing
/// `(application, timestamp)` replaces that record only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    pub application: ApplicationId,
    pub timestamp: KeyTimestamp,
    pub signature: Signature,
}

impl SignatureRecord {
    pub fn new(application: ApplicationId, timestamp: KeyTimestamp, signature: Signature) -> Self {
        Self {
            application,
            timestamp,
            signature,
        }
    }
}

/// An operation that can be granted on a permittable endpoint group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllowedOperation {
    Read,
    Change,
    Delete,
}

impl AllowedOperation {
    /// All operations, in canonical order.
    pub const ALL: [AllowedOperation; 3] = [
        AllowedOperation::Read,
        AllowedOperation::Change,
        AllowedOperation::Delete,
    ];
}

impl fmt::Display for AllowedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllowedOperation::Read => f.write_str("READ"),
            AllowedOperation::Change => f.write_str("CHANGE"),
            AllowedOperation::Delete => f.write_str("DELETE"),
        }
    }
}

/// A permission grant: the operations an application may perform against
/// one permittable endpoint group.
///
/// `(application, group)` is the primary key; at most one grant per pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub application: ApplicationId,
    pub group: GroupId,
    pub allowed_operations: BTreeSet<AllowedOperation>,
}

impl PermissionGrant {
    pub fn new(
        application: ApplicationId,
        group: GroupId,
        allowed_operations: impl IntoIterator<Item = AllowedOperation>,
    ) -> Self {
        Self {
            application,
            group,
            allowed_operations: allowed_operations.into_iter().collect(),
        }
    }

    /// Check whether this grant allows the given operation.
    pub fn allows(&self, op: AllowedOperation) -> bool {
        self.allowed_operations.contains(&op)
    }
}
