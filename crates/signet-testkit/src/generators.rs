//! Proptest generators for property-based testing.

use std::collections::BTreeSet;

use proptest::prelude::*;

use signet_core::{
    AllowedOperation, ApplicationId, GroupId, KeyTimestamp, PermissionGrant, Signature,
    SignatureRecord,
};

/// Generate an application identifier.
pub fn application_id() -> impl Strategy<Value = ApplicationId> {
    "[a-z][a-z0-9-]{0,31}".prop_map(ApplicationId::new)
}

/// Generate an opaque rotation-epoch label.
pub fn key_timestamp() -> impl Strategy<Value = KeyTimestamp> {
    (0i64..=1_700_000_000_000i64).prop_map(|ms| KeyTimestamp::new(ms.to_string()))
}

/// Generate a permittable-group identifier.
pub fn group_id() -> impl Strategy<Value = GroupId> {
    "[a-z][a-z-]{0,31}".prop_map(GroupId::new)
}

/// Generate a non-empty allowed-operation set.
pub fn allowed_operations() -> impl Strategy<Value = BTreeSet<AllowedOperation>> {
    prop::collection::btree_set(
        prop_oneof![
            Just(AllowedOperation::Read),
            Just(AllowedOperation::Change),
            Just(AllowedOperation::Delete),
        ],
        1..=3,
    )
}

/// Generate opaque signature material.
pub fn signature() -> impl Strategy<Value = Signature> {
    (
        prop::collection::vec(any::<u8>(), 1..=64),
        prop::collection::vec(any::<u8>(), 1..=8),
    )
        .prop_map(|(modulus, exponent)| Signature::new(modulus, exponent))
}

/// Generate a full signature record.
pub fn signature_record() -> impl Strategy<Value = SignatureRecord> {
    (application_id(), key_timestamp(), signature())
        .prop_map(|(app, ts, sig)| SignatureRecord::new(app, ts, sig))
}

/// Generate a permission grant.
pub fn permission_grant() -> impl Strategy<Value = PermissionGrant> {
    (application_id(), group_id(), allowed_operations()).prop_map(|(app, group, ops)| {
        PermissionGrant::new(app, group, ops)
    })
}
