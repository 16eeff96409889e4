//! In-memory implementation of the store traits.
//!
//! Primarily for tests. Same semantics as SQLite but everything lives in
//! memory with no persistence.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use async_trait::async_trait;

use signet_core::{
    AllowedOperation, ApplicationId, GroupId, KeyTimestamp, NotFound, PermissionGrant, Signature,
    SignatureRecord,
};

use crate::error::{Result, StoreError};
use crate::traits::{ApplicationStore, CreateOutcome, PermissionStore, PutOutcome, SignatureStore};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
/// BTreeMap keys give the sorted enumeration order the traits require.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

struct MemoryStoreInner {
    /// Signature material keyed by (application, timestamp).
    signatures: BTreeMap<(ApplicationId, KeyTimestamp), Signature>,

    /// Allowed operations keyed by (application, group).
    permissions: BTreeMap<(ApplicationId, GroupId), BTreeSet<AllowedOperation>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner {
                signatures: BTreeMap::new(),
                permissions: BTreeMap::new(),
            }),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Unavailable(format!("store lock poisoned: {e}")))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Unavailable(format!("store lock poisoned: {e}")))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignatureStore for MemoryStore {
    async fn put_signature(&self, record: &SignatureRecord) -> Result<PutOutcome> {
        let mut inner = self.write()?;
        let key = (record.application.clone(), record.timestamp.clone());

        let outcome = match inner.signatures.get(&key) {
            Some(existing) if existing == &record.signature => PutOutcome::Unchanged,
            Some(_) => PutOutcome::Replaced,
            None => PutOutcome::Inserted,
        };

        if outcome != PutOutcome::Unchanged {
            inner.signatures.insert(key, record.signature.clone());
        }

        Ok(outcome)
    }

    async fn get_signature(
        &self,
        application: &ApplicationId,
        timestamp: &KeyTimestamp,
    ) -> Result<SignatureRecord> {
        let inner = self.read()?;
        let key = (application.clone(), timestamp.clone());

        inner
            .signatures
            .get(&key)
            .map(|signature| SignatureRecord::new(application.clone(), timestamp.clone(), signature.clone()))
            .ok_or_else(|| {
                StoreError::NotFound(NotFound::Signature {
                    application: application.clone(),
                    timestamp: timestamp.clone(),
                })
            })
    }

    async fn list_signatures(&self, application: &ApplicationId) -> Result<Vec<SignatureRecord>> {
        let inner = self.read()?;

        Ok(inner
            .signatures
            .iter()
            .filter(|((app, _), _)| app == application)
            .map(|((app, ts), signature)| {
                SignatureRecord::new(app.clone(), ts.clone(), signature.clone())
            })
            .collect())
    }

    async fn list_applications(&self) -> Result<Vec<ApplicationId>> {
        let inner = self.read()?;

        let mut apps: Vec<ApplicationId> = inner
            .signatures
            .keys()
            .map(|(app, _)| app.clone())
            .collect();
        apps.dedup();
        Ok(apps)
    }

    async fn application_exists(&self, application: &ApplicationId) -> Result<bool> {
        let inner = self.read()?;
        Ok(inner
            .signatures
            .keys()
            .any(|(app, _)| app == application))
    }

    async fn delete_all_signatures(&self, application: &ApplicationId) -> Result<u64> {
        let mut inner = self.write()?;
        let before = inner.signatures.len();
        inner.signatures.retain(|(app, _), _| app != application);
        Ok((before - inner.signatures.len()) as u64)
    }
}

#[async_trait]
impl PermissionStore for MemoryStore {
    async fn create_permission(&self, grant: &PermissionGrant) -> Result<CreateOutcome> {
        let mut inner = self.write()?;
        let key = (grant.application.clone(), grant.group.clone());

        match inner.permissions.get(&key) {
            Some(existing) if existing == &grant.allowed_operations => Ok(CreateOutcome::Unchanged),
            Some(_) => Err(StoreError::Conflict {
                application: grant.application.clone(),
                group: grant.group.clone(),
            }),
            None => {
                inner
                    .permissions
                    .insert(key, grant.allowed_operations.clone());
                Ok(CreateOutcome::Created)
            }
        }
    }

    async fn get_permissions(&self, application: &ApplicationId) -> Result<Vec<PermissionGrant>> {
        let inner = self.read()?;

        Ok(inner
            .permissions
            .iter()
            .filter(|((app, _), _)| app == application)
            .map(|((app, group), ops)| {
                PermissionGrant::new(app.clone(), group.clone(), ops.iter().copied())
            })
            .collect())
    }

    async fn delete_permission(
        &self,
        application: &ApplicationId,
        group: &GroupId,
    ) -> Result<bool> {
        let mut inner = self.write()?;
        let key = (application.clone(), group.clone());
        Ok(inner.permissions.remove(&key).is_some())
    }

    async fn delete_all_permissions(&self, application: &ApplicationId) -> Result<u64> {
        let mut inner = self.write()?;
        let before = inner.permissions.len();
        inner.permissions.retain(|(app, _), _| app != application);
        Ok((before - inner.permissions.len()) as u64)
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn delete_application(&self, application: &ApplicationId) -> Result<(u64, u64)> {
        // Both maps are cleared under one write guard, so no reader can
        // observe grants without signatures or vice versa.
        let mut inner = self.write()?;

        let grants_before = inner.permissions.len();
        inner.permissions.retain(|(app, _), _| app != application);
        let grants_removed = (grants_before - inner.permissions.len()) as u64;

        let signatures_before = inner.signatures.len();
        inner.signatures.retain(|(app, _), _| app != application);
        let signatures_removed = (signatures_before - inner.signatures.len()) as u64;

        Ok((grants_removed, signatures_removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn record(app: &str, ts: &str, modulus: &[u8]) -> SignatureRecord {
        SignatureRecord::new(
            ApplicationId::new(app),
            KeyTimestamp::new(ts),
            Signature::new(Bytes::copy_from_slice(modulus), Bytes::from_static(b"\x01\x00\x01")),
        )
    }

    fn grant(app: &str, group: &str, ops: &[AllowedOperation]) -> PermissionGrant {
        PermissionGrant::new(
            ApplicationId::new(app),
            GroupId::new(group),
            ops.iter().copied(),
        )
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let store = MemoryStore::new();
        let rec = record("app-1", "1000", b"modulus");

        let outcome = store.put_signature(&rec).await.unwrap();
        assert_eq!(outcome, PutOutcome::Inserted);

        let found = store
            .get_signature(&rec.application, &rec.timestamp)
            .await
            .unwrap();
        assert_eq!(found, rec);
    }

    #[tokio::test]
    async fn test_put_idempotent_then_replace() {
        let store = MemoryStore::new();
        let rec = record("app-1", "1000", b"modulus");

        assert_eq!(store.put_signature(&rec).await.unwrap(), PutOutcome::Inserted);
        assert_eq!(store.put_signature(&rec).await.unwrap(), PutOutcome::Unchanged);

        let rotated = record("app-1", "1000", b"other-modulus");
        assert_eq!(
            store.put_signature(&rotated).await.unwrap(),
            PutOutcome::Replaced
        );
        let found = store
            .get_signature(&rec.application, &rec.timestamp)
            .await
            .unwrap();
        assert_eq!(found.signature, rotated.signature);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .get_signature(&ApplicationId::new("ghost"), &KeyTimestamp::new("1"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_applications_distinct_sorted() {
        let store = MemoryStore::new();
        store.put_signature(&record("b-app", "1", b"m1")).await.unwrap();
        store.put_signature(&record("a-app", "1", b"m2")).await.unwrap();
        store.put_signature(&record("a-app", "2", b"m3")).await.unwrap();

        let apps = store.list_applications().await.unwrap();
        assert_eq!(
            apps,
            vec![ApplicationId::new("a-app"), ApplicationId::new("b-app")]
        );
    }

    #[tokio::test]
    async fn test_delete_all_signatures() {
        let store = MemoryStore::new();
        store.put_signature(&record("app-1", "1", b"m1")).await.unwrap();
        store.put_signature(&record("app-1", "2", b"m2")).await.unwrap();
        store.put_signature(&record("app-2", "1", b"m3")).await.unwrap();

        assert_eq!(
            store
                .delete_all_signatures(&ApplicationId::new("app-1"))
                .await
                .unwrap(),
            2
        );
        assert!(!store
            .application_exists(&ApplicationId::new("app-1"))
            .await
            .unwrap());
        assert!(store
            .application_exists(&ApplicationId::new("app-2"))
            .await
            .unwrap());

        // Idempotent
        assert_eq!(
            store
                .delete_all_signatures(&ApplicationId::new("app-1"))
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_delete_application_clears_both_sides() {
        let store = MemoryStore::new();
        store.put_signature(&record("app-1", "1", b"m1")).await.unwrap();
        store.put_signature(&record("app-1", "2", b"m2")).await.unwrap();
        store
            .create_permission(&grant("app-1", "g", &[AllowedOperation::Read]))
            .await
            .unwrap();
        store.put_signature(&record("app-2", "1", b"m3")).await.unwrap();
        store
            .create_permission(&grant("app-2", "g", &[AllowedOperation::Read]))
            .await
            .unwrap();

        assert_eq!(
            store
                .delete_application(&ApplicationId::new("app-1"))
                .await
                .unwrap(),
            (1, 2)
        );
        assert!(!store
            .application_exists(&ApplicationId::new("app-1"))
            .await
            .unwrap());
        assert!(store
            .get_permissions(&ApplicationId::new("app-1"))
            .await
            .unwrap()
            .is_empty());

        // Unrelated applications keep their state.
        assert!(store
            .application_exists(&ApplicationId::new("app-2"))
            .await
            .unwrap());
        assert_eq!(
            store
                .get_permissions(&ApplicationId::new("app-2"))
                .await
                .unwrap()
                .len(),
            1
        );

        // Idempotent
        assert_eq!(
            store
                .delete_application(&ApplicationId::new("app-1"))
                .await
                .unwrap(),
            (0, 0)
        );
    }

    #[tokio::test]
    async fn test_permission_create_conflict_and_idempotence() {
        let store = MemoryStore::new();
        let g = grant("app-1", "identity-management", &[AllowedOperation::Read]);

        assert_eq!(
            store.create_permission(&g).await.unwrap(),
            CreateOutcome::Created
        );
        assert_eq!(
            store.create_permission(&g).await.unwrap(),
            CreateOutcome::Unchanged
        );

        let different = grant(
            "app-1",
            "identity-management",
            &[AllowedOperation::Read, AllowedOperation::Change],
        );
        let err = store.create_permission(&different).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_permission_delete_idempotent() {
        let store = MemoryStore::new();
        let g = grant("app-1", "g", &[AllowedOperation::Read]);
        store.create_permission(&g).await.unwrap();

        assert!(store
            .delete_permission(&g.application, &g.group)
            .await
            .unwrap());
        assert!(!store
            .delete_permission(&g.application, &g.group)
            .await
            .unwrap());
        assert!(store.get_permissions(&g.application).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_permissions_sorted_by_group() {
        let store = MemoryStore::new();
        store
            .create_permission(&grant("app-1", "z-group", &[AllowedOperation::Read]))
            .await
            .unwrap();
        store
            .create_permission(&grant("app-1", "a-group", &[AllowedOperation::Delete]))
            .await
            .unwrap();

        let grants = store
            .get_permissions(&ApplicationId::new("app-1"))
            .await
            .unwrap();
        assert_eq!(grants.len(), 2);
        assert_eq!(grants[0].group, GroupId::new("a-group"));
        assert_eq!(grants[1].group, GroupId::new("z-group"));
    }
}
