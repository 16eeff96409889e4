//! SQLite implementation of the store traits.
//!
//! The primary persistent backend. Uses rusqlite with bundled SQLite; all
//! calls run under `tokio::task::spawn_blocking` so the async runtime is
//! never blocked on database I/O.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension};

use signet_core::{
    AllowedOperation, ApplicationId, GroupId, KeyTimestamp, NotFound, PermissionGrant, Signature,
    SignatureRecord,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{ApplicationStore, CreateOutcome, PermissionStore, PutOutcome, SignatureStore};

/// SQLite-based store implementation.
///
/// The connection is shared behind a mutex; each trait call clones the
/// `Arc` and does its work on a blocking thread.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database. Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on a blocking thread.
    ///
    /// Mutex poisoning and a failed blocking task both surface as
    /// `Unavailable`: the mutation did not commit and may be retried.
    async fn on_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| StoreError::Unavailable(format!("connection mutex poisoned: {e}")))?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("blocking task failed: {e}")))?
    }
}

/// Encode an operation set as CBOR for the blob column.
fn encode_operations(ops: &BTreeSet<AllowedOperation>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(ops, &mut buf)
        .map_err(|e| StoreError::Serialization(format!("encoding operations: {e}")))?;
    Ok(buf)
}

/// Decode an operation set from its CBOR blob.
fn decode_operations(blob: &[u8]) -> Result<BTreeSet<AllowedOperation>> {
    ciborium::from_reader(blob)
        .map_err(|e| StoreError::Serialization(format!("decoding operations: {e}")))
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<SignatureRecord> {
    let application: String = row.get("application")?;
    let timestamp: String = row.get("key_timestamp")?;
    let modulus: Vec<u8> = row.get("modulus")?;
    let exponent: Vec<u8> = row.get("exponent")?;

    Ok(SignatureRecord::new(
        ApplicationId::new(application),
        KeyTimestamp::new(timestamp),
        Signature::new(Bytes::from(modulus), Bytes::from(exponent)),
    ))
}

#[async_trait]
impl SignatureStore for SqliteStore {
    async fn put_signature(&self, record: &SignatureRecord) -> Result<PutOutcome> {
        let record = record.clone();

        self.on_conn(move |conn| {
            let now = now_millis();

            let existing: Option<(Vec<u8>, Vec<u8>)> = conn
                .query_row(
                    "SELECT modulus, exponent FROM application_signatures
                     WHERE application = ?1 AND key_timestamp = ?2",
                    params![record.application.as_str(), record.timestamp.as_str()],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            match existing {
                Some((modulus, exponent))
                    if modulus.as_slice() == record.signature.modulus.as_ref()
                        && exponent.as_slice() == record.signature.exponent.as_ref() =>
                {
                    Ok(PutOutcome::Unchanged)
                }
                Some(_) => {
                    conn.execute(
                        "UPDATE application_signatures
                         SET modulus = ?3, exponent = ?4, updated_at = ?5
                         WHERE application = ?1 AND key_timestamp = ?2",
                        params![
                            record.application.as_str(),
                            record.timestamp.as_str(),
                            record.signature.modulus.as_ref(),
                            record.signature.exponent.as_ref(),
                            now,
                        ],
                    )?;
                    Ok(PutOutcome::Replaced)
                }
                None => {
                    conn.execute(
                        "INSERT INTO application_signatures
                         (application, key_timestamp, modulus, exponent, created_at, updated_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                        params![
                            record.application.as_str(),
                            record.timestamp.as_str(),
                            record.signature.modulus.as_ref(),
                            record.signature.exponent.as_ref(),
                            now,
                        ],
                    )?;
                    Ok(PutOutcome::Inserted)
                }
            }
        })
        .await
    }

    async fn get_signature(
        &self,
        application: &ApplicationId,
        timestamp: &KeyTimestamp,
    ) -> Result<SignatureRecord> {
        let application = application.clone();
        let timestamp = timestamp.clone();

        self.on_conn(move |conn| {
            conn.query_row(
                "SELECT application, key_timestamp, modulus, exponent
                 FROM application_signatures
                 WHERE application = ?1 AND key_timestamp = ?2",
                params![application.as_str(), timestamp.as_str()],
                row_to_record,
            )
            .optional()?
            .ok_or_else(|| {
                StoreError::NotFound(NotFound::Signature {
                    application: application.clone(),
                    timestamp: timestamp.clone(),
                })
            })
        })
        .await
    }

    async fn list_signatures(&self, application: &ApplicationId) -> Result<Vec<SignatureRecord>> {
        let application = application.clone();

        self.on_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT application, key_timestamp, modulus, exponent
                 FROM application_signatures
                 WHERE application = ?1
                 ORDER BY key_timestamp",
            )?;

            let records = stmt
                .query_map(params![application.as_str()], row_to_record)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(records)
        })
        .await
    }

    async fn list_applications(&self) -> Result<Vec<ApplicationId>> {
        self.on_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT application FROM application_signatures ORDER BY application",
            )?;

            let apps = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(apps.into_iter().map(ApplicationId::new).collect())
        })
        .await
    }

    async fn application_exists(&self, application: &ApplicationId) -> Result<bool> {
        let application = application.clone();

        self.on_conn(move |conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM application_signatures WHERE application = ?1)",
                params![application.as_str()],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
        .await
    }

    async fn delete_all_signatures(&self, application: &ApplicationId) -> Result<u64> {
        let application = application.clone();

        self.on_conn(move |conn| {
            let removed = conn.execute(
                "DELETE FROM application_signatures WHERE application = ?1",
                params![application.as_str()],
            )?;
            Ok(removed as u64)
        })
        .await
    }
}

#[async_trait]
impl PermissionStore for SqliteStore {
    async fn create_permission(&self, grant: &PermissionGrant) -> Result<CreateOutcome> {
        let grant = grant.clone();

        self.on_conn(move |conn| {
            let existing: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT allowed_operations FROM application_permissions
                     WHERE application = ?1 AND group_id = ?2",
                    params![grant.application.as_str(), grant.group.as_str()],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(blob) = existing {
                let ops = decode_operations(&blob)?;
                return if ops == grant.allowed_operations {
                    Ok(CreateOutcome::Unchanged)
                } else {
                    Err(StoreError::Conflict {
                        application: grant.application.clone(),
                        group: grant.group.clone(),
                    })
                };
            }

            let blob = encode_operations(&grant.allowed_operations)?;
            conn.execute(
                "INSERT INTO application_permissions
                 (application, group_id, allowed_operations, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    grant.application.as_str(),
                    grant.group.as_str(),
                    blob,
                    now_millis(),
                ],
            )?;

            Ok(CreateOutcome::Created)
        })
        .await
    }

    async fn get_permissions(&self, application: &ApplicationId) -> Result<Vec<PermissionGrant>> {
        let application = application.clone();

        self.on_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT application, group_id, allowed_operations
                 FROM application_permissions
                 WHERE application = ?1
                 ORDER BY group_id",
            )?;

            let rows = stmt
                .query_map(params![application.as_str()], |row| {
                    let app: String = row.get(0)?;
                    let group: String = row.get(1)?;
                    let blob: Vec<u8> = row.get(2)?;
                    Ok((app, group, blob))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            rows.into_iter()
                .map(|(app, group, blob)| {
                    let ops = decode_operations(&blob)?;
                    Ok(PermissionGrant::new(
                        ApplicationId::new(app),
                        GroupId::new(group),
                        ops,
                    ))
                })
                .collect()
        })
        .await
    }

    async fn delete_permission(
        &self,
        application: &ApplicationId,
        group: &GroupId,
    ) -> Result<bool> {
        let application = application.clone();
        let group = group.clone();

        self.on_conn(move |conn| {
            let removed = conn.execute(
                "DELETE FROM application_permissions WHERE application = ?1 AND group_id = ?2",
                params![application.as_str(), group.as_str()],
            )?;
            Ok(removed > 0)
        })
        .await
    }

    async fn delete_all_permissions(&self, application: &ApplicationId) -> Result<u64> {
        let application = application.clone();

        self.on_conn(move |conn| {
            let removed = conn.execute(
                "DELETE FROM application_permissions WHERE application = ?1",
                params![application.as_str()],
            )?;
            Ok(removed as u64)
        })
        .await
    }
}

#[async_trait]
impl ApplicationStore for SqliteStore {
    async fn delete_application(&self, application: &ApplicationId) -> Result<(u64, u64)> {
        let application = application.clone();

        self.on_conn(move |conn| {
            // One transaction covers both tables; a failure rolls back the
            // whole delete instead of committing half of it.
            let tx = conn.unchecked_transaction()?;

            let grants_removed = tx.execute(
                "DELETE FROM application_permissions WHERE application = ?1",
                params![application.as_str()],
            )? as u64;
            let signatures_removed = tx.execute(
                "DELETE FROM application_signatures WHERE application = ?1",
                params![application.as_str()],
            )? as u64;

            tx.commit()?;
            Ok((grants_removed, signatures_removed))
        })
        .await
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(app: &str, ts: &str, modulus: &[u8]) -> SignatureRecord {
        SignatureRecord::new(
            ApplicationId::new(app),
            KeyTimestamp::new(ts),
            Signature::new(
                Bytes::copy_from_slice(modulus),
                Bytes::from_static(b"\x01\x00\x01"),
            ),
        )
    }

    #[tokio::test]
    async fn test_sqlite_put_get_roundtrip() {
        let store = SqliteStore::open_memory().unwrap();
        let rec = record("app-1", "1700000000000", b"modulus-bytes");

        assert_eq!(
            store.put_signature(&rec).await.unwrap(),
            PutOutcome::Inserted
        );
        let found = store
            .get_signature(&rec.application, &rec.timestamp)
            .await
            .unwrap();
        assert_eq!(found, rec);
    }

    #[tokio::test]
    async fn test_sqlite_put_outcomes() {
        let store = SqliteStore::open_memory().unwrap();
        let rec = record("app-1", "1", b"m1");

        assert_eq!(store.put_signature(&rec).await.unwrap(), PutOutcome::Inserted);
        assert_eq!(store.put_signature(&rec).await.unwrap(), PutOutcome::Unchanged);
        assert_eq!(
            store
                .put_signature(&record("app-1", "1", b"m2"))
                .await
                .unwrap(),
            PutOutcome::Replaced
        );
    }

    #[tokio::test]
    async fn test_sqlite_missing_signature_not_found() {
        let store = SqliteStore::open_memory().unwrap();
        let err = store
            .get_signature(&ApplicationId::new("ghost"), &KeyTimestamp::new("1"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_sqlite_list_and_delete_all() {
        let store = SqliteStore::open_memory().unwrap();
        store.put_signature(&record("app-1", "1", b"m1")).await.unwrap();
        store.put_signature(&record("app-1", "2", b"m2")).await.unwrap();
        store.put_signature(&record("app-2", "1", b"m3")).await.unwrap();

        let apps = store.list_applications().await.unwrap();
        assert_eq!(apps.len(), 2);

        let history = store
            .list_signatures(&ApplicationId::new("app-1"))
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].timestamp, KeyTimestamp::new("1"));

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
    }

    #[tokio::test]
    async fn test_sqlite_permission_roundtrip() {
        let store = SqliteStore::open_memory().unwrap();
        let grant = PermissionGrant::new(
            ApplicationId::new("app-1"),
            GroupId::new("identity-management"),
            [AllowedOperation::Read, AllowedOperation::Change],
        );

        assert_eq!(
            store.create_permission(&grant).await.unwrap(),
            CreateOutcome::Created
        );

        let grants = store.get_permissions(&grant.application).await.unwrap();
        assert_eq!(grants, vec![grant.clone()]);

        assert!(store
            .delete_permission(&grant.application, &grant.group)
            .await
            .unwrap());
        assert!(store
            .get_permissions(&grant.application)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_sqlite_permission_conflict() {
        let store = SqliteStore::open_memory().unwrap();
        let grant = PermissionGrant::new(
            ApplicationId::new("app-1"),
            GroupId::new("g"),
            [AllowedOperation::Read],
        );
        store.create_permission(&grant).await.unwrap();

        assert_eq!(
            store.create_permission(&grant).await.unwrap(),
            CreateOutcome::Unchanged
        );

        let widened = PermissionGrant::new(
            grant.application.clone(),
            grant.group.clone(),
            [AllowedOperation::Read, AllowedOperation::Delete],
        );
        assert!(matches!(
            store.create_permission(&widened).await.unwrap_err(),
            StoreError::Conflict { .. }
        ));
    }

    #[tokio::test]
    async fn test_sqlite_delete_application_clears_both_tables() {
        let store = SqliteStore::open_memory().unwrap();
        store.put_signature(&record("app-1", "1", b"m1")).await.unwrap();
        store.put_signature(&record("app-1", "2", b"m2")).await.unwrap();
        store
            .create_permission(&PermissionGrant::new(
                ApplicationId::new("app-1"),
                GroupId::new("g"),
                [AllowedOperation::Read],
            ))
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
    async fn test_sqlite_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.put_signature(&record("app-1", "1", b"m1")).await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let found = store
            .get_signature(&ApplicationId::new("app-1"), &KeyTimestamp::new("1"))
            .await
            .unwrap();
        assert_eq!(found.signature.modulus.as_ref(), b"m1");
    }
}
