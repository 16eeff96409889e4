//! Database schema migrations for SQLite.
//!
//! Simple versioned migrations: each migration is a SQL batch that moves
//! the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// Idempotent - safe to call on every open.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            tracing::debug!(version, "applying schema migration");
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Serialization(format!(
            "unknown migration version: {version}"
        ))),
    }
}

/// Migration v1: signature and permission tables.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- One row per (application, rotation epoch). Application existence
        -- is derived from this table: an application exists iff it has at
        -- least one row here.
        CREATE TABLE application_signatures (
            application TEXT NOT NULL,
            key_timestamp TEXT NOT NULL,    -- opaque rotation-epoch label
            modulus BLOB NOT NULL,
            exponent BLOB NOT NULL,
            created_at INTEGER NOT NULL,    -- Unix ms
            updated_at INTEGER NOT NULL,

            PRIMARY KEY (application, key_timestamp)
        );

        -- One row per (application, permittable endpoint group).
        CREATE TABLE application_permissions (
            application TEXT NOT NULL,
            group_id TEXT NOT NULL,
            allowed_operations BLOB NOT NULL,  -- CBOR-encoded operation set
            created_at INTEGER NOT NULL,

            PRIMARY KEY (application, group_id)
        );

        CREATE INDEX idx_signatures_application ON application_signatures(application);
        CREATE INDEX idx_permissions_application ON application_permissions(application);
        "#,
    )?;

    Ok(())
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

    #[test]
    fn test_migration_creates_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"application_signatures".to_string()));
        assert!(tables.contains(&"application_permissions".to_string()));
        assert!(tables.contains(&"schema_migrations".to_string()));
    }

    #[test]
    fn test_migration_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();

        let version: u32 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }
}
