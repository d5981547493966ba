//! Versioned schema migrations tracked through `PRAGMA user_version`.

pub mod v001_row_versions;
pub mod v002_table_metadata;

use rusqlite::Connection;
use tracing::info;

use rowsync_core::errors::{RowSyncError, RowSyncResult, StorageError};

use crate::to_storage_err;

type MigrationFn = fn(&Connection) -> RowSyncResult<()>;

const MIGRATIONS: [(u32, MigrationFn); 2] = [
    (1, v001_row_versions::migrate),
    (2, v002_table_metadata::migrate),
];

/// Latest schema version known to this build.
pub const LATEST_VERSION: u32 = 2;

pub fn current_version(conn: &Connection) -> RowSyncResult<u32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))
}

/// Apply every migration newer than the database's recorded version.
pub fn run_migrations(conn: &Connection) -> RowSyncResult<()> {
    let from = current_version(conn)?;
    for (version, migrate) in MIGRATIONS.iter().filter(|(v, _)| *v > from) {
        migrate(conn).map_err(|e| {
            RowSyncError::Storage(StorageError::MigrationFailed {
                version: *version,
                reason: e.to_string(),
            })
        })?;
        conn.pragma_update(None, "user_version", version)
            .map_err(|e| to_storage_err(e.to_string()))?;
        info!(version, "applied migration");
    }
    Ok(())
}
