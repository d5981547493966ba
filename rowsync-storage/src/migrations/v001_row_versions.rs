//! v001: row_versions. One physical record per row version; user columns live in values_json.

use rusqlite::Connection;

use rowsync_core::errors::RowSyncResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> RowSyncResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS row_versions (
            seq                 INTEGER PRIMARY KEY AUTOINCREMENT,
            table_id            TEXT NOT NULL,
            row_id              TEXT NOT NULL,
            row_etag            TEXT,
            sync_state          TEXT NOT NULL,
            conflict_type       INTEGER,
            filter_type         TEXT NOT NULL DEFAULT 'DEFAULT',
            filter_value        TEXT,
            savepoint_type      TEXT,
            savepoint_timestamp TEXT NOT NULL,
            savepoint_creator   TEXT,
            form_id             TEXT,
            locale              TEXT,
            values_json         TEXT NOT NULL DEFAULT '{}'
        );

        CREATE INDEX IF NOT EXISTS idx_row_versions_row
            ON row_versions(table_id, row_id);
        CREATE INDEX IF NOT EXISTS idx_row_versions_timestamp
            ON row_versions(table_id, savepoint_timestamp);
        CREATE INDEX IF NOT EXISTS idx_row_versions_conflicts
            ON row_versions(table_id, row_id, conflict_type) WHERE conflict_type IS NOT NULL;
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
