//! v002: table_security, table_columns.

use rusqlite::Connection;

use rowsync_core::errors::RowSyncResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> RowSyncResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS table_security (
            table_id                   TEXT PRIMARY KEY,
            is_locked                  INTEGER NOT NULL DEFAULT 0,
            can_unverified_user_create INTEGER NOT NULL DEFAULT 1,
            filter_type_on_creation    TEXT NOT NULL DEFAULT 'DEFAULT'
        );

        CREATE TABLE IF NOT EXISTS table_columns (
            table_id    TEXT NOT NULL,
            element_key TEXT NOT NULL,
            data_type   TEXT NOT NULL,
            retained    INTEGER NOT NULL DEFAULT 1,
            position    INTEGER NOT NULL,
            PRIMARY KEY (table_id, element_key)
        );
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
