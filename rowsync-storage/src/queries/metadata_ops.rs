//! Table security settings and column schema persistence.

use rusqlite::{params, Connection, OptionalExtension};

use rowsync_core::errors::{RowSyncError, RowSyncResult, StorageError};
use rowsync_core::row::{ColumnDefinition, ElementDataType, FilterType};
use rowsync_core::security::TableSecuritySettings;

use crate::to_storage_err;

/// Stored settings, or the defaults when the table has none.
pub fn get_security_settings(
    conn: &Connection,
    table_id: &str,
) -> RowSyncResult<TableSecuritySettings> {
    let stored = conn
        .query_row(
            "SELECT is_locked, can_unverified_user_create, filter_type_on_creation
             FROM table_security WHERE table_id = ?1",
            params![table_id],
            |row| {
                Ok((
                    row.get::<_, bool>(0)?,
                    row.get::<_, bool>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    match stored {
        None => Ok(TableSecuritySettings::for_table(table_id)),
        Some((is_locked, can_unverified_user_create, filter_type)) => {
            let filter_type_on_creation: FilterType = filter_type.parse().map_err(|e| {
                RowSyncError::Storage(StorageError::Decode {
                    details: format!("filter_type_on_creation of {table_id}: {e}"),
                })
            })?;
            Ok(TableSecuritySettings {
                table_id: table_id.to_string(),
                is_locked,
                can_unverified_user_create,
                filter_type_on_creation,
            })
        }
    }
}

pub fn put_security_settings(
    conn: &Connection,
    settings: &TableSecuritySettings,
) -> RowSyncResult<()> {
    conn.execute(
        "INSERT INTO table_security
         (table_id, is_locked, can_unverified_user_create, filter_type_on_creation)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(table_id) DO UPDATE SET
            is_locked = excluded.is_locked,
            can_unverified_user_create = excluded.can_unverified_user_create,
            filter_type_on_creation = excluded.filter_type_on_creation",
        params![
            settings.table_id,
            settings.is_locked,
            settings.can_unverified_user_create,
            settings.filter_type_on_creation.as_str(),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn get_columns(conn: &Connection, table_id: &str) -> RowSyncResult<Vec<ColumnDefinition>> {
    let mut stmt = conn
        .prepare(
            "SELECT element_key, data_type, retained FROM table_columns
             WHERE table_id = ?1 ORDER BY position ASC",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let raw = stmt
        .query_map(params![table_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, bool>(2)?,
            ))
        })
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| to_storage_err(e.to_string()))?;

    raw.into_iter()
        .map(|(element_key, data_type, retained)| {
            let data_type: ElementDataType = data_type.parse().map_err(|e| {
                RowSyncError::Storage(StorageError::Decode {
                    details: format!("data type of {table_id}.{element_key}: {e}"),
                })
            })?;
            Ok(ColumnDefinition {
                element_key,
                data_type,
                retained,
            })
        })
        .collect()
}

/// Replace a table's column schema.
pub fn put_columns(
    conn: &Connection,
    table_id: &str,
    columns: &[ColumnDefinition],
) -> RowSyncResult<()> {
    conn.execute(
        "DELETE FROM table_columns WHERE table_id = ?1",
        params![table_id],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    for (position, column) in columns.iter().enumerate() {
        conn.execute(
            "INSERT INTO table_columns (table_id, element_key, data_type, retained, position)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                table_id,
                column.element_key,
                column.data_type.as_str(),
                column.retained,
                position as i64,
            ],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    }
    Ok(())
}
