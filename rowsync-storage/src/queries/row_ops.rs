//! Row-version CRUD against the row_versions table.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

use rowsync_core::errors::{RowSyncError, RowSyncResult, StorageError};
use rowsync_core::row::{
    format_timestamp, parse_timestamp, ConflictType, RowValues, RowVersion, SavepointType,
};
use rowsync_core::traits::{RowPatch, RowPredicate, VersionScope};

use crate::to_storage_err;

const SELECT_COLUMNS: &str = "row_id, table_id, row_etag, sync_state, conflict_type, \
     filter_type, filter_value, savepoint_type, savepoint_timestamp, savepoint_creator, \
     form_id, locale, values_json";

/// WHERE clause and bound parameters for a predicate.
fn where_clause(table_id: &str, predicate: &RowPredicate) -> (String, Vec<Value>) {
    let mut sql = String::from("table_id = ?");
    let mut params: Vec<Value> = vec![Value::Text(table_id.to_string())];

    if let Some(row_id) = &predicate.row_id {
        sql.push_str(" AND row_id = ?");
        params.push(Value::Text(row_id.clone()));
    }

    match &predicate.scope {
        VersionScope::All => {}
        VersionScope::Checkpoints => sql.push_str(" AND savepoint_type IS NULL"),
        VersionScope::InConflict => sql.push_str(" AND conflict_type IS NOT NULL"),
        VersionScope::ServerConflicts => {
            sql.push_str(" AND conflict_type IN (?, ?)");
            params.push(Value::Integer(
                ConflictType::ServerDeletedOldValues.code().into(),
            ));
            params.push(Value::Integer(
                ConflictType::ServerUpdatedUpdatedValues.code().into(),
            ));
        }
        VersionScope::ConflictType(conflict_type) => {
            sql.push_str(" AND conflict_type = ?");
            params.push(Value::Integer(conflict_type.code().into()));
        }
        VersionScope::AtTimestamp(ts) => {
            sql.push_str(" AND savepoint_timestamp = ?");
            params.push(Value::Text(format_timestamp(ts)));
        }
        VersionScope::ExceptTimestamp(ts) => {
            sql.push_str(" AND savepoint_timestamp <> ?");
            params.push(Value::Text(format_timestamp(ts)));
        }
    }

    (sql, params)
}

fn decode_err(details: String) -> RowSyncError {
    RowSyncError::Storage(StorageError::Decode { details })
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<RawVersion> {
    Ok(RawVersion {
        row_id: row.get(0)?,
        table_id: row.get(1)?,
        row_etag: row.get(2)?,
        sync_state: row.get(3)?,
        conflict_type: row.get(4)?,
        filter_type: row.get(5)?,
        filter_value: row.get(6)?,
        savepoint_type: row.get(7)?,
        savepoint_timestamp: row.get(8)?,
        savepoint_creator: row.get(9)?,
        form_id: row.get(10)?,
        locale: row.get(11)?,
        values_json: row.get(12)?,
    })
}

/// Columns as stored, before enum decoding.
struct RawVersion {
    row_id: String,
    table_id: String,
    row_etag: Option<String>,
    sync_state: String,
    conflict_type: Option<i32>,
    filter_type: String,
    filter_value: Option<String>,
    savepoint_type: Option<String>,
    savepoint_timestamp: String,
    savepoint_creator: Option<String>,
    form_id: Option<String>,
    locale: Option<String>,
    values_json: String,
}

impl RawVersion {
    fn decode(self) -> RowSyncResult<RowVersion> {
        let values: RowValues = serde_json::from_str(&self.values_json)
            .map_err(|e| decode_err(format!("values of row {}: {e}", self.row_id)))?;
        let bad = |field: &str, e: RowSyncError| {
            decode_err(format!("{field} of row {}: {e}", self.row_id))
        };
        Ok(RowVersion {
            sync_state: self.sync_state.parse().map_err(|e| bad("sync_state", e))?,
            conflict_type: self
                .conflict_type
                .map(ConflictType::from_code)
                .transpose()
                .map_err(|e| bad("conflict_type", e))?,
            filter_type: self.filter_type.parse().map_err(|e| bad("filter_type", e))?,
            savepoint_type: self
                .savepoint_type
                .as_deref()
                .map(str::parse::<SavepointType>)
                .transpose()
                .map_err(|e| bad("savepoint_type", e))?,
            savepoint_timestamp: parse_timestamp(&self.savepoint_timestamp)
                .map_err(|e| bad("savepoint_timestamp", e))?,
            row_etag: self.row_etag,
            filter_value: self.filter_value,
            savepoint_creator: self.savepoint_creator,
            form_id: self.form_id,
            locale: self.locale,
            values,
            table_id: self.table_id,
            row_id: self.row_id,
        })
    }
}

/// Matching versions ordered by savepoint timestamp, then conflict-type ordinal.
pub fn query_rows(
    conn: &Connection,
    table_id: &str,
    predicate: &RowPredicate,
) -> RowSyncResult<Vec<RowVersion>> {
    let (clause, params) = where_clause(table_id, predicate);
    let sql = format!(
        "SELECT {SELECT_COLUMNS} FROM row_versions WHERE {clause}
         ORDER BY savepoint_timestamp ASC, COALESCE(conflict_type, -1) ASC, seq ASC"
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let raw = stmt
        .query_map(params_from_iter(params), map_row)
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| to_storage_err(e.to_string()))?;
    raw.into_iter().map(RawVersion::decode).collect()
}

pub fn insert_row(conn: &Connection, row: &RowVersion) -> RowSyncResult<()> {
    let values_json = serde_json::to_string(&row.values)?;
    conn.execute(
        "INSERT INTO row_versions
         (row_id, table_id, row_etag, sync_state, conflict_type, filter_type, filter_value,
          savepoint_type, savepoint_timestamp, savepoint_creator, form_id, locale, values_json)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            row.row_id,
            row.table_id,
            row.row_etag,
            row.sync_state.as_str(),
            row.conflict_type.map(|c| c.code()),
            row.filter_type.as_str(),
            row.filter_value,
            row.savepoint_type.map(|s| s.as_str()),
            format_timestamp(&row.savepoint_timestamp),
            row.savepoint_creator,
            row.form_id,
            row.locale,
            values_json,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

fn opt_text(value: &Option<String>) -> Value {
    match value {
        Some(text) => Value::Text(text.clone()),
        None => Value::Null,
    }
}

/// SET assignments and their parameters for a patch.
fn set_clause(patch: &RowPatch) -> RowSyncResult<(Vec<&'static str>, Vec<Value>)> {
    let mut sets = Vec::new();
    let mut params = Vec::new();

    if let Some(v) = &patch.row_etag {
        sets.push("row_etag = ?");
        params.push(opt_text(v));
    }
    if let Some(v) = patch.sync_state {
        sets.push("sync_state = ?");
        params.push(Value::Text(v.as_str().to_string()));
    }
    if let Some(v) = patch.conflict_type {
        sets.push("conflict_type = ?");
        params.push(match v {
            Some(c) => Value::Integer(c.code().into()),
            None => Value::Null,
        });
    }
    if let Some(v) = patch.filter_type {
        sets.push("filter_type = ?");
        params.push(Value::Text(v.as_str().to_string()));
    }
    if let Some(v) = &patch.filter_value {
        sets.push("filter_value = ?");
        params.push(opt_text(v));
    }
    if let Some(v) = patch.savepoint_type {
        sets.push("savepoint_type = ?");
        params.push(opt_text(&v.map(|s| s.as_str().to_string())));
    }
    if let Some(v) = &patch.savepoint_timestamp {
        sets.push("savepoint_timestamp = ?");
        params.push(Value::Text(format_timestamp(v)));
    }
    if let Some(v) = &patch.savepoint_creator {
        sets.push("savepoint_creator = ?");
        params.push(opt_text(v));
    }
    if let Some(v) = &patch.form_id {
        sets.push("form_id = ?");
        params.push(opt_text(v));
    }
    if let Some(v) = &patch.locale {
        sets.push("locale = ?");
        params.push(opt_text(v));
    }
    if let Some(v) = &patch.values {
        sets.push("values_json = ?");
        params.push(Value::Text(serde_json::to_string(v)?));
    }

    Ok((sets, params))
}

pub fn update_rows(
    conn: &Connection,
    table_id: &str,
    predicate: &RowPredicate,
    patch: &RowPatch,
) -> RowSyncResult<usize> {
    let (sets, mut params) = set_clause(patch)?;
    if sets.is_empty() {
        return Ok(0);
    }
    let (clause, where_params) = where_clause(table_id, predicate);
    params.extend(where_params);
    let sql = format!(
        "UPDATE row_versions SET {} WHERE {clause}",
        sets.join(", ")
    );
    conn.execute(&sql, params_from_iter(params))
        .map_err(|e| to_storage_err(e.to_string()))
}

pub fn delete_rows(
    conn: &Connection,
    table_id: &str,
    predicate: &RowPredicate,
) -> RowSyncResult<usize> {
    let (clause, params) = where_clause(table_id, predicate);
    conn.execute(
        &format!("DELETE FROM row_versions WHERE {clause}"),
        params_from_iter(params),
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

/// Number of stored versions of one row.
pub fn count_versions(conn: &Connection, table_id: &str, row_id: &str) -> RowSyncResult<usize> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM row_versions WHERE table_id = ?1 AND row_id = ?2",
            params![table_id, row_id],
            |row| row.get(0),
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(count as usize)
}
