//! `SqliteTableStore`: the collaborator traits over one borrowed connection.

use rusqlite::Connection;
use tracing::debug;

use rowsync_core::errors::{RowSyncError, RowSyncResult, StorageError};
use rowsync_core::row::{ColumnDefinition, RowVersion};
use rowsync_core::security::TableSecuritySettings;
use rowsync_core::traits::{
    RowPatch, RowPredicate, RowStore, SchemaProvider, TableMetadataStore,
};

use crate::queries::{metadata_ops, row_ops};
use crate::to_storage_err;

/// Row store, metadata store, and schema provider sharing one connection,
/// so engine reads and writes land in the same transaction.
pub struct SqliteTableStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteTableStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn put_security_settings(&self, settings: &TableSecuritySettings) -> RowSyncResult<()> {
        metadata_ops::put_security_settings(self.conn, settings)
    }

    pub fn define_columns(&self, table_id: &str, columns: &[ColumnDefinition]) -> RowSyncResult<()> {
        metadata_ops::put_columns(self.conn, table_id, columns)
    }

    pub fn count_versions(&self, table_id: &str, row_id: &str) -> RowSyncResult<usize> {
        row_ops::count_versions(self.conn, table_id, row_id)
    }

    fn transaction_err(details: &str) -> RowSyncError {
        RowSyncError::Storage(StorageError::Transaction {
            details: details.to_string(),
        })
    }
}

impl RowStore for SqliteTableStore<'_> {
    fn query(&self, table_id: &str, predicate: &RowPredicate) -> RowSyncResult<Vec<RowVersion>> {
        row_ops::query_rows(self.conn, table_id, predicate)
    }

    fn insert(&self, row: &RowVersion) -> RowSyncResult<()> {
        row_ops::insert_row(self.conn, row)
    }

    fn update(
        &self,
        table_id: &str,
        predicate: &RowPredicate,
        patch: &RowPatch,
    ) -> RowSyncResult<usize> {
        row_ops::update_rows(self.conn, table_id, predicate, patch)
    }

    fn delete(&self, table_id: &str, predicate: &RowPredicate) -> RowSyncResult<usize> {
        row_ops::delete_rows(self.conn, table_id, predicate)
    }

    fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    fn begin_transaction(&self) -> RowSyncResult<()> {
        if self.in_transaction() {
            return Err(Self::transaction_err("a transaction is already open"));
        }
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| to_storage_err(e.to_string()))?;
        debug!("transaction begun");
        Ok(())
    }

    fn commit_transaction(&self) -> RowSyncResult<()> {
        if !self.in_transaction() {
            return Err(Self::transaction_err("no transaction to commit"));
        }
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| to_storage_err(e.to_string()))
    }

    fn rollback_transaction(&self) -> RowSyncResult<()> {
        if !self.in_transaction() {
            return Err(Self::transaction_err("no transaction to roll back"));
        }
        self.conn
            .execute_batch("ROLLBACK")
            .map_err(|e| to_storage_err(e.to_string()))
    }
}

impl TableMetadataStore for SqliteTableStore<'_> {
    fn security_settings(&self, table_id: &str) -> RowSyncResult<TableSecuritySettings> {
        metadata_ops::get_security_settings(self.conn, table_id)
    }
}

impl SchemaProvider for SqliteTableStore<'_> {
    fn columns(&self, table_id: &str) -> RowSyncResult<Vec<ColumnDefinition>> {
        metadata_ops::get_columns(self.conn, table_id)
    }
}
