use crate::errors::RowSyncResult;
use crate::row::ColumnDefinition;
use crate::security::TableSecuritySettings;

/// Key-value table metadata the access policy consumes.
pub trait TableMetadataStore {
    /// Settings for a table. Tables with nothing stored get the defaults.
    fn security_settings(&self, table_id: &str) -> RowSyncResult<TableSecuritySettings>;
}

/// Column schema of user tables.
pub trait SchemaProvider {
    fn columns(&self, table_id: &str) -> RowSyncResult<Vec<ColumnDefinition>>;
}
