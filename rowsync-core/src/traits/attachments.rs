use crate::errors::RowSyncResult;

/// Filesystem holding the attachment files of each row.
pub trait AttachmentStore: Send + Sync {
    /// Remove every attachment of a row. A row without attachments is not an error.
    fn delete_all_for_row(&self, table_id: &str, row_id: &str) -> RowSyncResult<()>;
}
