use super::StorageError;

/// Top-level error for every rowsync operation.
///
/// Any of these aborts the enclosing unit of work.
#[derive(Debug, thiserror::Error)]
pub enum RowSyncError {
    #[error("not authorized to modify table {table_id}: {reason}")]
    NotAuthorized { table_id: String, reason: String },

    #[error("no matching row {row_id} in table {table_id}")]
    NoMatchingRow { table_id: String, row_id: String },

    #[error("row {row_id} has checkpoints or the database is corrupt: {details}")]
    CorruptOrHasCheckpoints { row_id: String, details: String },

    #[error("row {row_id} is in a corrupt state: {details}")]
    CorruptState { row_id: String, details: String },

    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {reason}")]
    Config { reason: String },
}

pub type RowSyncResult<T> = Result<T, RowSyncError>;

impl RowSyncError {
    pub fn not_authorized(table_id: &str, reason: impl Into<String>) -> Self {
        Self::NotAuthorized {
            table_id: table_id.to_string(),
            reason: reason.into(),
        }
    }

    pub fn no_matching_row(table_id: &str, row_id: &str) -> Self {
        Self::NoMatchingRow {
            table_id: table_id.to_string(),
            row_id: row_id.to_string(),
        }
    }

    pub fn corrupt_or_checkpoints(row_id: &str, details: impl Into<String>) -> Self {
        Self::CorruptOrHasCheckpoints {
            row_id: row_id.to_string(),
            details: details.into(),
        }
    }

    pub fn corrupt_state(row_id: &str, details: impl Into<String>) -> Self {
        Self::CorruptState {
            row_id: row_id.to_string(),
            details: details.into(),
        }
    }

    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// True for authorization denials, which callers commonly surface differently.
    pub fn is_not_authorized(&self) -> bool {
        matches!(self, Self::NotAuthorized { .. })
    }
}
