/// Storage-layer errors for SQLite and filesystem operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("migration failed at version {version}: {reason}")]
    MigrationFailed { version: u32, reason: String },

    #[error("stored value could not be decoded: {details}")]
    Decode { details: String },

    #[error("transaction misuse: {details}")]
    Transaction { details: String },

    #[error("attachment I/O failed for {path}: {reason}")]
    Attachment { path: String, reason: String },
}
