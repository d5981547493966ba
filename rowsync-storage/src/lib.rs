//! # rowsync-storage
//!
//! SQLite persistence for row versions, table security settings, and column
//! schemas, plus filesystem attachment cleanup.

pub mod attachments;
pub mod connection;
pub mod engine;
pub mod migrations;
pub mod queries;
pub mod store;

pub use attachments::FsAttachmentStore;
pub use engine::StorageEngine;
pub use store::SqliteTableStore;

use rowsync_core::errors::{RowSyncError, StorageError};

/// Wrap a driver message as a storage error.
pub fn to_storage_err(message: String) -> RowSyncError {
    RowSyncError::Storage(StorageError::SqliteError { message })
}
