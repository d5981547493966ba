pub mod rowsync_error;
pub mod storage_error;

pub use rowsync_error::{RowSyncError, RowSyncResult};
pub use storage_error::StorageError;
