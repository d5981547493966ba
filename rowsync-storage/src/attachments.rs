//! Filesystem attachment store. Each row's files live under
//! `<root>/<table_id>/instances/<row_id>/`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use rowsync_core::config::StorageConfig;
use rowsync_core::errors::{RowSyncError, RowSyncResult, StorageError};
use rowsync_core::traits::AttachmentStore;

pub struct FsAttachmentStore {
    root: PathBuf,
}

impl FsAttachmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Attachment store rooted at `attachments_root`.
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.attachments_root)
    }

    /// Directory holding one row's attachments. Path separators in ids are flattened.
    pub fn row_dir(&self, table_id: &str, row_id: &str) -> PathBuf {
        self.root
            .join(sanitize(table_id))
            .join("instances")
            .join(sanitize(row_id))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '.' => '_',
            other => other,
        })
        .collect()
}

impl AttachmentStore for FsAttachmentStore {
    fn delete_all_for_row(&self, table_id: &str, row_id: &str) -> RowSyncResult<()> {
        let dir = self.row_dir(table_id, row_id);
        match fs::remove_dir_all(&dir) {
            Ok(()) => {
                debug!(table = %table_id, row = %row_id, "attachments removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RowSyncError::Storage(StorageError::Attachment {
                path: dir.display().to_string(),
                reason: e.to_string(),
            })),
        }
    }
}
