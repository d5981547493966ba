//! Single write connection behind a mutex. All row mutations are serialized through it.

pub mod pragmas;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::warn;

use rowsync_core::errors::RowSyncResult;

use crate::to_storage_err;
use pragmas::{apply_pragmas, verify_wal_mode};

/// The one writer of a database file.
pub struct WriteConnection {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl WriteConnection {
    /// Open a write connection to the given database path.
    pub fn open(path: &Path, busy_timeout_ms: u32) -> RowSyncResult<Self> {
        let conn = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn, busy_timeout_ms)?;
        if !verify_wal_mode(&conn)? {
            warn!(path = %path.display(), "database is not in WAL mode");
        }
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> RowSyncResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn, 0)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Acquire the write lock and execute a closure with the connection.
    pub fn with_conn<F, T>(&self, f: F) -> RowSyncResult<T>
    where
        F: FnOnce(&Connection) -> RowSyncResult<T>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|_| to_storage_err("write lock poisoned".to_string()))?;
        f(&guard)
    }

    /// Whether the connection journals in WAL mode.
    pub fn wal_enabled(&self) -> RowSyncResult<bool> {
        self.with_conn(verify_wal_mode)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
