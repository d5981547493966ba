//! StorageEngine: owns the write connection, runs migrations at startup,
//! and lends out `SqliteTableStore` views.

use std::path::Path;

use tracing::info;

use rowsync_core::config::StorageConfig;
use rowsync_core::errors::RowSyncResult;

use crate::connection::WriteConnection;
use crate::migrations;
use crate::store::SqliteTableStore;

pub struct StorageEngine {
    writer: WriteConnection,
}

impl StorageEngine {
    /// Open a storage engine backed by a file on disk.
    pub fn open(path: &Path, busy_timeout_ms: u32) -> RowSyncResult<Self> {
        let engine = Self {
            writer: WriteConnection::open(path, busy_timeout_ms)?,
        };
        engine.initialize()?;
        info!(path = %path.display(), "storage opened");
        Ok(engine)
    }

    pub fn from_config(config: &StorageConfig) -> RowSyncResult<Self> {
        Self::open(Path::new(&config.db_path), config.busy_timeout_ms)
    }

    /// Open an in-memory storage engine (for testing).
    pub fn open_in_memory() -> RowSyncResult<Self> {
        let engine = Self {
            writer: WriteConnection::open_in_memory()?,
        };
        engine.initialize()?;
        Ok(engine)
    }

    fn initialize(&self) -> RowSyncResult<()> {
        self.writer.with_conn(migrations::run_migrations)
    }

    /// Run a closure against a store bound to the write connection.
    pub fn with_store<F, T>(&self, f: F) -> RowSyncResult<T>
    where
        F: FnOnce(&SqliteTableStore<'_>) -> RowSyncResult<T>,
    {
        self.writer.with_conn(|conn| f(&SqliteTableStore::new(conn)))
    }

    pub fn wal_enabled(&self) -> RowSyncResult<bool> {
        self.writer.wal_enabled()
    }

    pub fn path(&self) -> Option<&Path> {
        self.writer.path()
    }
}
