#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tempfile::TempDir;

use rowsync_core::config::SyncConfig;
use rowsync_core::errors::RowSyncResult;
use rowsync_core::row::{ColumnDefinition, ElementDataType, FilterType, RowValues, RowVersion, SyncState};
use rowsync_core::security::TableSecuritySettings;
use rowsync_core::traits::{RowPredicate, RowStore};
use rowsync_engine::{Caller, RowSyncEngine};
use rowsync_storage::{FsAttachmentStore, SqliteTableStore, StorageEngine};

pub const TABLE: &str = "census";

pub struct Fixture {
    pub storage: StorageEngine,
    pub engine: RowSyncEngine,
    pub attachments: Arc<FsAttachmentStore>,
    _dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_settings(TableSecuritySettings::for_table(TABLE))
    }

    pub fn with_settings(settings: TableSecuritySettings) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let attachments = Arc::new(FsAttachmentStore::new(dir.path().join("attachments")));
        let engine = RowSyncEngine::new(&SyncConfig::default(), attachments.clone());
        let storage = StorageEngine::open_in_memory().unwrap();
        storage
            .with_store(|store| {
                store.put_security_settings(&settings)?;
                store.define_columns(
                    TABLE,
                    &[
                        ColumnDefinition::new("name", ElementDataType::String),
                        ColumnDefinition::new("weight", ElementDataType::Number),
                        ColumnDefinition::new("photo", ElementDataType::Rowpath),
                    ],
                )
            })
            .unwrap();
        Self {
            storage,
            engine,
            attachments,
            _dir: dir,
        }
    }

    /// Run engine calls against the store on the write connection.
    pub fn run<T>(
        &self,
        f: impl FnOnce(&RowSyncEngine, &SqliteTableStore<'_>) -> RowSyncResult<T>,
    ) -> RowSyncResult<T> {
        self.storage.with_store(|store| f(&self.engine, store))
    }

    pub fn versions(&self, row_id: &str) -> Vec<RowVersion> {
        self.storage
            .with_store(|store| store.query(TABLE, &RowPredicate::row(row_id)))
            .unwrap()
    }

    /// Store a synced row as if an earlier sync had delivered it.
    pub fn seed_synced(&self, row_id: &str, etag: &str, owner: &str, filter: FilterType) -> RowVersion {
        let mut row = RowVersion::new(TABLE, row_id, Utc::now() - Duration::minutes(5))
            .with_value("name", Some("Ada"))
            .with_value("weight", Some("9.80"));
        row.row_etag = Some(etag.to_string());
        row.sync_state = SyncState::Synced;
        row.filter_type = filter;
        row.filter_value = Some(owner.to_string());
        row.savepoint_creator = Some(owner.to_string());
        self.storage.with_store(|store| store.insert(&row)).unwrap();
        row
    }

    /// Replace every stored version of `row`'s id with `row` as given.
    pub fn overwrite(&self, row: &RowVersion) {
        self.storage
            .with_store(|store| {
                store.delete(TABLE, &RowPredicate::row(&row.row_id))?;
                store.insert(row)
            })
            .unwrap();
    }

    /// Put a file in a row's attachment directory and return its path.
    pub fn attach_file(&self, row_id: &str) -> PathBuf {
        let dir = self.attachments.row_dir(TABLE, row_id);
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join("photo.jpg");
        fs::write(&file, b"jpeg").unwrap();
        file
    }
}

/// The server's copy of `local` with a new etag.
pub fn server_copy(local: &RowVersion, etag: &str) -> RowVersion {
    let mut server = local.clone();
    server.row_etag = Some(etag.to_string());
    server.sync_state = SyncState::Synced;
    server.conflict_type = None;
    server
}

pub fn user(name: &str) -> Caller {
    Caller::new(name, Some(r#"["ROLE_USER"]"#))
}

pub fn admin(name: &str) -> Caller {
    Caller::new(name, Some(r#"["ROLE_USER", "ROLE_SUPER_USER_TABLES"]"#))
}

pub fn anonymous() -> Caller {
    Caller::unverified("anonymous")
}

pub fn values(pairs: &[(&str, &str)]) -> RowValues {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Some(v.to_string())))
        .collect()
}
