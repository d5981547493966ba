use chrono::{DateTime, Utc};

use crate::errors::RowSyncResult;
use crate::row::{ConflictType, FilterType, RowValues, RowVersion, SavepointType, SyncState};

/// Which versions of a row a predicate selects.
#[derive(Debug, Clone, PartialEq)]
pub enum VersionScope {
    All,
    /// `savepoint_type` is null.
    Checkpoints,
    /// `conflict_type` is non-null.
    InConflict,
    /// Server-side half of a conflict pair.
    ServerConflicts,
    ConflictType(ConflictType),
    AtTimestamp(DateTime<Utc>),
    ExceptTimestamp(DateTime<Utc>),
}

/// Selects row versions within one table.
#[derive(Debug, Clone, PartialEq)]
pub struct RowPredicate {
    /// `None` selects every row of the table.
    pub row_id: Option<String>,
    pub scope: VersionScope,
}

impl RowPredicate {
    /// All versions of one row.
    pub fn row(row_id: &str) -> Self {
        Self {
            row_id: Some(row_id.to_string()),
            scope: VersionScope::All,
        }
    }

    /// Every version of every row in the table.
    pub fn whole_table() -> Self {
        Self {
            row_id: None,
            scope: VersionScope::All,
        }
    }

    pub fn scoped(mut self, scope: VersionScope) -> Self {
        self.scope = scope;
        self
    }
}

/// Field overwrites applied by `RowStore::update`. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowPatch {
    pub row_etag: Option<Option<String>>,
    pub sync_state: Option<SyncState>,
    pub conflict_type: Option<Option<ConflictType>>,
    pub filter_type: Option<FilterType>,
    pub filter_value: Option<Option<String>>,
    pub savepoint_type: Option<Option<SavepointType>>,
    pub savepoint_timestamp: Option<DateTime<Utc>>,
    pub savepoint_creator: Option<Option<String>>,
    pub form_id: Option<Option<String>>,
    pub locale: Option<Option<String>>,
    /// Replaces the full user-column map when set.
    pub values: Option<RowValues>,
}

impl RowPatch {
    /// A patch rewriting every mutable field to match `row`.
    pub fn overwrite_with(row: &RowVersion) -> Self {
        Self {
            row_etag: Some(row.row_etag.clone()),
            sync_state: Some(row.sync_state),
            conflict_type: Some(row.conflict_type),
            filter_type: Some(row.filter_type),
            filter_value: Some(row.filter_value.clone()),
            savepoint_type: Some(row.savepoint_type),
            savepoint_timestamp: Some(row.savepoint_timestamp),
            savepoint_creator: Some(row.savepoint_creator.clone()),
            form_id: Some(row.form_id.clone()),
            locale: Some(row.locale.clone()),
            values: Some(row.values.clone()),
        }
    }
}

/// Row-version persistence with explicit transaction control.
///
/// Transactions do not nest: callers check `in_transaction` and only the
/// caller that began a transaction commits or rolls it back.
pub trait RowStore {
    /// Matching versions ordered by savepoint timestamp, then conflict-type ordinal.
    fn query(&self, table_id: &str, predicate: &RowPredicate) -> RowSyncResult<Vec<RowVersion>>;
    fn insert(&self, row: &RowVersion) -> RowSyncResult<()>;
    /// Returns the number of versions updated.
    fn update(
        &self,
        table_id: &str,
        predicate: &RowPredicate,
        patch: &RowPatch,
    ) -> RowSyncResult<usize>;
    /// Returns the number of versions deleted.
    fn delete(&self, table_id: &str, predicate: &RowPredicate) -> RowSyncResult<usize>;

    fn in_transaction(&self) -> bool;
    fn begin_transaction(&self) -> RowSyncResult<()>;
    fn commit_transaction(&self) -> RowSyncResult<()>;
    fn rollback_transaction(&self) -> RowSyncResult<()>;
}
