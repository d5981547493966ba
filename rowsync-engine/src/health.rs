//! Table-wide check for checkpoints and conflicts awaiting the user.

use serde::Serialize;

use rowsync_core::errors::RowSyncResult;
use rowsync_core::traits::{RowPredicate, SyncDatabase, VersionScope};

use crate::engine::RowSyncEngine;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableHealth {
    pub has_checkpoints: bool,
    pub has_conflicts: bool,
}

impl TableHealth {
    pub fn is_clean(self) -> bool {
        !self.has_checkpoints && !self.has_conflicts
    }
}

impl RowSyncEngine {
    /// Whether any row of the table has open checkpoints or sits in conflict.
    pub fn table_health(&self, db: &dyn SyncDatabase, table_id: &str) -> RowSyncResult<TableHealth> {
        let any = |scope: VersionScope| -> RowSyncResult<bool> {
            Ok(!db
                .query(table_id, &RowPredicate::whole_table().scoped(scope))?
                .is_empty())
        };
        Ok(TableHealth {
            has_checkpoints: any(VersionScope::Checkpoints)?,
            has_conflicts: any(VersionScope::InConflict)?,
        })
    }
}
