//! Read path: hidden-row filtering and the effective-access projection.

use serde::Serialize;

use rowsync_core::errors::RowSyncResult;
use rowsync_core::row::RowVersion;
use rowsync_core::traits::{RowPredicate, SyncDatabase};

use crate::access::{is_visible, project_effective_access, AccessContext, EffectiveAccess};
use crate::engine::{Caller, RowSyncEngine};

/// A row version as presented to one caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibleRow {
    pub row: RowVersion,
    /// `None` when the table projects no access column.
    pub effective_access: Option<EffectiveAccess>,
}

fn present(ctx: &AccessContext, versions: Vec<RowVersion>) -> Vec<VisibleRow> {
    versions
        .into_iter()
        .filter(|row| is_visible(ctx, row))
        .map(|row| VisibleRow {
            effective_access: project_effective_access(ctx, &row),
            row,
        })
        .collect()
}

impl RowSyncEngine {
    /// Every version in the table the caller may see.
    pub fn query_visible_rows(
        &self,
        db: &dyn SyncDatabase,
        table_id: &str,
        caller: &Caller,
    ) -> RowSyncResult<Vec<VisibleRow>> {
        let ctx = self.access_context(db, Some(table_id), caller)?;
        let versions = db.query(table_id, &RowPredicate::whole_table())?;
        Ok(present(&ctx, versions))
    }

    /// Versions of one row the caller may see. Empty when the row is hidden.
    pub fn query_visible_versions(
        &self,
        db: &dyn SyncDatabase,
        table_id: &str,
        row_id: &str,
        caller: &Caller,
    ) -> RowSyncResult<Vec<VisibleRow>> {
        let ctx = self.access_context(db, Some(table_id), caller)?;
        let versions = db.query(table_id, &RowPredicate::row(row_id))?;
        Ok(present(&ctx, versions))
    }
}
