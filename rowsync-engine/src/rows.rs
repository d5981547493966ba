//! Row mutation entry points: insert, update, delete.

use tracing::info;
use uuid::Uuid;

use rowsync_core::constants::ROW_ID_PREFIX;
use rowsync_core::errors::{RowSyncError, RowSyncResult};
use rowsync_core::row::{next_timestamp, RowValues, RowVersion, SavepointType, SyncState};
use rowsync_core::security::RowChange;
use rowsync_core::traits::{RowPatch, RowPredicate, SyncDatabase, VersionScope};

use crate::access::allow_row_change;
use crate::engine::{validate_row_values, Caller, RowSyncEngine};
use crate::outcome::DeleteOutcome;
use crate::state_machine::{
    after_local_edit, check_transition, classify, RowClassification, TransitionCause,
};
use crate::unit_of_work::atomically;

pub fn new_row_id() -> String {
    format!("{ROW_ID_PREFIX}{}", Uuid::new_v4())
}

impl RowSyncEngine {
    /// Create a row. A fresh id is generated when `row_id` is `None`.
    pub fn insert_row(
        &self,
        db: &dyn SyncDatabase,
        table_id: &str,
        row_id: Option<&str>,
        values: &RowValues,
        caller: &Caller,
    ) -> RowSyncResult<RowVersion> {
        let roles = self.caller_roles(caller)?;
        validate_row_values(table_id, values, roles.as_deref())?;
        let row_id = row_id.map_or_else(new_row_id, str::to_string);

        let done = atomically(db, || {
            let settings = db.security_settings(table_id)?;
            if !db.query(table_id, &RowPredicate::row(&row_id))?.is_empty() {
                return Err(RowSyncError::invalid_argument(format!(
                    "row {row_id} already exists in {table_id}"
                )));
            }

            let mut row = RowVersion::new(table_id, row_id.as_str(), next_timestamp(None));
            row.filter_type = settings.filter_type_on_creation;
            row.filter_value = Some(caller.active_user.clone());
            row.savepoint_creator = Some(caller.active_user.clone());
            row.apply_values(values)?;

            allow_row_change(
                &settings,
                &caller.active_user,
                roles.as_deref(),
                SyncState::NewRow,
                row.filter_type,
                row.filter_value.as_deref(),
                RowChange::NewRow,
            )?;
            db.insert(&row)?;
            Ok(row)
        })?;

        info!(table = %table_id, row = %row_id, user = %caller.active_user, "row inserted");
        Ok(done.value)
    }

    /// Edit the single settled version of a row.
    pub fn update_row(
        &self,
        db: &dyn SyncDatabase,
        table_id: &str,
        row_id: &str,
        values: &RowValues,
        caller: &Caller,
    ) -> RowSyncResult<RowVersion> {
        let roles = self.caller_roles(caller)?;
        validate_row_values(table_id, values, roles.as_deref())?;

        let done = atomically(db, || {
            let settings = db.security_settings(table_id)?;
            let versions = db.query(table_id, &RowPredicate::row(row_id))?;
            match classify(&versions) {
                RowClassification::Absent => {
                    return Err(RowSyncError::no_matching_row(table_id, row_id))
                }
                RowClassification::Steady(_) => {}
                RowClassification::Checkpointed { .. } => {
                    return Err(RowSyncError::corrupt_or_checkpoints(
                        row_id,
                        "row has checkpoints; save or discard them first",
                    ))
                }
                RowClassification::InConflict { .. } => {
                    return Err(RowSyncError::invalid_argument(format!(
                        "row {row_id} is in conflict and cannot be edited"
                    )))
                }
                RowClassification::Corrupt(details) => {
                    return Err(RowSyncError::corrupt_state(row_id, details))
                }
            }
            let current = &versions[0];
            let target = after_local_edit(row_id, current.sync_state)?;

            allow_row_change(
                &settings,
                &caller.active_user,
                roles.as_deref(),
                target,
                current.filter_type,
                current.filter_value.as_deref(),
                RowChange::ChangeRow,
            )?;

            let mut next = current.clone();
            next.savepoint_type = Some(SavepointType::Complete);
            next.apply_values(values)?;
            next.sync_state = target;
            next.savepoint_timestamp = next_timestamp(Some(&current.savepoint_timestamp));
            next.savepoint_creator = Some(caller.active_user.clone());
            db.update(
                table_id,
                &RowPredicate::row(row_id),
                &RowPatch::overwrite_with(&next),
            )?;
            Ok(next)
        })?;

        info!(table = %table_id, row = %row_id, state = %done.value.sync_state, "row updated");
        Ok(done.value)
    }

    /// Delete a row. Unsynced rows disappear; others are marked deleted until
    /// the server confirms.
    pub fn delete_row(
        &self,
        db: &dyn SyncDatabase,
        table_id: &str,
        row_id: &str,
        caller: &Caller,
    ) -> RowSyncResult<DeleteOutcome> {
        let roles = self.caller_roles(caller)?;

        let done = atomically(db, || {
            let settings = db.security_settings(table_id)?;
            let versions = db.query(table_id, &RowPredicate::row(row_id))?;
            for version in &versions {
                allow_row_change(
                    &settings,
                    &caller.active_user,
                    roles.as_deref(),
                    version.sync_state,
                    version.filter_type,
                    version.filter_value.as_deref(),
                    RowChange::DeleteRow,
                )?;
            }
            if versions.iter().any(|v| v.conflict_type.is_some()) {
                return Err(RowSyncError::invalid_argument(format!(
                    "row {row_id} is in conflict; resolve it before deleting"
                )));
            }

            db.delete(
                table_id,
                &RowPredicate::row(row_id).scoped(VersionScope::Checkpoints),
            )?;
            let remaining = db.query(table_id, &RowPredicate::row(row_id))?;
            let Some(current) = remaining.last() else {
                return Ok(DeleteOutcome::PhysicallyRemoved);
            };
            if current.sync_state == SyncState::NewRow {
                db.delete(table_id, &RowPredicate::row(row_id))?;
                return Ok(DeleteOutcome::PhysicallyRemoved);
            }
            if current.sync_state == SyncState::Deleted {
                return Ok(DeleteOutcome::MarkedDeleted);
            }

            check_transition(
                row_id,
                current.sync_state,
                SyncState::Deleted,
                TransitionCause::LocalDelete,
            )?;
            let patch = RowPatch {
                sync_state: Some(SyncState::Deleted),
                savepoint_timestamp: Some(next_timestamp(Some(&current.savepoint_timestamp))),
                ..RowPatch::default()
            };
            db.update(table_id, &RowPredicate::row(row_id), &patch)?;
            Ok(DeleteOutcome::MarkedDeleted)
        })?;

        if done.value == DeleteOutcome::PhysicallyRemoved {
            self.after_physical_delete(done.committed, table_id, row_id);
        }
        info!(table = %table_id, row = %row_id, outcome = ?done.value, "row deleted");
        Ok(done.value)
    }

    /// Record the server's etag and a new sync state on a row, typically once
    /// a push was acknowledged. Runs without authorization checks.
    ///
    /// The row must have exactly one version: no checkpoints, no conflict.
    pub fn update_etag_and_sync_state(
        &self,
        db: &dyn SyncDatabase,
        table_id: &str,
        row_id: &str,
        row_etag: Option<&str>,
        state: SyncState,
    ) -> RowSyncResult<RowVersion> {
        if state == SyncState::InConflict {
            return Err(RowSyncError::invalid_argument(format!(
                "row {row_id} cannot be put in conflict without a server version"
            )));
        }

        let done = atomically(db, || {
            let versions = db.query(table_id, &RowPredicate::row(row_id))?;
            match classify(&versions) {
                RowClassification::Absent => {
                    return Err(RowSyncError::no_matching_row(table_id, row_id))
                }
                RowClassification::Steady(_) => {}
                RowClassification::Checkpointed { .. } | RowClassification::InConflict { .. } => {
                    return Err(RowSyncError::corrupt_or_checkpoints(
                        row_id,
                        "row has checkpoints or a conflict",
                    ))
                }
                RowClassification::Corrupt(details) => {
                    return Err(RowSyncError::corrupt_state(row_id, details))
                }
            }
            let patch = RowPatch {
                row_etag: Some(row_etag.map(str::to_string)),
                sync_state: Some(state),
                ..RowPatch::default()
            };
            db.update(table_id, &RowPredicate::row(row_id), &patch)?;

            let mut row = versions[0].clone();
            row.row_etag = row_etag.map(str::to_string);
            row.sync_state = state;
            Ok(row)
        })?;

        info!(table = %table_id, row = %row_id, state = %state, "etag and sync state recorded");
        Ok(done.value)
    }

    /// Sync state of the row's most recent local version, if it exists.
    pub fn sync_state(
        &self,
        db: &dyn SyncDatabase,
        table_id: &str,
        row_id: &str,
    ) -> RowSyncResult<Option<SyncState>> {
        let versions = db.query(table_id, &RowPredicate::row(row_id))?;
        Ok(versions
            .iter()
            .rev()
            .find(|v| !v.conflict_type.is_some_and(|c| c.is_server()))
            .map(|v| v.sync_state))
    }
}

/// Drop every version of a row without authorization checks, passing
/// through new_row the way a never-synced row would be discarded.
pub(crate) fn remove_row_physically(
    db: &dyn SyncDatabase,
    table_id: &str,
    row_id: &str,
) -> RowSyncResult<()> {
    db.delete(
        table_id,
        &RowPredicate::row(row_id).scoped(VersionScope::ServerConflicts),
    )?;
    let reset = RowPatch {
        row_etag: Some(None),
        sync_state: Some(SyncState::NewRow),
        conflict_type: Some(None),
        ..RowPatch::default()
    };
    db.update(table_id, &RowPredicate::row(row_id), &reset)?;
    db.delete(table_id, &RowPredicate::row(row_id))?;
    Ok(())
}
