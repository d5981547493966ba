//! Checkpoint chains: unsynced drafts of a row, ordered by savepoint timestamp.

use tracing::info;

use rowsync_core::constants::{CHECKPOINT_RESERVED_COLUMNS, ENGINE_MANAGED_COLUMNS};
use rowsync_core::errors::{RowSyncError, RowSyncResult};
use rowsync_core::row::{next_timestamp, RowValues, RowVersion, SavepointType, SyncState};
use rowsync_core::security::RowChange;
use rowsync_core::traits::{RowPatch, RowPredicate, SyncDatabase, VersionScope};

use crate::access::allow_row_change;
use crate::engine::{Caller, RowSyncEngine};
use crate::outcome::CheckpointRemoval;
use crate::unit_of_work::atomically;

/// The single latest version. Two versions sharing the latest timestamp is corruption.
pub(crate) fn most_recent<'v>(
    versions: &'v [RowVersion],
    row_id: &str,
) -> RowSyncResult<&'v RowVersion> {
    match versions {
        [] => Err(RowSyncError::corrupt_state(row_id, "row has no versions")),
        [.., previous, latest] if previous.savepoint_timestamp == latest.savepoint_timestamp => {
            Err(RowSyncError::corrupt_state(
                row_id,
                "more than one version shares the latest savepoint timestamp",
            ))
        }
        [.., latest] => Ok(latest),
    }
}

fn validate_deltas(deltas: &RowValues) -> RowSyncResult<()> {
    if deltas.is_empty() {
        return Err(RowSyncError::invalid_argument("checkpoint has no values"));
    }
    if let Some(column) = deltas.keys().find(|k| {
        CHECKPOINT_RESERVED_COLUMNS.contains(&k.as_str())
            || ENGINE_MANAGED_COLUMNS.contains(&k.as_str())
    }) {
        return Err(RowSyncError::invalid_argument(format!(
            "checkpoints may not set {column}"
        )));
    }
    Ok(())
}

impl RowSyncEngine {
    /// Append a checkpoint holding `deltas` on top of the row's latest version.
    pub fn insert_checkpoint(
        &self,
        db: &dyn SyncDatabase,
        table_id: &str,
        row_id: &str,
        deltas: &RowValues,
        caller: &Caller,
    ) -> RowSyncResult<RowVersion> {
        validate_deltas(deltas)?;
        let roles = self.caller_roles(caller)?;

        let done = atomically(db, || {
            let settings = db.security_settings(table_id)?;
            let versions = db.query(table_id, &RowPredicate::row(row_id))?;

            let checkpoint = if versions.is_empty() {
                let mut row = RowVersion::new(table_id, row_id, next_timestamp(None));
                row.savepoint_type = None;
                row.filter_type = settings.filter_type_on_creation;
                row.filter_value = Some(caller.active_user.clone());
                row.savepoint_creator = Some(caller.active_user.clone());
                row.apply_values(deltas)?;
                allow_row_change(
                    &settings,
                    &caller.active_user,
                    roles.as_deref(),
                    SyncState::NewRow,
                    row.filter_type,
                    row.filter_value.as_deref(),
                    RowChange::NewRow,
                )?;
                row
            } else {
                if versions.iter().any(|v| v.conflict_type.is_some()) {
                    return Err(RowSyncError::invalid_argument(format!(
                        "row {row_id} is in conflict and cannot be checkpointed"
                    )));
                }
                let latest = most_recent(&versions, row_id)?;
                let target = match latest.sync_state {
                    SyncState::NewRow => SyncState::NewRow,
                    SyncState::Deleted => {
                        return Err(RowSyncError::invalid_argument(format!(
                            "row {row_id} is deleted and cannot be checkpointed"
                        )))
                    }
                    _ => SyncState::Changed,
                };
                allow_row_change(
                    &settings,
                    &caller.active_user,
                    roles.as_deref(),
                    target,
                    latest.filter_type,
                    latest.filter_value.as_deref(),
                    RowChange::ChangeRow,
                )?;

                let mut row = latest.clone();
                row.apply_values(deltas)?;
                row.savepoint_type = None;
                row.sync_state = target;
                row.savepoint_timestamp = next_timestamp(Some(&latest.savepoint_timestamp));
                row.savepoint_creator = Some(caller.active_user.clone());
                row
            };

            db.insert(&checkpoint)?;
            Ok(checkpoint)
        })?;

        info!(table = %table_id, row = %row_id, state = %done.value.sync_state, "checkpoint added");
        Ok(done.value)
    }

    /// Keep only the latest version and mark it with `target`.
    pub fn compact_to(
        &self,
        db: &dyn SyncDatabase,
        table_id: &str,
        row_id: &str,
        target: SavepointType,
    ) -> RowSyncResult<RowVersion> {
        let done = atomically(db, || {
            let versions = db.query(table_id, &RowPredicate::row(row_id))?;
            if versions.is_empty() {
                return Err(RowSyncError::no_matching_row(table_id, row_id));
            }
            if versions.iter().any(|v| v.conflict_type.is_some()) {
                return Err(RowSyncError::invalid_argument(format!(
                    "row {row_id} is in conflict and cannot be saved"
                )));
            }
            let latest = most_recent(&versions, row_id)?;
            let ts = latest.savepoint_timestamp;

            let mark = RowPatch {
                savepoint_type: Some(Some(target)),
                ..RowPatch::default()
            };
            db.update(
                table_id,
                &RowPredicate::row(row_id).scoped(VersionScope::AtTimestamp(ts)),
                &mark,
            )?;
            let dropped = db.delete(
                table_id,
                &RowPredicate::row(row_id).scoped(VersionScope::ExceptTimestamp(ts)),
            )?;

            let mut kept = latest.clone();
            kept.savepoint_type = Some(target);
            Ok((kept, dropped))
        })?;

        let (kept, dropped) = done.value;
        info!(table = %table_id, row = %row_id, savepoint = %target, dropped, "row compacted");
        Ok(kept)
    }

    pub fn save_as_complete(
        &self,
        db: &dyn SyncDatabase,
        table_id: &str,
        row_id: &str,
    ) -> RowSyncResult<RowVersion> {
        self.compact_to(db, table_id, row_id, SavepointType::Complete)
    }

    pub fn save_as_incomplete(
        &self,
        db: &dyn SyncDatabase,
        table_id: &str,
        row_id: &str,
    ) -> RowSyncResult<RowVersion> {
        self.compact_to(db, table_id, row_id, SavepointType::Incomplete)
    }

    /// Discard every checkpoint of a row.
    pub fn delete_all_checkpoints(
        &self,
        db: &dyn SyncDatabase,
        table_id: &str,
        row_id: &str,
        caller: &Caller,
    ) -> RowSyncResult<CheckpointRemoval> {
        let roles = self.caller_roles(caller)?;

        let done = atomically(db, || {
            let settings = db.security_settings(table_id)?;
            let checkpoints = db.query(
                table_id,
                &RowPredicate::row(row_id).scoped(VersionScope::Checkpoints),
            )?;
            for checkpoint in &checkpoints {
                allow_row_change(
                    &settings,
                    &caller.active_user,
                    roles.as_deref(),
                    checkpoint.sync_state,
                    checkpoint.filter_type,
                    checkpoint.filter_value.as_deref(),
                    RowChange::DeleteRow,
                )?;
            }
            db.delete(
                table_id,
                &RowPredicate::row(row_id).scoped(VersionScope::Checkpoints),
            )?;
            remaining(db, table_id, row_id)
        })?;

        if done.value == CheckpointRemoval::FullyRemoved {
            self.after_physical_delete(done.committed, table_id, row_id);
        }
        info!(table = %table_id, row = %row_id, outcome = ?done.value, "checkpoints discarded");
        Ok(done.value)
    }

    /// Discard only the most recent checkpoint of a row.
    pub fn delete_last_checkpoint(
        &self,
        db: &dyn SyncDatabase,
        table_id: &str,
        row_id: &str,
        caller: &Caller,
    ) -> RowSyncResult<CheckpointRemoval> {
        let roles = self.caller_roles(caller)?;

        let done = atomically(db, || {
            let settings = db.security_settings(table_id)?;
            let versions = db.query(table_id, &RowPredicate::row(row_id))?;
            if versions.is_empty() {
                return Err(RowSyncError::no_matching_row(table_id, row_id));
            }
            let latest = most_recent(&versions, row_id)?;
            if !latest.is_checkpoint() {
                return Err(RowSyncError::invalid_argument(format!(
                    "latest version of row {row_id} is not a checkpoint"
                )));
            }
            allow_row_change(
                &settings,
                &caller.active_user,
                roles.as_deref(),
                latest.sync_state,
                latest.filter_type,
                latest.filter_value.as_deref(),
                RowChange::DeleteRow,
            )?;
            db.delete(
                table_id,
                &RowPredicate::row(row_id)
                    .scoped(VersionScope::AtTimestamp(latest.savepoint_timestamp)),
            )?;
            remaining(db, table_id, row_id)
        })?;

        if done.value == CheckpointRemoval::FullyRemoved {
            self.after_physical_delete(done.committed, table_id, row_id);
        }
        Ok(done.value)
    }
}

fn remaining(db: &dyn SyncDatabase, table_id: &str, row_id: &str) -> RowSyncResult<CheckpointRemoval> {
    if db.query(table_id, &RowPredicate::row(row_id))?.is_empty() {
        Ok(CheckpointRemoval::FullyRemoved)
    } else {
        Ok(CheckpointRemoval::Retained)
    }
}
