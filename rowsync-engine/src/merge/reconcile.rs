//! Folding server rows into the local table.

use tracing::{debug, info};

use rowsync_core::errors::{RowSyncError, RowSyncResult};
use rowsync_core::row::{ConflictType, RowVersion, SavepointType, SyncState};
use rowsync_core::traits::{RowPatch, RowPredicate, SyncDatabase, VersionScope};

use super::diff::diff_versions;
use crate::access::is_privileged;
use crate::engine::{Caller, RowSyncEngine};
use crate::outcome::ReconcileOutcome;
use crate::rows::remove_row_physically;
use crate::state_machine::{check_transition, TransitionCause};
use crate::unit_of_work::atomically;

impl RowSyncEngine {
    /// Fold a row received from the server into the local table.
    ///
    /// The server's row is applied, ignored, or recorded next to the local
    /// version as a conflict pair. Runs as one unit of work.
    pub fn reconcile(
        &self,
        db: &dyn SyncDatabase,
        table_id: &str,
        server_row: &RowVersion,
        caller: &Caller,
    ) -> RowSyncResult<ReconcileOutcome> {
        let roles = self.caller_roles(caller)?;
        let privileged = is_privileged(roles.as_deref());
        let row_id = server_row.row_id.as_str();

        let mut server = server_row.clone();
        server.table_id = table_id.to_string();
        server.conflict_type = None;
        if server.savepoint_type.is_none() {
            server.savepoint_type = Some(SavepointType::Complete);
        }

        let done = atomically(db, || merge_server_row(db, table_id, &server, privileged))?;

        if done.value == ReconcileOutcome::Removed {
            self.after_physical_delete(done.committed, table_id, row_id);
        }
        info!(
            table = %table_id,
            row = %row_id,
            user = %caller.active_user,
            outcome = ?done.value,
            "server row reconciled"
        );
        Ok(done.value)
    }
}

fn merge_server_row(
    db: &dyn SyncDatabase,
    table_id: &str,
    server: &RowVersion,
    privileged: bool,
) -> RowSyncResult<ReconcileOutcome> {
    let row_id = server.row_id.as_str();
    let this_row = || RowPredicate::row(row_id);

    db.delete(table_id, &this_row().scoped(VersionScope::ServerConflicts))?;

    let mut versions = db.query(table_id, &this_row())?;
    let local = match versions.len() {
        0 => return Err(RowSyncError::no_matching_row(table_id, row_id)),
        1 => versions.remove(0),
        n => {
            return Err(RowSyncError::corrupt_or_checkpoints(
                row_id,
                format!("expected one version, found {n}"),
            ))
        }
    };
    if local.is_checkpoint() {
        return Err(RowSyncError::corrupt_or_checkpoints(
            row_id,
            "only a checkpoint exists",
        ));
    }

    let state = local.sync_state;
    let prior_local = match (state, local.conflict_type) {
        (SyncState::InConflict, Some(c)) if c.is_local() => Some(c),
        (SyncState::InConflict, other) => {
            return Err(RowSyncError::corrupt_state(
                row_id,
                format!("in_conflict version carries conflict type {other:?}"),
            ))
        }
        (_, None) => None,
        (_, Some(c)) => {
            return Err(RowSyncError::corrupt_state(
                row_id,
                format!("{state} version carries conflict type {c}"),
            ))
        }
    };
    let server_deleting = server.sync_state == SyncState::Deleted;

    if server_deleting
        && (state.is_synced()
            || state == SyncState::Deleted
            || prior_local == Some(ConflictType::LocalDeletedOldValues))
    {
        remove_row_physically(db, table_id, row_id)?;
        return Ok(ReconcileOutcome::Removed);
    }

    let columns = db.columns(table_id)?;

    if state.is_synced() {
        let diff = diff_versions(&local, server, &columns);
        if !diff.any() {
            debug!(table = %table_id, row = %row_id, "server row already applied");
            return Ok(ReconcileOutcome::Unchanged);
        }
        let target = if diff.attachments || state == SyncState::SyncedPendingFiles {
            SyncState::SyncedPendingFiles
        } else {
            SyncState::Synced
        };
        check_transition(row_id, state, target, TransitionCause::Merge)?;

        let mut next = local.clone();
        next.adopt_contents_of(server);
        next.sync_state = target;
        next.conflict_type = None;
        db.update(table_id, &this_row(), &RowPatch::overwrite_with(&next))?;
        return Ok(ReconcileOutcome::ServerValuesApplied);
    }

    if local.row_etag.is_some() && local.row_etag == server.row_etag {
        let restored = match prior_local {
            Some(ConflictType::LocalDeletedOldValues) => SyncState::Deleted,
            Some(_) => SyncState::Changed,
            None => state,
        };
        check_transition(row_id, state, restored, TransitionCause::Merge)?;
        let patch = RowPatch {
            sync_state: Some(restored),
            conflict_type: Some(None),
            ..RowPatch::default()
        };
        db.update(table_id, &this_row(), &patch)?;
        return Ok(ReconcileOutcome::EchoAcknowledged);
    }

    let local_type = match (state, prior_local) {
        (SyncState::Changed | SyncState::NewRow, _) => ConflictType::LocalUpdatedUpdatedValues,
        (SyncState::Deleted, _) => ConflictType::LocalDeletedOldValues,
        (SyncState::InConflict, Some(prior)) => prior,
        _ => {
            return Err(RowSyncError::corrupt_state(
                row_id,
                format!("cannot derive a local conflict type from {state}"),
            ))
        }
    };
    let diff = diff_versions(&local, server, &columns);
    let needs_conflict = diff.other
        || server_deleting
        || local_type == ConflictType::LocalDeletedOldValues
        || (privileged && diff.privileged);

    if needs_conflict {
        check_transition(row_id, state, SyncState::InConflict, TransitionCause::Merge)?;
        let retag = RowPatch {
            sync_state: Some(SyncState::InConflict),
            conflict_type: Some(Some(local_type)),
            ..RowPatch::default()
        };
        db.update(table_id, &this_row(), &retag)?;

        let mut server_version = server.clone();
        server_version.sync_state = SyncState::InConflict;
        server_version.conflict_type = Some(if server_deleting {
            ConflictType::ServerDeletedOldValues
        } else {
            ConflictType::ServerUpdatedUpdatedValues
        });
        db.insert(&server_version)?;
        return Ok(ReconcileOutcome::ConflictCreated);
    }

    let target = if diff.attachments {
        SyncState::SyncedPendingFiles
    } else {
        SyncState::Synced
    };
    check_transition(row_id, state, target, TransitionCause::Merge)?;
    let adopt = RowPatch {
        row_etag: Some(server.row_etag.clone()),
        filter_type: Some(server.filter_type),
        filter_value: Some(server.filter_value.clone()),
        sync_state: Some(target),
        conflict_type: Some(None),
        ..RowPatch::default()
    };
    db.update(table_id, &this_row(), &adopt)?;
    Ok(ReconcileOutcome::AutoResolved)
}
