//! Resolution of a row's conflict pair in favor of one side.

use tracing::info;

use rowsync_core::constants::is_metadata_column;
use rowsync_core::errors::{RowSyncError, RowSyncResult};
use rowsync_core::row::{next_timestamp, ConflictType, RowValues, RowVersion, SyncState};
use rowsync_core::security::RowChange;
use rowsync_core::traits::{RowPatch, RowPredicate, SyncDatabase, VersionScope};

use super::diff::has_attachments;
use crate::access::allow_row_change;
use crate::engine::{Caller, RowSyncEngine};
use crate::outcome::ResolutionOutcome;
use crate::rows::remove_row_physically;
use crate::state_machine::{check_transition, TransitionCause};
use crate::unit_of_work::atomically;

/// The local and server halves of a row's conflict.
struct ConflictPair {
    local: RowVersion,
    server: RowVersion,
    local_type: ConflictType,
    server_type: ConflictType,
}

fn conflict_pair(db: &dyn SyncDatabase, table_id: &str, row_id: &str) -> RowSyncResult<ConflictPair> {
    let mut versions = db.query(table_id, &RowPredicate::row(row_id))?;
    if versions.is_empty() {
        return Err(RowSyncError::no_matching_row(table_id, row_id));
    }
    versions.sort_by_key(|v| v.conflict_type);

    match versions.as_slice() {
        [local, server] => match (local.conflict_type, server.conflict_type) {
            (Some(local_type), Some(server_type))
                if local_type.is_local() && server_type.is_server() =>
            {
                Ok(ConflictPair {
                    local: local.clone(),
                    server: server.clone(),
                    local_type,
                    server_type,
                })
            }
            _ => Err(RowSyncError::corrupt_state(
                row_id,
                "versions do not form a local and server conflict pair",
            )),
        },
        _ => Err(RowSyncError::corrupt_state(
            row_id,
            format!("expected a conflict pair, found {} versions", versions.len()),
        )),
    }
}

fn local_side(pair: &ConflictPair, row_id: &str) -> RowPredicate {
    RowPredicate::row(row_id).scoped(VersionScope::ConflictType(pair.local_type))
}

fn server_side(row_id: &str) -> RowPredicate {
    RowPredicate::row(row_id).scoped(VersionScope::ServerConflicts)
}

impl RowSyncEngine {
    /// Resolve a conflict in favor of the local version.
    ///
    /// A local deletion stays a deletion; an update keeps its values and
    /// adopts the server's etag so it can be pushed again.
    pub fn take_local(
        &self,
        db: &dyn SyncDatabase,
        table_id: &str,
        row_id: &str,
        caller: &Caller,
    ) -> RowSyncResult<ResolutionOutcome> {
        self.keep_local(db, table_id, row_id, None, caller)
    }

    /// Like `take_local`, with `deltas` taken from the server laid over the
    /// local values. Not available when the local side is a deletion.
    pub fn take_local_plus_server_deltas(
        &self,
        db: &dyn SyncDatabase,
        table_id: &str,
        row_id: &str,
        deltas: &RowValues,
        caller: &Caller,
    ) -> RowSyncResult<ResolutionOutcome> {
        if let Some(column) = deltas.keys().find(|k| is_metadata_column(k)) {
            return Err(RowSyncError::invalid_argument(format!(
                "server deltas may not carry metadata column {column}"
            )));
        }
        self.keep_local(db, table_id, row_id, Some(deltas), caller)
    }

    fn keep_local(
        &self,
        db: &dyn SyncDatabase,
        table_id: &str,
        row_id: &str,
        deltas: Option<&RowValues>,
        caller: &Caller,
    ) -> RowSyncResult<ResolutionOutcome> {
        let roles = self.caller_roles(caller)?;

        let done = atomically(db, || {
            let settings = db.security_settings(table_id)?;
            let pair = conflict_pair(db, table_id, row_id)?;
            let local_deleted = pair.local_type == ConflictType::LocalDeletedOldValues;
            if local_deleted && deltas.is_some() {
                return Err(RowSyncError::invalid_argument(format!(
                    "row {row_id} was deleted locally; server deltas cannot be applied"
                )));
            }

            let mut next = pair.local.clone();
            if local_deleted {
                allow_row_change(
                    &settings,
                    &caller.active_user,
                    roles.as_deref(),
                    SyncState::Deleted,
                    pair.server.filter_type,
                    pair.server.filter_value.as_deref(),
                    RowChange::DeleteRow,
                )?;
                next.adopt_contents_of(&pair.server);
                next.sync_state = SyncState::Deleted;
                let latest = pair.local.savepoint_timestamp.max(pair.server.savepoint_timestamp);
                next.savepoint_timestamp = next_timestamp(Some(&latest));
            } else {
                allow_row_change(
                    &settings,
                    &caller.active_user,
                    roles.as_deref(),
                    SyncState::Changed,
                    pair.local.filter_type,
                    pair.local.filter_value.as_deref(),
                    RowChange::ChangeRow,
                )?;
                if let Some(deltas) = deltas {
                    next.apply_values(deltas)?;
                }
                next.row_etag = pair.server.row_etag.clone();
                next.filter_type = pair.server.filter_type;
                next.filter_value = pair.server.filter_value.clone();
                next.savepoint_timestamp = pair.server.savepoint_timestamp;
                next.savepoint_creator = pair.server.savepoint_creator.clone();
                next.sync_state = SyncState::Changed;
            }
            next.conflict_type = None;
            check_transition(
                row_id,
                SyncState::InConflict,
                next.sync_state,
                TransitionCause::Resolution,
            )?;

            db.delete(table_id, &server_side(row_id))?;
            db.update(table_id, &local_side(&pair, row_id), &RowPatch::overwrite_with(&next))?;
            Ok(next)
        })?;

        info!(
            table = %table_id,
            row = %row_id,
            state = %done.value.sync_state,
            deltas = deltas.map_or(0, |d| d.len()),
            "conflict resolved with local version"
        );
        Ok(ResolutionOutcome::Kept(done.value))
    }

    /// Resolve a conflict in favor of the server.
    ///
    /// Filter fields come from the server's side without re-checking the
    /// caller, since reconciliation already settled who may hold them.
    pub fn take_server(
        &self,
        db: &dyn SyncDatabase,
        table_id: &str,
        row_id: &str,
        caller: &Caller,
    ) -> RowSyncResult<ResolutionOutcome> {
        let done = atomically(db, || {
            let pair = conflict_pair(db, table_id, row_id)?;
            if pair.server_type == ConflictType::ServerDeletedOldValues {
                remove_row_physically(db, table_id, row_id)?;
                return Ok(ResolutionOutcome::Removed);
            }

            let columns = db.columns(table_id)?;
            let mut next = pair.local.clone();
            next.adopt_contents_of(&pair.server);
            next.conflict_type = None;
            next.sync_state = if has_attachments(&pair.server, &columns) {
                SyncState::SyncedPendingFiles
            } else {
                SyncState::Synced
            };
            check_transition(
                row_id,
                SyncState::InConflict,
                next.sync_state,
                TransitionCause::Resolution,
            )?;

            db.delete(table_id, &server_side(row_id))?;
            db.update(table_id, &local_side(&pair, row_id), &RowPatch::overwrite_with(&next))?;
            Ok(ResolutionOutcome::Kept(next))
        })?;

        if done.value == ResolutionOutcome::Removed {
            self.after_physical_delete(done.committed, table_id, row_id);
        }
        info!(
            table = %table_id,
            row = %row_id,
            user = %caller.active_user,
            removed = done.value == ResolutionOutcome::Removed,
            "conflict resolved with server version"
        );
        Ok(done.value)
    }
}
