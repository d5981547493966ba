//! Sync-state transitions and classification of a row's stored versions.

use rowsync_core::errors::{RowSyncError, RowSyncResult};
use rowsync_core::row::{ConflictType, RowVersion, SyncState};

/// What drives a transition. Each cause permits a different set of moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCause {
    LocalEdit,
    LocalDelete,
    /// Arrival of a server row.
    Merge,
    /// One of the conflict resolution operations.
    Resolution,
}

pub fn is_legal_transition(from: SyncState, to: SyncState, cause: TransitionCause) -> bool {
    use SyncState::*;

    match cause {
        TransitionCause::LocalEdit => matches!(
            (from, to),
            (NewRow, NewRow) | (NewRow, Changed) | (Changed, Changed) | (Synced, Changed)
                | (SyncedPendingFiles, Changed)
        ),
        TransitionCause::LocalDelete => {
            matches!(from, NewRow | Changed | Synced | SyncedPendingFiles) && to == Deleted
        }
        TransitionCause::Merge => match (from, to) {
            (_, InConflict) => true,
            (Synced | SyncedPendingFiles, Synced | SyncedPendingFiles) => true,
            (InConflict | NewRow | Changed | Deleted, Synced | SyncedPendingFiles) => true,
            (InConflict, Changed | Deleted) => true,
            (same, other) => same == other,
        },
        TransitionCause::Resolution => {
            from == InConflict && matches!(to, Changed | Deleted | Synced | SyncedPendingFiles)
        }
    }
}

pub fn check_transition(
    row_id: &str,
    from: SyncState,
    to: SyncState,
    cause: TransitionCause,
) -> RowSyncResult<()> {
    if is_legal_transition(from, to, cause) {
        Ok(())
    } else {
        Err(RowSyncError::corrupt_state(
            row_id,
            format!("illegal {cause:?} transition from {from} to {to}"),
        ))
    }
}

/// Sync state after a local edit, or an error for rows that cannot be edited.
pub fn after_local_edit(row_id: &str, from: SyncState) -> RowSyncResult<SyncState> {
    match from {
        SyncState::NewRow => Ok(SyncState::NewRow),
        SyncState::Changed | SyncState::Synced | SyncState::SyncedPendingFiles => {
            Ok(SyncState::Changed)
        }
        SyncState::Deleted | SyncState::InConflict => Err(RowSyncError::invalid_argument(
            format!("row {row_id} is {from} and cannot be edited"),
        )),
    }
}

/// Shape of the versions stored for one row id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowClassification {
    Absent,
    /// Exactly one settled version.
    Steady(SyncState),
    /// A checkpoint chain, optionally on top of one settled version.
    Checkpointed {
        base: Option<SyncState>,
        checkpoints: usize,
    },
    /// A local conflict version, plus its server counterpart once recorded.
    InConflict {
        local: ConflictType,
        server: Option<ConflictType>,
    },
    Corrupt(String),
}

/// Classify versions as returned by `RowStore::query` for one row.
pub fn classify(versions: &[RowVersion]) -> RowClassification {
    if versions.is_empty() {
        return RowClassification::Absent;
    }

    let conflict_types: Vec<ConflictType> =
        versions.iter().filter_map(|v| v.conflict_type).collect();
    if !conflict_types.is_empty() {
        if conflict_types.len() != versions.len() {
            return RowClassification::Corrupt(
                "conflict versions stored alongside settled versions".to_string(),
            );
        }
        if versions.iter().any(|v| v.sync_state != SyncState::InConflict) {
            return RowClassification::Corrupt(
                "conflict type set on a version that is not in_conflict".to_string(),
            );
        }
        let local: Vec<ConflictType> =
            conflict_types.iter().copied().filter(|c| c.is_local()).collect();
        let server: Vec<ConflictType> =
            conflict_types.iter().copied().filter(|c| c.is_server()).collect();
        return match (local.as_slice(), server.as_slice()) {
            ([local], []) => RowClassification::InConflict {
                local: *local,
                server: None,
            },
            ([local], [server]) => RowClassification::InConflict {
                local: *local,
                server: Some(*server),
            },
            _ => RowClassification::Corrupt(format!(
                "{} local and {} server conflict versions",
                local.len(),
                server.len()
            )),
        };
    }

    if versions.iter().any(|v| v.sync_state == SyncState::InConflict) {
        return RowClassification::Corrupt("in_conflict version without a conflict type".to_string());
    }

    let checkpoints = versions.iter().filter(|v| v.is_checkpoint()).count();
    let settled: Vec<&RowVersion> = versions.iter().filter(|v| !v.is_checkpoint()).collect();
    match (settled.as_slice(), checkpoints) {
        ([only], 0) => RowClassification::Steady(only.sync_state),
        ([], n) => RowClassification::Checkpointed {
            base: None,
            checkpoints: n,
        },
        ([base], n) => RowClassification::Checkpointed {
            base: Some(base.sync_state),
            checkpoints: n,
        },
        (many, _) => RowClassification::Corrupt(format!("{} settled versions", many.len())),
    }
}
