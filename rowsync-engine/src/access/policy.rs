//! The row-change permission predicate gating every mutation.

use tracing::warn;

use rowsync_core::errors::{RowSyncError, RowSyncResult};
use rowsync_core::row::{FilterType, SyncState};
use rowsync_core::security::{RowChange, TableSecuritySettings};

use super::roles::is_privileged;

/// Decide whether a caller may apply `change` to a row that will end up in
/// `target_sync_state`, given the row's filter fields before the change.
pub fn allow_row_change(
    settings: &TableSecuritySettings,
    active_user: &str,
    roles: Option<&[String]>,
    target_sync_state: SyncState,
    prior_filter_type: FilterType,
    prior_filter_value: Option<&str>,
    change: RowChange,
) -> RowSyncResult<()> {
    match decide(
        settings,
        active_user,
        roles,
        target_sync_state,
        prior_filter_type,
        prior_filter_value,
        change,
    ) {
        Ok(()) => Ok(()),
        Err(reason) => {
            warn!(
                table = %settings.table_id,
                user = %active_user,
                change = change.as_str(),
                reason,
                "row change denied"
            );
            Err(RowSyncError::not_authorized(&settings.table_id, reason))
        }
    }
}

fn decide(
    settings: &TableSecuritySettings,
    active_user: &str,
    roles: Option<&[String]>,
    target_sync_state: SyncState,
    prior_filter_type: FilterType,
    prior_filter_value: Option<&str>,
    change: RowChange,
) -> Result<(), &'static str> {
    let privileged = is_privileged(roles);

    if change == RowChange::NewRow {
        return match (settings.is_locked, roles.is_some()) {
            (true, _) if privileged => Ok(()),
            (true, _) => Err("only privileged users may create rows in a locked table"),
            (false, true) => Ok(()),
            (false, false) if settings.can_unverified_user_create => Ok(()),
            (false, false) => Err("unverified users may not create rows in this table"),
        };
    }

    // The caller's own unsynced draft.
    if target_sync_state == SyncState::NewRow {
        return Ok(());
    }
    if roles.is_none() {
        return Err("unverified users may only modify their new rows");
    }

    let owner = prior_filter_value == Some(active_user);
    let allowed = match (change, settings.is_locked) {
        (RowChange::ChangeRow, true) => owner || privileged,
        (RowChange::ChangeRow, false) => {
            matches!(prior_filter_type, FilterType::Modify | FilterType::Default)
                || owner
                || privileged
        }
        (RowChange::DeleteRow, true) => privileged,
        (RowChange::DeleteRow, false) => {
            prior_filter_type == FilterType::Default || owner || privileged
        }
        (RowChange::NewRow, _) => true,
    };
    if allowed {
        Ok(())
    } else if change == RowChange::DeleteRow {
        Err("caller may not delete this row")
    } else {
        Err("caller may not modify this row")
    }
}

/// Only privileged callers may set filter fields through ordinary writes.
pub fn can_modify_filter_fields(roles: Option<&[String]>) -> bool {
    is_privileged(roles)
}
