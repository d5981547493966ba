use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{RowSyncError, RowSyncResult};

/// Synchronization state of one row version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Never acknowledged by the server.
    NewRow,
    /// Locally edited since the last sync.
    Changed,
    /// Locally soft-deleted, awaiting server confirmation.
    Deleted,
    Synced,
    /// Synced, but attachment files are still being transferred.
    SyncedPendingFiles,
    /// Half of a conflict pair.
    InConflict,
}

impl SyncState {
    pub const ALL: [SyncState; 6] = [
        Self::NewRow,
        Self::Changed,
        Self::Deleted,
        Self::Synced,
        Self::SyncedPendingFiles,
        Self::InConflict,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NewRow => "new_row",
            Self::Changed => "changed",
            Self::Deleted => "deleted",
            Self::Synced => "synced",
            Self::SyncedPendingFiles => "synced_pending_files",
            Self::InConflict => "in_conflict",
        }
    }

    /// synced or synced_pending_files.
    pub fn is_synced(self) -> bool {
        matches!(self, Self::Synced | Self::SyncedPendingFiles)
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncState {
    type Err = RowSyncError;

    fn from_str(s: &str) -> RowSyncResult<Self> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| RowSyncError::invalid_argument(format!("unknown sync state: {s}")))
    }
}

/// Which side of a conflict pair a version represents, and why it conflicts.
///
/// The persisted ordinal orders a pair local-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    LocalDeletedOldValues,
    LocalUpdatedUpdatedValues,
    ServerDeletedOldValues,
    ServerUpdatedUpdatedValues,
}

impl ConflictType {
    pub fn code(self) -> i32 {
        match self {
            Self::LocalDeletedOldValues => 0,
            Self::LocalUpdatedUpdatedValues => 1,
            Self::ServerDeletedOldValues => 2,
            Self::ServerUpdatedUpdatedValues => 3,
        }
    }

    pub fn from_code(code: i32) -> RowSyncResult<Self> {
        match code {
            0 => Ok(Self::LocalDeletedOldValues),
            1 => Ok(Self::LocalUpdatedUpdatedValues),
            2 => Ok(Self::ServerDeletedOldValues),
            3 => Ok(Self::ServerUpdatedUpdatedValues),
            other => Err(RowSyncError::invalid_argument(format!(
                "unknown conflict type code: {other}"
            ))),
        }
    }

    pub fn is_local(self) -> bool {
        matches!(
            self,
            Self::LocalDeletedOldValues | Self::LocalUpdatedUpdatedValues
        )
    }

    pub fn is_server(self) -> bool {
        !self.is_local()
    }

    pub fn is_deletion(self) -> bool {
        matches!(
            self,
            Self::LocalDeletedOldValues | Self::ServerDeletedOldValues
        )
    }
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LocalDeletedOldValues => "local_deleted_old_values",
            Self::LocalUpdatedUpdatedValues => "local_updated_updated_values",
            Self::ServerDeletedOldValues => "server_deleted_old_values",
            Self::ServerUpdatedUpdatedValues => "server_updated_updated_values",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_state_round_trips_through_text() {
        for state in SyncState::ALL {
            assert_eq!(state.as_str().parse::<SyncState>().unwrap(), state);
        }
        assert!("bogus".parse::<SyncState>().is_err());
    }

    #[test]
    fn conflict_codes_order_local_before_server() {
        assert!(ConflictType::LocalUpdatedUpdatedValues < ConflictType::ServerDeletedOldValues);
        assert_eq!(ConflictType::from_code(3).unwrap(), ConflictType::ServerUpdatedUpdatedValues);
        assert!(ConflictType::from_code(7).is_err());
        assert!(ConflictType::LocalDeletedOldValues.is_local());
        assert!(ConflictType::ServerDeletedOldValues.is_server());
    }
}
