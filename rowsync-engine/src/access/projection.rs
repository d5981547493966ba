//! Read-side mirror of the row-change predicate.

use std::fmt;

use serde::{Deserialize, Serialize};

use rowsync_core::constants::ROLE_USER;
use rowsync_core::row::{FilterType, RowVersion, SyncState};

use super::context::{AccessColumnKind, AccessContext};
use super::roles::has_role;

/// What the caller may do with a row, as shown in `_effective_access`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectiveAccess {
    #[serde(rename = "r")]
    Read,
    #[serde(rename = "rw")]
    ReadWrite,
    #[serde(rename = "rwd")]
    ReadWriteDelete,
}

impl EffectiveAccess {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "r",
            Self::ReadWrite => "rw",
            Self::ReadWriteDelete => "rwd",
        }
    }

    pub fn can_write(self) -> bool {
        self != Self::Read
    }

    pub fn can_delete(self) -> bool {
        self == Self::ReadWriteDelete
    }
}

impl fmt::Display for EffectiveAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `None` when the context projects no access column.
pub fn project_effective_access(ctx: &AccessContext, row: &RowVersion) -> Option<EffectiveAccess> {
    use EffectiveAccess::*;

    let locked = match ctx.access_column_kind {
        AccessColumnKind::None => return None,
        AccessColumnKind::LockedProjection => true,
        AccessColumnKind::UnlockedProjection => false,
    };
    if ctx.is_privileged || row.sync_state == SyncState::NewRow {
        return Some(ReadWriteDelete);
    }
    if ctx.is_unverified() {
        return Some(Read);
    }

    let owner = row.is_owned_by(&ctx.active_user);
    let access = match (locked, row.filter_type) {
        (true, _) if owner => ReadWrite,
        (true, _) => Read,
        (false, _) if owner => ReadWriteDelete,
        (false, FilterType::Default) => ReadWriteDelete,
        (false, FilterType::Modify) => ReadWrite,
        (false, FilterType::ReadOnly | FilterType::Hidden) => Read,
    };
    Some(access)
}

/// Hidden rows are invisible to everyone but privileged callers and their
/// verified owner. Unsynced rows are always visible.
pub fn is_visible(ctx: &AccessContext, row: &RowVersion) -> bool {
    if ctx.is_privileged || row.filter_type != FilterType::Hidden {
        return true;
    }
    if row.sync_state == SyncState::NewRow {
        return true;
    }
    has_role(ctx.roles(), ROLE_USER) && row.is_owned_by(&ctx.active_user)
}
