use rowsync_core::security::TableSecuritySettings;

use super::roles::{is_privileged, Roles};

/// How effective access is projected onto rows read through this context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessColumnKind {
    /// No table, so no row-level filtering applies.
    None,
    LockedProjection,
    UnlockedProjection,
}

/// Caller identity resolved against one table's settings. Built per call.
#[derive(Debug, Clone)]
pub struct AccessContext {
    pub active_user: String,
    /// `None` for an unverified caller.
    pub roles: Option<Roles>,
    pub is_privileged: bool,
    pub can_create_row: bool,
    pub access_column_kind: AccessColumnKind,
}

impl AccessContext {
    pub fn is_unverified(&self) -> bool {
        self.roles.is_none()
    }

    pub fn roles(&self) -> Option<&[String]> {
        self.roles.as_deref()
    }
}

/// Resolve a caller against a table. Without a table nothing may be created
/// and no access column is projected.
pub fn resolve_access(
    settings: Option<&TableSecuritySettings>,
    active_user: &str,
    roles: Option<Roles>,
) -> AccessContext {
    let is_privileged = is_privileged(roles.as_deref());
    let (can_create_row, access_column_kind) = match settings {
        None => (false, AccessColumnKind::None),
        Some(s) if s.is_locked => (is_privileged, AccessColumnKind::LockedProjection),
        Some(s) => {
            let can_create = roles.is_some() || s.can_unverified_user_create;
            (can_create, AccessColumnKind::UnlockedProjection)
        }
    };
    AccessContext {
        active_user: active_user.to_string(),
        roles,
        is_privileged,
        can_create_row,
        access_column_kind,
    }
}
