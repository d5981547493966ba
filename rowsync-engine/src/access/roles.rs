//! Role-list parsing and a bounded per-engine memo of parsed lists.

use std::sync::Arc;

use moka::sync::Cache;
use tracing::debug;

use rowsync_core::constants::PRIVILEGED_ROLES;
use rowsync_core::errors::RowSyncResult;

/// Parsed roles of a verified caller.
pub type Roles = Arc<[String]>;

/// Parse a JSON-encoded role list. Null, blank, and empty lists all mean an
/// unverified caller.
pub fn parse_roles(list: Option<&str>) -> RowSyncResult<Option<Roles>> {
    let Some(text) = list.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    let roles: Vec<String> = serde_json::from_str(text)?;
    if roles.is_empty() {
        return Ok(None);
    }
    Ok(Some(roles.into()))
}

pub fn has_role(roles: Option<&[String]>, role: &str) -> bool {
    roles.is_some_and(|r| r.iter().any(|candidate| candidate == role))
}

/// Holds a super-user or table-administrator role.
pub fn is_privileged(roles: Option<&[String]>) -> bool {
    PRIVILEGED_ROLES.iter().any(|role| has_role(roles, role))
}

/// Memoizes `parse_roles`. Owned by one engine, never shared globally.
pub struct RoleCache {
    parsed: Cache<String, Option<Roles>>,
}

impl RoleCache {
    pub fn new(capacity: u64) -> Self {
        Self {
            parsed: Cache::new(capacity),
        }
    }

    pub fn resolve(&self, list: Option<&str>) -> RowSyncResult<Option<Roles>> {
        let Some(text) = list else {
            return Ok(None);
        };
        if let Some(hit) = self.parsed.get(text) {
            return Ok(hit);
        }
        let roles = parse_roles(Some(text))?;
        debug!(count = roles.as_ref().map_or(0, |r| r.len()), "role list parsed");
        self.parsed.insert(text.to_string(), roles.clone());
        Ok(roles)
    }
}
