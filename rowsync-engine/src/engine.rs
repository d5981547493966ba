//! `RowSyncEngine`: entry point for every row operation. Operations are
//! implemented across `rows`, `checkpoint`, `merge`, and `read`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use rowsync_core::config::SyncConfig;
use rowsync_core::constants::{COL_FILTER_TYPE, COL_FILTER_VALUE, ENGINE_MANAGED_COLUMNS};
use rowsync_core::errors::{RowSyncError, RowSyncResult};
use rowsync_core::row::RowValues;
use rowsync_core::traits::{AttachmentStore, SyncDatabase};

use crate::access::{can_modify_filter_fields, resolve_access, AccessContext, RoleCache, Roles};

/// Who is asking. `roles_list` is the JSON-encoded role array; `None` means unverified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub active_user: String,
    pub roles_list: Option<String>,
}

impl Caller {
    pub fn new(active_user: impl Into<String>, roles_list: Option<&str>) -> Self {
        Self {
            active_user: active_user.into(),
            roles_list: roles_list.map(str::to_string),
        }
    }

    pub fn unverified(active_user: impl Into<String>) -> Self {
        Self::new(active_user, None)
    }
}

pub struct RowSyncEngine {
    attachments: Arc<dyn AttachmentStore>,
    roles: RoleCache,
}

impl RowSyncEngine {
    pub fn new(config: &SyncConfig, attachments: Arc<dyn AttachmentStore>) -> Self {
        Self {
            attachments,
            roles: RoleCache::new(config.role_cache_capacity),
        }
    }

    pub(crate) fn caller_roles(&self, caller: &Caller) -> RowSyncResult<Option<Roles>> {
        self.roles.resolve(caller.roles_list.as_deref())
    }

    /// Resolve the caller against a table's security settings.
    pub fn access_context(
        &self,
        db: &dyn SyncDatabase,
        table_id: Option<&str>,
        caller: &Caller,
    ) -> RowSyncResult<AccessContext> {
        let settings = table_id.map(|t| db.security_settings(t)).transpose()?;
        let roles = self.caller_roles(caller)?;
        Ok(resolve_access(settings.as_ref(), &caller.active_user, roles))
    }

    /// Remove a row's attachment files. Failures are logged, never raised.
    pub fn purge_attachments(&self, table_id: &str, row_id: &str) {
        if let Err(e) = self.attachments.delete_all_for_row(table_id, row_id) {
            warn!(table = %table_id, row = %row_id, error = %e, "attachment cleanup failed");
        }
    }

    /// Cleanup after a physical delete. Only the transaction owner may purge;
    /// otherwise the outer caller does it once its transaction commits.
    pub(crate) fn after_physical_delete(&self, committed: bool, table_id: &str, row_id: &str) {
        if committed {
            self.purge_attachments(table_id, row_id);
        } else {
            debug!(table = %table_id, row = %row_id, "attachment cleanup deferred to transaction owner");
        }
    }
}

/// Reject values an ordinary insert or update may not carry.
pub(crate) fn validate_row_values(
    table_id: &str,
    values: &RowValues,
    roles: Option<&[String]>,
) -> RowSyncResult<()> {
    if let Some(column) = values
        .keys()
        .find(|k| ENGINE_MANAGED_COLUMNS.contains(&k.as_str()))
    {
        return Err(RowSyncError::invalid_argument(format!(
            "column {column} is managed by the engine"
        )));
    }
    let sets_filter = values.contains_key(COL_FILTER_TYPE) || values.contains_key(COL_FILTER_VALUE);
    if sets_filter && !can_modify_filter_fields(roles) {
        return Err(RowSyncError::not_authorized(
            table_id,
            "only privileged users may set row filter fields",
        ));
    }
    Ok(())
}
