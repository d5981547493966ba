//! Table-level security settings and row change kinds.

use serde::{Deserialize, Serialize};

use crate::config::defaults;
use crate::row::FilterType;

/// Per-table lock and creation settings. Immutable within one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSecuritySettings {
    pub table_id: String,
    pub is_locked: bool,
    pub can_unverified_user_create: bool,
    pub filter_type_on_creation: FilterType,
}

impl TableSecuritySettings {
    pub fn for_table(table_id: impl Into<String>) -> Self {
        Self {
            table_id: table_id.into(),
            ..Self::default()
        }
    }

    pub fn locked(mut self, is_locked: bool) -> Self {
        self.is_locked = is_locked;
        self
    }

    pub fn unverified_create(mut self, allowed: bool) -> Self {
        self.can_unverified_user_create = allowed;
        self
    }

    pub fn filter_on_creation(mut self, filter_type: FilterType) -> Self {
        self.filter_type_on_creation = filter_type;
        self
    }
}

impl Default for TableSecuritySettings {
    fn default() -> Self {
        Self {
            table_id: String::new(),
            is_locked: defaults::DEFAULT_TABLE_LOCKED,
            can_unverified_user_create: defaults::DEFAULT_UNVERIFIED_USER_CAN_CREATE,
            filter_type_on_creation: FilterType::Default,
        }
    }
}

/// The kind of mutation being authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowChange {
    NewRow,
    ChangeRow,
    DeleteRow,
}

impl RowChange {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NewRow => "new_row",
            Self::ChangeRow => "change_row",
            Self::DeleteRow => "delete_row",
        }
    }
}
