use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::savepoint::format_timestamp;
use super::{ConflictType, FilterType, SavepointType, SyncState};
use crate::constants::*;
use crate::errors::{RowSyncError, RowSyncResult};

/// Column name to text-encoded value. `None` is SQL null.
pub type RowValues = BTreeMap<String, Option<String>>;

/// One physical version of a logical row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowVersion {
    pub row_id: String,
    pub table_id: String,
    pub row_etag: Option<String>,
    pub sync_state: SyncState,
    pub conflict_type: Option<ConflictType>,
    pub filter_type: FilterType,
    pub filter_value: Option<String>,
    /// `None` marks a checkpoint.
    pub savepoint_type: Option<SavepointType>,
    pub savepoint_timestamp: DateTime<Utc>,
    pub savepoint_creator: Option<String>,
    pub form_id: Option<String>,
    pub locale: Option<String>,
    /// User-defined columns.
    pub values: RowValues,
}

impl RowVersion {
    /// A complete, never-synced version with default filtering and no values.
    pub fn new(
        table_id: impl Into<String>,
        row_id: impl Into<String>,
        savepoint_timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            row_id: row_id.into(),
            table_id: table_id.into(),
            row_etag: None,
            sync_state: SyncState::NewRow,
            conflict_type: None,
            filter_type: FilterType::Default,
            filter_value: None,
            savepoint_type: Some(SavepointType::Complete),
            savepoint_timestamp,
            savepoint_creator: None,
            form_id: None,
            locale: None,
            values: RowValues::new(),
        }
    }

    pub fn with_value(mut self, column: &str, value: Option<&str>) -> Self {
        self.values.insert(column.to_string(), value.map(str::to_string));
        self
    }

    pub fn is_checkpoint(&self) -> bool {
        self.savepoint_type.is_none()
    }

    pub fn is_owned_by(&self, user: &str) -> bool {
        self.filter_value.as_deref() == Some(user)
    }

    pub fn value(&self, column: &str) -> Option<&str> {
        self.values.get(column).and_then(|v| v.as_deref())
    }

    /// Text form of a metadata field or user column, as compared during merges.
    pub fn field_text(&self, column: &str) -> Option<String> {
        match column {
            COL_ID => Some(self.row_id.clone()),
            COL_ROW_ETAG => self.row_etag.clone(),
            COL_SYNC_STATE => Some(self.sync_state.as_str().to_string()),
            COL_CONFLICT_TYPE => self.conflict_type.map(|c| c.code().to_string()),
            COL_FILTER_TYPE => Some(self.filter_type.as_str().to_string()),
            COL_FILTER_VALUE => self.filter_value.clone(),
            COL_FORM_ID => self.form_id.clone(),
            COL_LOCALE => self.locale.clone(),
            COL_SAVEPOINT_TYPE => self.savepoint_type.map(|s| s.as_str().to_string()),
            COL_SAVEPOINT_TIMESTAMP => Some(format_timestamp(&self.savepoint_timestamp)),
            COL_SAVEPOINT_CREATOR => self.savepoint_creator.clone(),
            _ => self.values.get(column).cloned().flatten(),
        }
    }

    /// Overlay caller-supplied values. Metadata columns route to their fields;
    /// engine-managed columns are rejected.
    pub fn apply_values(&mut self, values: &RowValues) -> RowSyncResult<()> {
        for (column, value) in values {
            match column.as_str() {
                COL_FORM_ID => self.form_id = value.clone(),
                COL_LOCALE => self.locale = value.clone(),
                COL_SAVEPOINT_CREATOR => self.savepoint_creator = value.clone(),
                COL_SAVEPOINT_TYPE => {
                    self.savepoint_type = value
                        .as_deref()
                        .map(str::parse::<SavepointType>)
                        .transpose()?
                }
                COL_FILTER_TYPE => {
                    self.filter_type = match value.as_deref() {
                        Some(text) => text.parse()?,
                        None => FilterType::Default,
                    }
                }
                COL_FILTER_VALUE => self.filter_value = value.clone(),
                other if is_metadata_column(other) => {
                    return Err(RowSyncError::invalid_argument(format!(
                        "column {other} is managed by the engine"
                    )))
                }
                other => {
                    self.values.insert(other.to_string(), value.clone());
                }
            }
        }
        Ok(())
    }

    /// Copy everything but identity and sync bookkeeping from another version.
    pub fn adopt_contents_of(&mut self, other: &RowVersion) {
        self.row_etag = other.row_etag.clone();
        self.filter_type = other.filter_type;
        self.filter_value = other.filter_value.clone();
        self.savepoint_type = other.savepoint_type;
        self.savepoint_timestamp = other.savepoint_timestamp;
        self.savepoint_creator = other.savepoint_creator.clone();
        self.form_id = other.form_id.clone();
        self.locale = other.locale.clone();
        self.values = other.values.clone();
    }
}
