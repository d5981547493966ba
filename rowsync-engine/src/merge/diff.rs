//! Field-by-field comparison of a local version against a server row.

use std::collections::BTreeSet;

use rowsync_core::constants::*;
use rowsync_core::row::{ColumnDefinition, ElementDataType, RowVersion};

use crate::comparator::identical;

/// Metadata fields only privileged callers may contest.
const PRIVILEGED_FIELDS: [&str; 2] = [COL_FILTER_TYPE, COL_FILTER_VALUE];

/// Metadata fields compared alongside user columns. Identity, sync
/// bookkeeping and the access projection never count as a difference.
const COMPARED_METADATA: [&str; 6] = [
    COL_ROW_ETAG,
    COL_SAVEPOINT_TYPE,
    COL_SAVEPOINT_TIMESTAMP,
    COL_SAVEPOINT_CREATOR,
    COL_FORM_ID,
    COL_LOCALE,
];

/// Which classes of field differ between two versions of a row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldDiff {
    pub privileged: bool,
    pub other: bool,
    /// The server carries an attachment path that differs from ours.
    /// Implies `other`.
    pub attachments: bool,
}

impl FieldDiff {
    pub fn any(self) -> bool {
        self.privileged || self.other
    }
}

/// Compare `local` and `server`, typing user columns by `columns`.
///
/// Columns absent from the schema compare as strings. Derived columns are
/// skipped since they are not stored.
pub fn diff_versions(local: &RowVersion, server: &RowVersion, columns: &[ColumnDefinition]) -> FieldDiff {
    let mut diff = FieldDiff::default();

    for field in PRIVILEGED_FIELDS {
        if !same_text(local, server, field) {
            diff.privileged = true;
        }
    }
    for field in COMPARED_METADATA {
        if !same_text(local, server, field) {
            diff.other = true;
        }
    }

    let keys: BTreeSet<&str> = local
        .values
        .keys()
        .chain(server.values.keys())
        .map(String::as_str)
        .chain(columns.iter().filter(|c| c.retained).map(|c| c.element_key.as_str()))
        .collect();
    for key in keys {
        let column = columns.iter().find(|c| c.element_key == key);
        if column.is_some_and(|c| !c.retained) {
            continue;
        }
        let data_type = column.map_or(ElementDataType::String, |c| c.data_type);
        if !identical(local.value(key), server.value(key), data_type) {
            diff.other = true;
            if data_type == ElementDataType::Rowpath && server.value(key).is_some() {
                diff.attachments = true;
            }
        }
    }
    diff
}

fn same_text(local: &RowVersion, server: &RowVersion, field: &str) -> bool {
    identical(
        local.field_text(field).as_deref(),
        server.field_text(field).as_deref(),
        ElementDataType::String,
    )
}

/// Whether the row references any attachment file.
pub fn has_attachments(row: &RowVersion, columns: &[ColumnDefinition]) -> bool {
    columns
        .iter()
        .filter(|c| c.is_attachment())
        .any(|c| row.value(&c.element_key).is_some_and(|v| !v.is_empty()))
}
