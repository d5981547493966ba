use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{RowSyncError, RowSyncResult};

/// Declared type of a user column. Drives value comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementDataType {
    Integer,
    Number,
    Bool,
    #[default]
    String,
    Array,
    Object,
    /// Relative path to a row attachment.
    Rowpath,
    Configpath,
}

impl ElementDataType {
    pub const ALL: [ElementDataType; 8] = [
        Self::Integer,
        Self::Number,
        Self::Bool,
        Self::String,
        Self::Array,
        Self::Object,
        Self::Rowpath,
        Self::Configpath,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
            Self::Rowpath => "rowpath",
            Self::Configpath => "configpath",
        }
    }
}

impl fmt::Display for ElementDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementDataType {
    type Err = RowSyncError;

    fn from_str(s: &str) -> RowSyncResult<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| RowSyncError::invalid_argument(format!("unknown data type: {s}")))
    }
}

/// One column of a table's schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub element_key: String,
    pub data_type: ElementDataType,
    /// Physically stored. Derived sub-columns of composite types are not.
    pub retained: bool,
}

impl ColumnDefinition {
    pub fn new(element_key: impl Into<String>, data_type: ElementDataType) -> Self {
        Self {
            element_key: element_key.into(),
            data_type,
            retained: true,
        }
    }

    pub fn derived(element_key: impl Into<String>, data_type: ElementDataType) -> Self {
        Self {
            retained: false,
            ..Self::new(element_key, data_type)
        }
    }

    pub fn is_attachment(&self) -> bool {
        self.data_type == ElementDataType::Rowpath
    }
}
