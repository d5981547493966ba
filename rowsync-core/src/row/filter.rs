use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{RowSyncError, RowSyncResult};

/// Row-level access-control tag. Paired with the owning identity in `filter_value`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterType {
    /// Anyone may read, modify, and delete.
    #[default]
    Default,
    /// Anyone may read and modify; only owner or privileged may delete.
    Modify,
    /// Anyone may read; only owner or privileged may write.
    ReadOnly,
    /// Only owner or privileged may see or write.
    Hidden,
}

impl FilterType {
    pub const ALL: [FilterType; 4] = [Self::Default, Self::Modify, Self::ReadOnly, Self::Hidden];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "DEFAULT",
            Self::Modify => "MODIFY",
            Self::ReadOnly => "READ_ONLY",
            Self::Hidden => "HIDDEN",
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterType {
    type Err = RowSyncError;

    fn from_str(s: &str) -> RowSyncResult<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| RowSyncError::invalid_argument(format!("unknown filter type: {s}")))
    }
}
