use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{RowSyncError, RowSyncResult};

/// Savepoint kind of a non-checkpoint version. Checkpoints carry none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SavepointType {
    Complete,
    Incomplete,
}

impl SavepointType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "COMPLETE",
            Self::Incomplete => "INCOMPLETE",
        }
    }
}

impl fmt::Display for SavepointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SavepointType {
    type Err = RowSyncError;

    fn from_str(s: &str) -> RowSyncResult<Self> {
        match s.to_ascii_uppercase().as_str() {
            "COMPLETE" => Ok(Self::Complete),
            "INCOMPLETE" => Ok(Self::Incomplete),
            _ => Err(RowSyncError::invalid_argument(format!(
                "unknown savepoint type: {s}"
            ))),
        }
    }
}

/// Fixed-width, lexically sortable text form of a savepoint timestamp.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn parse_timestamp(text: &str) -> RowSyncResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| RowSyncError::invalid_argument(format!("bad savepoint timestamp {text}: {e}")))
}

/// A timestamp strictly later than `previous`, and no earlier than now.
pub fn next_timestamp(previous: Option<&DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    match previous {
        Some(prev) if *prev >= now => *prev + Duration::nanoseconds(1),
        _ => now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatted_timestamps_sort_chronologically() {
        let a = Utc::now();
        let b = a + Duration::nanoseconds(1);
        assert!(format_timestamp(&a) < format_timestamp(&b));
        assert_eq!(parse_timestamp(&format_timestamp(&a)).unwrap(), a);
    }

    #[test]
    fn next_timestamp_is_strictly_later_than_a_future_predecessor() {
        let future = Utc::now() + Duration::hours(1);
        assert!(next_timestamp(Some(&future)) > future);
    }
}
