//! The row-version model: one logical row may be stored as several versions
//! (a checkpoint chain, or a conflict pair) sharing a `row_id`.

pub mod columns;
pub mod filter;
pub mod savepoint;
pub mod sync_state;
pub mod version;

pub use columns::{ColumnDefinition, ElementDataType};
pub use filter::FilterType;
pub use savepoint::{format_timestamp, next_timestamp, parse_timestamp, SavepointType};
pub use sync_state::{ConflictType, SyncState};
pub use version::{RowValues, RowVersion};
