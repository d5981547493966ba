//! # rowsync-core
//!
//! Foundation crate for the rowsync engine.
//! Defines the row-version model, collaborator traits, errors, config, and constants.
//! The storage and engine crates both depend on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod row;
pub mod security;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::RowSyncConfig;
pub use errors::{RowSyncError, RowSyncResult};
pub use row::{
    ColumnDefinition, ConflictType, ElementDataType, FilterType, RowValues, RowVersion,
    SavepointType, SyncState,
};
pub use security::{RowChange, TableSecuritySettings};
