//! # rowsync-engine
//!
//! Row synchronization and access control over a [`SyncDatabase`].
//!
//! Every public operation on [`RowSyncEngine`] runs as one unit of work:
//! it joins a transaction the caller already opened, or runs in its own.
//! Attachment files of physically removed rows are purged only after a
//! commit this engine performed.
//!
//! [`SyncDatabase`]: rowsync_core::traits::SyncDatabase

pub mod access;
pub mod checkpoint;
pub mod comparator;
pub mod engine;
pub mod health;
pub mod merge;
pub mod outcome;
pub mod read;
pub mod rows;
pub mod state_machine;
pub mod telemetry;
mod unit_of_work;

pub use access::{AccessContext, EffectiveAccess, RoleCache};
pub use comparator::identical;
pub use engine::{Caller, RowSyncEngine};
pub use health::TableHealth;
pub use merge::FieldDiff;
pub use outcome::{CheckpointRemoval, DeleteOutcome, ReconcileOutcome, ResolutionOutcome};
pub use read::VisibleRow;
pub use rows::new_row_id;
pub use state_machine::{classify, RowClassification, TransitionCause};
