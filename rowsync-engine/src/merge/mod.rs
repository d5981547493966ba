//! Server-row reconciliation and the conflict resolution operations that
//! follow it.

pub mod diff;
mod reconcile;
mod resolve;

pub use diff::{diff_versions, has_attachments, FieldDiff};
