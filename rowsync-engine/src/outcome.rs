//! Typed results of mutating operations.
//!
//! Variants that physically remove a row imply attachment cleanup. When the
//! operation ran inside a transaction the caller opened, that cleanup is the
//! caller's job after commit (`RowSyncEngine::purge_attachments`).

use rowsync_core::row::RowVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Never synced, so every version was removed.
    PhysicallyRemoved,
    /// Soft-deleted; the deletion syncs to the server later.
    MarkedDeleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointRemoval {
    /// Nothing but checkpoints existed; the row is gone.
    FullyRemoved,
    Retained,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Server deletion applied; the row no longer exists locally.
    Removed,
    /// Server row matched the synced local row.
    Unchanged,
    /// Server values overwrote a synced local row.
    ServerValuesApplied,
    /// Server row carries our own etag; any conflict markers were cleared.
    EchoAcknowledged,
    ConflictCreated,
    /// Only filter fields differed and the server's were adopted.
    AutoResolved,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionOutcome {
    /// The surviving local version.
    Kept(RowVersion),
    Removed,
}
