//! Reentrant transaction scope for public operations.

use tracing::warn;

use rowsync_core::errors::RowSyncResult;
use rowsync_core::traits::SyncDatabase;

/// Result of a unit of work, and whether this call owned (and committed) the transaction.
pub(crate) struct Completed<T> {
    pub value: T,
    pub committed: bool,
}

/// Run `op` atomically. Begins a transaction only when none is open; only
/// the beginner commits or rolls back.
pub(crate) fn atomically<T>(
    db: &dyn SyncDatabase,
    op: impl FnOnce() -> RowSyncResult<T>,
) -> RowSyncResult<Completed<T>> {
    let owns = !db.in_transaction();
    if owns {
        db.begin_transaction()?;
    }
    let outcome = op().and_then(|value| {
        if owns {
            db.commit_transaction()?;
        }
        Ok(value)
    });
    match outcome {
        Ok(value) => Ok(Completed {
            value,
            committed: owns,
        }),
        Err(e) => {
            if owns && db.in_transaction() {
                if let Err(rollback) = db.rollback_transaction() {
                    warn!(error = %rollback, "rollback failed");
                }
            }
            Err(e)
        }
    }
}
