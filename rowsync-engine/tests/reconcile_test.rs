//! Server-row reconciliation outcomes.

mod common;

use common::*;
use rowsync_core::errors::RowSyncError;
use rowsync_core::row::{ConflictType, FilterType, RowVersion, SyncState};
use rowsync_core::traits::RowStore;
use rowsync_engine::ReconcileOutcome;

fn reconcile(fx: &Fixture, server: &RowVersion) -> Result<ReconcileOutcome, RowSyncError> {
    fx.run(|engine, store| engine.reconcile(store, TABLE, server, &user("ada")))
}

fn side(versions: &[RowVersion], conflict: ConflictType) -> &RowVersion {
    versions
        .iter()
        .find(|v| v.conflict_type == Some(conflict))
        .unwrap_or_else(|| panic!("no {conflict} version in {versions:?}"))
}

fn assert_single_pair(versions: &[RowVersion]) {
    let local = versions.iter().filter(|v| v.conflict_type.is_some_and(|c| c.is_local())).count();
    let server = versions.iter().filter(|v| v.conflict_type.is_some_and(|c| c.is_server())).count();
    assert!(local <= 1 && server <= 1, "{versions:?}");
}

/// A synced row edited locally by its owner.
fn changed_row(fx: &Fixture) -> RowVersion {
    fx.seed_synced("r1", "e1", "ada", FilterType::Default);
    fx.run(|engine, store| engine.update_row(store, TABLE, "r1", &values(&[("name", "Local")]), &user("ada")))
        .unwrap()
}

#[test]
fn diverging_edits_fork_into_a_conflict_pair() {
    let fx = Fixture::new();
    let local = changed_row(&fx);
    let mut server = server_copy(&local, "e2");
    server.values.insert("name".into(), Some("Server".into()));

    assert_eq!(reconcile(&fx, &server).unwrap(), ReconcileOutcome::ConflictCreated);

    let versions = fx.versions("r1");
    assert_eq!(versions.len(), 2);
    let mine = side(&versions, ConflictType::LocalUpdatedUpdatedValues);
    let theirs = side(&versions, ConflictType::ServerUpdatedUpdatedValues);
    assert_eq!(mine.sync_state, SyncState::InConflict);
    assert_eq!(mine.value("name"), Some("Local"));
    assert_eq!(mine.row_etag.as_deref(), Some("e1"));
    assert_eq!(theirs.sync_state, SyncState::InConflict);
    assert_eq!(theirs.value("name"), Some("Server"));
    assert_eq!(theirs.row_etag.as_deref(), Some("e2"));
}

#[test]
fn filter_only_differences_still_conflict_for_any_caller() {
    for caller in [user("ada"), admin("root")] {
        let fx = Fixture::new();
        let local = changed_row(&fx);
        let mut server = server_copy(&local, "e2");
        server.filter_type = FilterType::Hidden;
        server.filter_value = Some("root".into());

        let outcome = fx
            .run(|engine, store| engine.reconcile(store, TABLE, &server, &caller))
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::ConflictCreated);
        assert_eq!(fx.versions("r1").len(), 2);
    }
}

#[test]
fn identical_server_row_leaves_a_synced_row_alone() {
    let fx = Fixture::new();
    let seeded = fx.seed_synced("r1", "e1", "ada", FilterType::Default);
    let mut server = seeded.clone();
    server.values.insert("weight".into(), Some("9.8".into()));

    assert_eq!(reconcile(&fx, &server).unwrap(), ReconcileOutcome::Unchanged);
    assert_eq!(fx.versions("r1"), vec![seeded]);
}

#[test]
fn newer_server_values_overwrite_a_synced_row_once() {
    let fx = Fixture::new();
    let seeded = fx.seed_synced("r1", "e1", "ada", FilterType::Default);
    let mut server = server_copy(&seeded, "e2");
    server.values.insert("weight".into(), Some("10.5".into()));

    assert_eq!(reconcile(&fx, &server).unwrap(), ReconcileOutcome::ServerValuesApplied);
    let after_first = fx.versions("r1");
    assert_eq!(after_first.len(), 1);
    assert_eq!(after_first[0].sync_state, SyncState::Synced);
    assert_eq!(after_first[0].row_etag.as_deref(), Some("e2"));
    assert_eq!(after_first[0].value("weight"), Some("10.5"));

    assert_eq!(reconcile(&fx, &server).unwrap(), ReconcileOutcome::Unchanged);
    assert_eq!(fx.versions("r1"), after_first);
}

#[test]
fn new_attachments_leave_files_pending() {
    let fx = Fixture::new();
    let seeded = fx.seed_synced("r1", "e1", "ada", FilterType::Default);
    let mut server = server_copy(&seeded, "e2");
    server.values.insert("photo".into(), Some("photo.jpg".into()));

    assert_eq!(reconcile(&fx, &server).unwrap(), ReconcileOutcome::ServerValuesApplied);
    assert_eq!(fx.versions("r1")[0].sync_state, SyncState::SyncedPendingFiles);
}

#[test]
fn server_deletion_of_a_synced_row_removes_it() {
    let fx = Fixture::new();
    let seeded = fx.seed_synced("r1", "e1", "ada", FilterType::Default);
    let file = fx.attach_file("r1");
    let mut server = server_copy(&seeded, "e2");
    server.sync_state = SyncState::Deleted;

    assert_eq!(reconcile(&fx, &server).unwrap(), ReconcileOutcome::Removed);
    assert!(fx.versions("r1").is_empty());
    assert!(!file.exists());
}

#[test]
fn server_deletion_confirms_a_local_deletion() {
    let fx = Fixture::new();
    let seeded = fx.seed_synced("r1", "e1", "ada", FilterType::Default);
    fx.run(|engine, store| engine.delete_row(store, TABLE, "r1", &user("ada")))
        .unwrap();
    let mut server = server_copy(&seeded, "e2");
    server.sync_state = SyncState::Deleted;

    assert_eq!(reconcile(&fx, &server).unwrap(), ReconcileOutcome::Removed);
    assert!(fx.versions("r1").is_empty());
}

#[test]
fn server_deletion_of_a_changed_row_conflicts() {
    let fx = Fixture::new();
    let local = changed_row(&fx);
    let mut server = server_copy(&local, "e2");
    server.sync_state = SyncState::Deleted;

    assert_eq!(reconcile(&fx, &server).unwrap(), ReconcileOutcome::ConflictCreated);
    let versions = fx.versions("r1");
    side(&versions, ConflictType::LocalUpdatedUpdatedValues);
    side(&versions, ConflictType::ServerDeletedOldValues);
}

#[test]
fn server_update_of_a_locally_deleted_row_conflicts() {
    let fx = Fixture::new();
    let seeded = fx.seed_synced("r1", "e1", "ada", FilterType::Default);
    fx.run(|engine, store| engine.delete_row(store, TABLE, "r1", &user("ada")))
        .unwrap();
    let server = server_copy(&seeded, "e2");

    assert_eq!(reconcile(&fx, &server).unwrap(), ReconcileOutcome::ConflictCreated);
    let versions = fx.versions("r1");
    side(&versions, ConflictType::LocalDeletedOldValues);
    side(&versions, ConflictType::ServerUpdatedUpdatedValues);
}

#[test]
fn repeated_reconcile_of_a_conflict_is_stable() {
    let fx = Fixture::new();
    let local = changed_row(&fx);
    let mut server = server_copy(&local, "e2");
    server.values.insert("name".into(), Some("Server".into()));

    reconcile(&fx, &server).unwrap();
    let first = fx.versions("r1");
    reconcile(&fx, &server).unwrap();
    let second = fx.versions("r1");
    assert_eq!(first, second);
    assert_single_pair(&second);
}

#[test]
fn echo_of_our_own_etag_clears_the_conflict() {
    let fx = Fixture::new();
    let local = changed_row(&fx);
    let mut server = server_copy(&local, "e2");
    server.values.insert("name".into(), Some("Server".into()));
    reconcile(&fx, &server).unwrap();

    let echo = server_copy(&local, "e1");
    assert_eq!(reconcile(&fx, &echo).unwrap(), ReconcileOutcome::EchoAcknowledged);
    let versions = fx.versions("r1");
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].sync_state, SyncState::Changed);
    assert_eq!(versions[0].conflict_type, None);
    assert_eq!(versions[0].value("name"), Some("Local"));
}

#[test]
fn unknown_rows_and_checkpointed_rows_are_rejected() {
    let fx = Fixture::new();
    let stranger = server_copy(&RowVersion::new(TABLE, "ghost", chrono::Utc::now()), "e1");
    assert!(matches!(
        reconcile(&fx, &stranger).unwrap_err(),
        RowSyncError::NoMatchingRow { .. }
    ));

    let seeded = fx.seed_synced("r1", "e1", "ada", FilterType::Default);
    fx.run(|engine, store| engine.insert_checkpoint(store, TABLE, "r1", &values(&[("name", "x")]), &user("ada")))
        .unwrap();
    assert!(matches!(
        reconcile(&fx, &server_copy(&seeded, "e2")).unwrap_err(),
        RowSyncError::CorruptOrHasCheckpoints { .. }
    ));
}

#[test]
fn failed_reconcile_rolls_back_every_write() {
    let fx = Fixture::new();
    let local = changed_row(&fx);
    let mut server = server_copy(&local, "e2");
    server.values.insert("name".into(), Some("Server".into()));
    reconcile(&fx, &server).unwrap();

    let mut stray = local.clone();
    stray.savepoint_type = None;
    stray.savepoint_timestamp += chrono::Duration::seconds(1);
    fx.storage.with_store(|store| store.insert(&stray)).unwrap();
    let before = fx.versions("r1");

    assert!(matches!(
        reconcile(&fx, &server).unwrap_err(),
        RowSyncError::CorruptOrHasCheckpoints { .. }
    ));
    assert_eq!(fx.versions("r1"), before);
}

#[test]
fn cleared_attachment_leaves_the_row_synced() {
    let fx = Fixture::new();
    let mut seeded = fx.seed_synced("r1", "e1", "ada", FilterType::Default);
    seeded.values.insert("photo".into(), Some("a.jpg".into()));
    fx.overwrite(&seeded);
    let mut server = server_copy(&seeded, "e2");
    server.values.insert("photo".into(), None);

    assert_eq!(reconcile(&fx, &server).unwrap(), ReconcileOutcome::ServerValuesApplied);
    let versions = fx.versions("r1");
    assert_eq!(versions[0].sync_state, SyncState::Synced);
    assert_eq!(versions[0].value("photo"), None);
}

#[test]
fn filter_only_change_without_etags_is_adopted_for_non_privileged_callers() {
    let fx = Fixture::new();
    let local = fx
        .run(|engine, store| engine.insert_row(store, TABLE, Some("r1"), &values(&[("name", "Ada")]), &user("ada")))
        .unwrap();
    let mut server = local.clone();
    server.sync_state = SyncState::Synced;
    server.filter_type = FilterType::Hidden;
    server.filter_value = Some("root".into());

    assert_eq!(reconcile(&fx, &server).unwrap(), ReconcileOutcome::AutoResolved);
    let versions = fx.versions("r1");
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].sync_state, SyncState::Synced);
    assert_eq!(versions[0].conflict_type, None);
    assert_eq!(versions[0].row_etag, None);
    assert_eq!(versions[0].filter_type, FilterType::Hidden);
    assert_eq!(versions[0].filter_value.as_deref(), Some("root"));
    assert_eq!(versions[0].value("name"), Some("Ada"));
}

#[test]
fn stray_conflict_markers_are_corrupt_state() {
    let fx = Fixture::new();
    let mut tagged = fx.seed_synced("r1", "e1", "ada", FilterType::Default);
    tagged.conflict_type = Some(ConflictType::LocalUpdatedUpdatedValues);
    fx.overwrite(&tagged);
    assert!(matches!(
        reconcile(&fx, &server_copy(&tagged, "e2")).unwrap_err(),
        RowSyncError::CorruptState { .. }
    ));
    assert_eq!(fx.versions("r1"), vec![tagged]);

    let mut untagged = fx.seed_synced("r2", "e1", "ada", FilterType::Default);
    untagged.sync_state = SyncState::InConflict;
    fx.overwrite(&untagged);
    assert!(matches!(
        reconcile(&fx, &server_copy(&untagged, "e2")).unwrap_err(),
        RowSyncError::CorruptState { .. }
    ));
    assert_eq!(fx.versions("r2"), vec![untagged]);
}

#[test]
fn server_deletion_of_a_conflicted_local_update_replaces_the_server_side() {
    let fx = Fixture::new();
    let local = changed_row(&fx);
    let mut server = server_copy(&local, "e2");
    server.values.insert("name".into(), Some("Server".into()));
    reconcile(&fx, &server).unwrap();

    let mut deletion = server_copy(&local, "e3");
    deletion.sync_state = SyncState::Deleted;
    assert_eq!(reconcile(&fx, &deletion).unwrap(), ReconcileOutcome::ConflictCreated);

    let versions = fx.versions("r1");
    assert_eq!(versions.len(), 2);
    assert_eq!(side(&versions, ConflictType::LocalUpdatedUpdatedValues).value("name"), Some("Local"));
    let theirs = side(&versions, ConflictType::ServerDeletedOldValues);
    assert_eq!(theirs.row_etag.as_deref(), Some("e3"));
}

#[test]
fn server_deletion_of_a_conflicted_local_deletion_removes_the_row() {
    let fx = Fixture::new();
    let seeded = fx.seed_synced("r1", "e1", "ada", FilterType::Default);
    fx.run(|engine, store| engine.delete_row(store, TABLE, "r1", &user("ada")))
        .unwrap();
    reconcile(&fx, &server_copy(&seeded, "e2")).unwrap();
    side(&fx.versions("r1"), ConflictType::LocalDeletedOldValues);
    let file = fx.attach_file("r1");

    let mut deletion = server_copy(&seeded, "e3");
    deletion.sync_state = SyncState::Deleted;
    assert_eq!(reconcile(&fx, &deletion).unwrap(), ReconcileOutcome::Removed);
    assert!(fx.versions("r1").is_empty());
    assert!(!file.exists());
}
