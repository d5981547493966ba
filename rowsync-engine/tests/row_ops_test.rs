//! Insert, update, and delete entry points with their authorization rules.

mod common;

use common::*;
use rowsync_core::errors::RowSyncError;
use rowsync_core::row::{FilterType, RowValues, SavepointType, SyncState};
use rowsync_core::security::TableSecuritySettings;
use rowsync_core::traits::RowStore;
use rowsync_engine::DeleteOutcome;

#[test]
fn insert_creates_an_unsynced_row_owned_by_the_caller() {
    let fx = Fixture::new();
    let row = fx
        .run(|engine, store| engine.insert_row(store, TABLE, None, &values(&[("name", "Ada")]), &user("ada")))
        .unwrap();

    assert!(row.row_id.starts_with("uuid:"));
    assert_eq!(row.sync_state, SyncState::NewRow);
    assert_eq!(row.row_etag, None);
    assert_eq!(row.filter_value.as_deref(), Some("ada"));
    assert_eq!(row.savepoint_type, Some(SavepointType::Complete));
    assert_eq!(fx.versions(&row.row_id), vec![row]);
}

#[test]
fn insert_rejects_an_existing_row_id() {
    let fx = Fixture::new();
    fx.seed_synced("r1", "e1", "ada", FilterType::Default);
    let err = fx
        .run(|engine, store| engine.insert_row(store, TABLE, Some("r1"), &RowValues::new(), &user("ada")))
        .unwrap_err();
    assert!(matches!(err, RowSyncError::InvalidArgument { .. }));
}

#[test]
fn insert_rejects_engine_managed_columns() {
    let fx = Fixture::new();
    let err = fx
        .run(|engine, store| {
            engine.insert_row(store, TABLE, None, &values(&[("_sync_state", "synced")]), &user("ada"))
        })
        .unwrap_err();
    assert!(matches!(err, RowSyncError::InvalidArgument { .. }));
}

#[test]
fn locked_table_refuses_unverified_creation_but_allows_draft_edits() {
    let fx = Fixture::with_settings(TableSecuritySettings::for_table(TABLE).locked(true));
    let err = fx
        .run(|engine, store| engine.insert_row(store, TABLE, Some("r1"), &RowValues::new(), &anonymous()))
        .unwrap_err();
    assert!(err.is_not_authorized());

    fx.run(|engine, store| engine.insert_row(store, TABLE, Some("r1"), &RowValues::new(), &admin("root")))
        .unwrap();
    let edited = fx
        .run(|engine, store| engine.update_row(store, TABLE, "r1", &values(&[("name", "Bo")]), &anonymous()))
        .unwrap();
    assert_eq!(edited.sync_state, SyncState::NewRow);
    assert_eq!(edited.value("name"), Some("Bo"));
}

#[test]
fn unverified_creation_follows_the_table_setting() {
    let fx = Fixture::with_settings(TableSecuritySettings::for_table(TABLE).unverified_create(false));
    let err = fx
        .run(|engine, store| engine.insert_row(store, TABLE, None, &RowValues::new(), &anonymous()))
        .unwrap_err();
    assert!(err.is_not_authorized());
    fx.run(|engine, store| engine.insert_row(store, TABLE, None, &RowValues::new(), &user("ada")))
        .unwrap();
}

#[test]
fn update_of_a_synced_row_marks_it_changed() {
    let fx = Fixture::new();
    let seeded = fx.seed_synced("r1", "e1", "ada", FilterType::Default);
    let updated = fx
        .run(|engine, store| engine.update_row(store, TABLE, "r1", &values(&[("name", "Bo")]), &user("bob")))
        .unwrap();

    assert_eq!(updated.sync_state, SyncState::Changed);
    assert_eq!(updated.value("name"), Some("Bo"));
    assert_eq!(updated.value("weight"), Some("9.80"));
    assert_eq!(updated.row_etag.as_deref(), Some("e1"));
    assert_eq!(updated.savepoint_creator.as_deref(), Some("bob"));
    assert!(updated.savepoint_timestamp > seeded.savepoint_timestamp);
    assert_eq!(fx.versions("r1"), vec![updated]);
}

#[test]
fn update_of_a_missing_row_fails() {
    let fx = Fixture::new();
    let err = fx
        .run(|engine, store| engine.update_row(store, TABLE, "nope", &RowValues::new(), &user("ada")))
        .unwrap_err();
    assert!(matches!(err, RowSyncError::NoMatchingRow { .. }));
}

#[test]
fn update_refuses_rows_with_checkpoints() {
    let fx = Fixture::new();
    fx.seed_synced("r1", "e1", "ada", FilterType::Default);
    fx.run(|engine, store| engine.insert_checkpoint(store, TABLE, "r1", &values(&[("name", "x")]), &user("ada")))
        .unwrap();
    let err = fx
        .run(|engine, store| engine.update_row(store, TABLE, "r1", &values(&[("name", "y")]), &user("ada")))
        .unwrap_err();
    assert!(matches!(err, RowSyncError::CorruptOrHasCheckpoints { .. }));
}

#[test]
fn hidden_rows_are_writable_by_their_owner_only() {
    let fx = Fixture::new();
    fx.seed_synced("r1", "e1", "ada", FilterType::Hidden);

    let err = fx
        .run(|engine, store| engine.update_row(store, TABLE, "r1", &values(&[("name", "x")]), &user("bob")))
        .unwrap_err();
    assert!(err.is_not_authorized());
    let err = fx
        .run(|engine, store| engine.delete_row(store, TABLE, "r1", &user("bob")))
        .unwrap_err();
    assert!(err.is_not_authorized());
    assert_eq!(fx.versions("r1")[0].sync_state, SyncState::Synced);

    fx.run(|engine, store| engine.update_row(store, TABLE, "r1", &values(&[("name", "x")]), &user("ada")))
        .unwrap();
    let outcome = fx
        .run(|engine, store| engine.delete_row(store, TABLE, "r1", &user("ada")))
        .unwrap();
    assert_eq!(outcome, DeleteOutcome::MarkedDeleted);
}

#[test]
fn modify_rows_can_be_edited_but_not_deleted_by_others() {
    let fx = Fixture::new();
    fx.seed_synced("r1", "e1", "ada", FilterType::Modify);
    fx.run(|engine, store| engine.update_row(store, TABLE, "r1", &values(&[("name", "x")]), &user("bob")))
        .unwrap();
    let err = fx
        .run(|engine, store| engine.delete_row(store, TABLE, "r1", &user("bob")))
        .unwrap_err();
    assert!(err.is_not_authorized());
}

#[test]
fn unverified_callers_cannot_touch_synced_rows() {
    let fx = Fixture::new();
    fx.seed_synced("r1", "e1", "anonymous", FilterType::Default);
    let err = fx
        .run(|engine, store| engine.update_row(store, TABLE, "r1", &values(&[("name", "x")]), &anonymous()))
        .unwrap_err();
    assert!(err.is_not_authorized());
}

#[test]
fn filter_fields_need_a_privileged_caller() {
    let fx = Fixture::new();
    fx.seed_synced("r1", "e1", "ada", FilterType::Default);
    let hide = values(&[("_filter_type", "HIDDEN")]);

    let err = fx
        .run(|engine, store| engine.update_row(store, TABLE, "r1", &hide, &user("ada")))
        .unwrap_err();
    assert!(err.is_not_authorized());

    let updated = fx
        .run(|engine, store| engine.update_row(store, TABLE, "r1", &hide, &admin("root")))
        .unwrap();
    assert_eq!(updated.filter_type, FilterType::Hidden);
}

#[test]
fn locked_tables_reserve_deletion_for_privileged_callers() {
    let fx = Fixture::with_settings(TableSecuritySettings::for_table(TABLE).locked(true));
    fx.seed_synced("r1", "e1", "ada", FilterType::Default);

    fx.run(|engine, store| engine.update_row(store, TABLE, "r1", &values(&[("name", "x")]), &user("ada")))
        .unwrap();
    let err = fx
        .run(|engine, store| engine.update_row(store, TABLE, "r1", &values(&[("name", "y")]), &user("bob")))
        .unwrap_err();
    assert!(err.is_not_authorized());

    let err = fx
        .run(|engine, store| engine.delete_row(store, TABLE, "r1", &user("ada")))
        .unwrap_err();
    assert!(err.is_not_authorized());
    let outcome = fx
        .run(|engine, store| engine.delete_row(store, TABLE, "r1", &admin("root")))
        .unwrap();
    assert_eq!(outcome, DeleteOutcome::MarkedDeleted);
}

#[test]
fn deleting_an_unsynced_row_removes_it_and_its_attachments() {
    let fx = Fixture::new();
    let row = fx
        .run(|engine, store| engine.insert_row(store, TABLE, Some("r1"), &RowValues::new(), &user("ada")))
        .unwrap();
    let file = fx.attach_file(&row.row_id);

    let outcome = fx
        .run(|engine, store| engine.delete_row(store, TABLE, "r1", &user("ada")))
        .unwrap();
    assert_eq!(outcome, DeleteOutcome::PhysicallyRemoved);
    assert!(fx.versions("r1").is_empty());
    assert!(!file.exists());
}

#[test]
fn deleting_a_synced_row_marks_it_deleted() {
    let fx = Fixture::new();
    let seeded = fx.seed_synced("r1", "e1", "ada", FilterType::Default);
    let file = fx.attach_file("r1");

    let outcome = fx
        .run(|engine, store| engine.delete_row(store, TABLE, "r1", &user("ada")))
        .unwrap();
    assert_eq!(outcome, DeleteOutcome::MarkedDeleted);

    let versions = fx.versions("r1");
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].sync_state, SyncState::Deleted);
    assert!(versions[0].savepoint_timestamp > seeded.savepoint_timestamp);
    assert!(file.exists());

    let again = fx
        .run(|engine, store| engine.delete_row(store, TABLE, "r1", &user("ada")))
        .unwrap();
    assert_eq!(again, DeleteOutcome::MarkedDeleted);
}

#[test]
fn deletes_inside_a_caller_transaction_leave_attachment_cleanup_to_the_caller() {
    let fx = Fixture::new();
    fx.run(|engine, store| engine.insert_row(store, TABLE, Some("r1"), &RowValues::new(), &user("ada")))
        .unwrap();
    let file = fx.attach_file("r1");

    fx.run(|engine, store| {
        store.begin_transaction()?;
        let outcome = engine.delete_row(store, TABLE, "r1", &user("ada"))?;
        assert_eq!(outcome, DeleteOutcome::PhysicallyRemoved);
        assert!(file.exists());
        store.commit_transaction()
    })
    .unwrap();

    assert!(fx.versions("r1").is_empty());
    assert!(file.exists());
    fx.engine.purge_attachments(TABLE, "r1");
    assert!(!file.exists());
}

#[test]
fn sync_state_reports_the_local_version() {
    let fx = Fixture::new();
    assert_eq!(fx.run(|engine, store| engine.sync_state(store, TABLE, "r1")).unwrap(), None);
    fx.seed_synced("r1", "e1", "ada", FilterType::Default);
    assert_eq!(
        fx.run(|engine, store| engine.sync_state(store, TABLE, "r1")).unwrap(),
        Some(SyncState::Synced)
    );
}
