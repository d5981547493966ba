/// rowsync version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum number of adjacent-float steps tolerated when comparing numbers.
pub const MAX_NUMERIC_ULP_STEPS: u32 = 128;

/// Prefix of generated row ids.
pub const ROW_ID_PREFIX: &str = "uuid:";

// --- Roles ---
pub const ROLE_USER: &str = "ROLE_USER";
pub const ROLE_SUPER_USER_TABLES: &str = "ROLE_SUPER_USER_TABLES";
pub const ROLE_ADMINISTER_TABLES: &str = "ROLE_ADMINISTER_TABLES";

/// Roles that bypass row ownership and visibility checks.
pub const PRIVILEGED_ROLES: [&str; 2] = [ROLE_SUPER_USER_TABLES, ROLE_ADMINISTER_TABLES];

// --- Metadata column names ---
pub const COL_ID: &str = "_id";
pub const COL_ROW_ETAG: &str = "_row_etag";
pub const COL_SYNC_STATE: &str = "_sync_state";
pub const COL_CONFLICT_TYPE: &str = "_conflict_type";
pub const COL_FILTER_TYPE: &str = "_filter_type";
pub const COL_FILTER_VALUE: &str = "_filter_value";
pub const COL_FORM_ID: &str = "_form_id";
pub const COL_LOCALE: &str = "_locale";
pub const COL_SAVEPOINT_TYPE: &str = "_savepoint_type";
pub const COL_SAVEPOINT_TIMESTAMP: &str = "_savepoint_timestamp";
pub const COL_SAVEPOINT_CREATOR: &str = "_savepoint_creator";
pub const COL_EFFECTIVE_ACCESS: &str = "_effective_access";

/// Fields a checkpoint delta may never set.
pub const CHECKPOINT_RESERVED_COLUMNS: [&str; 7] = [
    COL_SAVEPOINT_TIMESTAMP,
    COL_SAVEPOINT_TYPE,
    COL_ROW_ETAG,
    COL_SYNC_STATE,
    COL_CONFLICT_TYPE,
    COL_FILTER_TYPE,
    COL_FILTER_VALUE,
];

/// Fields computed by the engine that ordinary inserts and updates may never set.
pub const ENGINE_MANAGED_COLUMNS: [&str; 6] = [
    COL_ID,
    COL_SAVEPOINT_TIMESTAMP,
    COL_ROW_ETAG,
    COL_SYNC_STATE,
    COL_CONFLICT_TYPE,
    COL_EFFECTIVE_ACCESS,
];

/// Every metadata column name.
pub const METADATA_COLUMNS: [&str; 12] = [
    COL_ID,
    COL_ROW_ETAG,
    COL_SYNC_STATE,
    COL_CONFLICT_TYPE,
    COL_FILTER_TYPE,
    COL_FILTER_VALUE,
    COL_FORM_ID,
    COL_LOCALE,
    COL_SAVEPOINT_TYPE,
    COL_SAVEPOINT_TIMESTAMP,
    COL_SAVEPOINT_CREATOR,
    COL_EFFECTIVE_ACCESS,
];

/// Whether a column name belongs to the metadata namespace.
pub fn is_metadata_column(name: &str) -> bool {
    METADATA_COLUMNS.contains(&name)
}
