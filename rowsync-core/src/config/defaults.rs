// Single source of truth for all default values.

// --- Storage ---
pub const DEFAULT_DB_FILENAME: &str = "rowsync.db";
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5_000;
pub const DEFAULT_ATTACHMENTS_ROOT: &str = "attachments";

// --- Sync ---
pub const DEFAULT_ROLE_CACHE_CAPACITY: u64 = 64;

// --- Table security ---
pub const DEFAULT_TABLE_LOCKED: bool = false;
pub const DEFAULT_UNVERIFIED_USER_CAN_CREATE: bool = true;

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_JSON_LOGS: bool = false;
