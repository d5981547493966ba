//! Configuration for the rowsync engine.
//!
//! # Examples
//!
//! ```
//! use rowsync_core::config::RowSyncConfig;
//!
//! let config = RowSyncConfig::from_toml("[sync]\nrole_cache_capacity = 8").unwrap();
//! assert_eq!(config.sync.role_cache_capacity, 8);
//! assert_eq!(config.storage.db_path, "rowsync.db");
//! ```

pub mod defaults;
pub mod observability_config;
pub mod storage_config;
pub mod sync_config;

use serde::{Deserialize, Serialize};

pub use observability_config::ObservabilityConfig;
pub use storage_config::StorageConfig;
pub use sync_config::SyncConfig;

use crate::errors::{RowSyncError, RowSyncResult};

/// Top-level configuration. Every section falls back to its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RowSyncConfig {
    pub storage: StorageConfig,
    pub sync: SyncConfig,
    pub observability: ObservabilityConfig,
}

impl RowSyncConfig {
    /// Parse a TOML document. Missing sections and fields take their defaults.
    pub fn from_toml(input: &str) -> RowSyncResult<Self> {
        toml::from_str(input).map_err(|e| RowSyncError::Config {
            reason: e.to_string(),
        })
    }

    /// Serialize back to TOML.
    pub fn to_toml(&self) -> RowSyncResult<String> {
        toml::to_string(self).map_err(|e| RowSyncError::Config {
            reason: e.to_string(),
        })
    }
}
