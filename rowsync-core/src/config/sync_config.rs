use serde::{Deserialize, Serialize};

use super::defaults;

/// Reconciliation and access-control configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Maximum number of parsed role lists kept per engine instance. Default: 64.
    pub role_cache_capacity: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            role_cache_capacity: defaults::DEFAULT_ROLE_CACHE_CAPACITY,
        }
    }
}
