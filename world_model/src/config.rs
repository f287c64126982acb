//! Merge and exchange configuration.

use serde::{Deserialize, Serialize};

use crate::entities::UpsertOrigin;
use crate::error::ConfigError;

/// Controls how proposed entities are reconciled with the store.
///
/// Loadable from TOML:
///
/// ```toml
/// enabled = true
/// auto_merge_on_import = false
/// backup_before_import = true
/// lock_timeout_secs = 30
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Merge model-proposed entities into existing ones of the same name.
    pub enabled: bool,

    /// Merge imported entities into existing ones; otherwise they are skipped.
    #[serde(alias = "autoMergeOnImport")]
    pub auto_merge_on_import: bool,

    /// Snapshot the store before an import.
    #[serde(alias = "backupBeforeImport")]
    pub backup_before_import: bool,

    /// Age after which a held exchange lock counts as stale.
    #[serde(alias = "lockTimeoutSecs")]
    pub lock_timeout_secs: u64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_merge_on_import: true,
            backup_before_import: true,
            lock_timeout_secs: 30,
        }
    }
}

impl MergeConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// Whether an upsert from `origin` may merge into an existing entity.
    pub fn allows_merge(&self, origin: UpsertOrigin) -> bool {
        match origin {
            UpsertOrigin::Model => self.enabled,
            UpsertOrigin::Import => self.enabled && self.auto_merge_on_import,
        }
    }
}
