//! Task store configuration.
//!
//! # Responsibility
//! - Name the storage key holding the serialized task collection.
//! - Select how startup load treats a present-but-unreadable collection.

use serde::{Deserialize, Serialize};

/// Storage key used when the host does not override it.
pub const DEFAULT_STORAGE_KEY: &str = "taskManager-tasks";

/// Startup behavior when the stored collection cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptDataPolicy {
    /// Surface the decode failure to the caller.
    #[default]
    Fail,
    /// Log a warning and start with an empty collection.
    ///
    /// The unreadable value stays in storage until the first successful save
    /// overwrites it.
    TreatAsEmpty,
}

/// Configuration for `TaskStore::open`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub storage_key: String,
    pub corrupt_data: CorruptDataPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            corrupt_data: CorruptDataPolicy::default(),
        }
    }
}

impl StoreConfig {
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn with_corrupt_data(mut self, policy: CorruptDataPolicy) -> Self {
        self.corrupt_data = policy;
        self
    }
}
