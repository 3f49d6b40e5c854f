use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::storage::{keys, KeyValueStore, StorageError};

/// User preferences, persisted under `@app_preferences`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub notifications: bool,
    pub dark_mode: bool,
    /// Serve collections from cache only
    pub offline_mode: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            notifications: true,
            dark_mode: false,
            offline_mode: false,
        }
    }
}

pub struct PreferencesStore {
    store: KeyValueStore,
    current: Preferences,
}

impl PreferencesStore {
    pub fn new(store: KeyValueStore) -> Self {
        Self {
            store,
            current: Preferences::default(),
        }
    }

    pub fn current(&self) -> &Preferences {
        &self.current
    }

    /// Load persisted preferences. Missing or unreadable data yields defaults.
    pub async fn load(&mut self) -> &Preferences {
        self.current = self.store.get(keys::PREFERENCES).await.unwrap_or_default();
        debug!(preferences = ?self.current, "Preferences loaded");
        &self.current
    }

    /// Apply `f` to a copy, persist it, and only then make it current.
    pub async fn update<F>(&mut self, f: F) -> Result<&Preferences, StorageError>
    where
        F: FnOnce(&mut Preferences),
    {
        let mut next = self.current.clone();
        f(&mut next);
        self.store.try_set(keys::PREFERENCES, &next).await?;
        info!(preferences = ?next, "Preferences updated");
        self.current = next;
        Ok(&self.current)
    }
}
