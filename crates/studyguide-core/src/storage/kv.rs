use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use super::{MemoryBackend, StorageBackend, StorageError};

/// JSON key-value store over a [`StorageBackend`].
///
/// The plain methods are best-effort: storage is a durability aid, the
/// in-memory state of each component is authoritative for the session. A
/// failing `get` logs and yields `None`; failing writes log and return.
/// Callers that must observe failures use `try_get` / `try_set`.
///
/// Clone is cheap and shares the backend.
#[derive(Clone)]
pub struct KeyValueStore {
    backend: Arc<dyn StorageBackend>,
}

impl KeyValueStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// A store that lives only as long as the process
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Failed to read from storage");
                None
            }
        }
    }

    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = self.try_set(key, value).await {
            warn!(key, error = %e, "Failed to write to storage");
        }
    }

    pub async fn remove(&self, key: &str) {
        if let Err(e) = self.backend.delete(key).await {
            warn!(key, error = %e, "Failed to remove from storage");
        }
    }

    pub async fn clear(&self) {
        if let Err(e) = self.backend.clear().await {
            warn!(error = %e, "Failed to clear storage");
        }
    }

    /// The stored JSON text for `key`, unparsed
    pub async fn get_raw(&self, key: &str) -> Option<String> {
        match self.backend.read(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Failed to read from storage");
                None
            }
        }
    }

    pub async fn try_get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let Some(raw) = self.backend.read(key).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StorageError::Parse {
                key: key.to_string(),
                source,
            })
    }

    pub async fn try_set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.backend.write(key, json).await
    }
}
