use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::FetchError;
use crate::api::ApiError;
use crate::config::Config;
use crate::models::ItemType;
use crate::storage::KeyValueStore;

/// Persisted cache record: `{ "data": [...], "timestamp": <epoch ms> }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: Vec<T>,
    pub timestamp: i64,
}

impl<T> CacheEntry<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            data,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Fresh iff `now - timestamp < ttl`
    pub fn is_fresh_at(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        now.timestamp_millis() - self.timestamp < ttl.num_milliseconds()
    }
}

/// Just the timestamp of an entry, for age checks that don't need the data.
#[derive(Debug, Deserialize)]
struct CacheStamp {
    timestamp: i64,
}

fn age_minutes(timestamp: i64, now: DateTime<Utc>) -> i64 {
    (now.timestamp_millis() - timestamp) / 60_000
}

/// Human-readable age: "just now", "5m ago", "3h ago", "2d ago".
/// Hours and days round up from the half.
fn age_display(timestamp: i64, now: DateTime<Utc>) -> String {
    let minutes = age_minutes(timestamp, now);
    if minutes < 1 {
        // Also covers clock skew
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        let remaining_mins = minutes % 60;
        if remaining_mins >= 30 {
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        let days = minutes / 1440;
        let remaining_hours = (minutes % 1440) / 60;
        if remaining_hours >= 12 {
            format!("{}d ago", days + 1)
        } else {
            format!("{}d ago", days)
        }
    }
}

/// Where a collection handed to the caller came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// Fresh entry served without a network call
    Cache,
    /// Just fetched from the remote
    Network,
    /// Expired entry served because the remote failed (or offline)
    Stale,
}

/// A whole collection from exactly one fetch or one cache read.
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub items: Vec<T>,
    pub source: DataSource,
    /// Epoch ms at which the data was obtained from the remote
    pub timestamp: i64,
}

impl<T> Fetched<T> {
    pub fn is_stale(&self) -> bool {
        self.source == DataSource::Stale
    }
}

#[derive(Clone)]
pub struct CacheManager {
    store: KeyValueStore,
    ttl: chrono::Duration,
    fetch_timeout: Duration,
}

impl CacheManager {
    pub fn new(store: KeyValueStore, ttl: chrono::Duration, fetch_timeout: Duration) -> Self {
        Self {
            store,
            ttl,
            fetch_timeout,
        }
    }

    pub fn from_config(store: KeyValueStore, config: &Config) -> Self {
        Self::new(store, config.cache_ttl(), config.request_timeout())
    }

    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    async fn load<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        self.store.get(key).await
    }

    /// Read-through fetch with stale fallback.
    ///
    /// 1. A fresh entry is returned as-is; `fetch` is not called.
    /// 2. Otherwise `fetch` runs under the fetch timeout; its result is
    ///    cached and returned.
    /// 3. If it fails or times out, any entry for `key` is returned flagged
    ///    stale, regardless of age. With no entry the error propagates.
    pub async fn fetch_with_cache<T, F, Fut>(&self, key: &str, fetch: F) -> Result<Fetched<T>, FetchError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, ApiError>>,
    {
        if let Some(entry) = self.load::<T>(key).await {
            if entry.is_fresh_at(Utc::now(), self.ttl) {
                debug!(key, items = entry.data.len(), "Cache hit");
                return Ok(Fetched {
                    items: entry.data,
                    source: DataSource::Cache,
                    timestamp: entry.timestamp,
                });
            }
            debug!(key, "Cache entry expired");
        } else {
            debug!(key, "Cache miss");
        }

        let failure = match tokio::time::timeout(self.fetch_timeout, fetch()).await {
            Ok(Ok(items)) => {
                let entry = CacheEntry::new(items);
                self.store.set(key, &entry).await;
                info!(key, items = entry.data.len(), "Fetched and cached collection");
                return Ok(Fetched {
                    items: entry.data,
                    source: DataSource::Network,
                    timestamp: entry.timestamp,
                });
            }
            Ok(Err(source)) => FetchError::Api {
                key: key.to_string(),
                source,
            },
            Err(_) => FetchError::Timeout {
                key: key.to_string(),
                timeout: self.fetch_timeout,
            },
        };

        match self.load::<T>(key).await {
            Some(entry) => {
                warn!(key, error = %failure, "Fetch failed, serving stale cache");
                Ok(Fetched {
                    items: entry.data,
                    source: DataSource::Stale,
                    timestamp: entry.timestamp,
                })
            }
            None => {
                error!(key, error = %failure, "Fetch failed with no cached data");
                Err(failure)
            }
        }
    }

    /// Cache-only read for offline mode. Expired data is returned flagged stale.
    pub async fn load_cached<T: DeserializeOwned>(&self, key: &str) -> Option<Fetched<T>> {
        let entry = self.load::<T>(key).await?;
        let source = if entry.is_fresh_at(Utc::now(), self.ttl) {
            DataSource::Cache
        } else {
            DataSource::Stale
        };
        Some(Fetched {
            items: entry.data,
            source,
            timestamp: entry.timestamp,
        })
    }

    /// Drop the entry for `key` so the next fetch goes to the network
    pub async fn invalidate(&self, key: &str) {
        self.store.remove(key).await;
    }

    /// Drop every collection entry. Other keys in the store are untouched.
    pub async fn clear_all(&self) {
        for kind in ItemType::ALL {
            self.invalidate(kind.cache_key()).await;
        }
    }

    async fn stamp(&self, kind: ItemType) -> Option<i64> {
        self.store
            .get::<CacheStamp>(kind.cache_key())
            .await
            .map(|s| s.timestamp)
    }

    // ===== Cache Age Information =====

    pub async fn cache_ages(&self) -> CacheAges {
        let now = Utc::now();
        let display = |stamp: Option<i64>| stamp.map(|t| age_display(t, now));
        CacheAges {
            exams: display(self.stamp(ItemType::Exam).await),
            scholarships: display(self.stamp(ItemType::Scholarship).await),
            guides: display(self.stamp(ItemType::Guide).await),
        }
    }

    /// True if any collection is missing or expired
    pub async fn any_stale(&self) -> bool {
        let now = Utc::now();
        for kind in ItemType::ALL {
            let fresh = match self.stamp(kind).await {
                Some(timestamp) => now.timestamp_millis() - timestamp < self.ttl.num_milliseconds(),
                None => false,
            };
            if !fresh {
                return true;
            }
        }
        false
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheAges {
    pub exams: Option<String>,
    pub scholarships: Option<String>,
    pub guides: Option<String>,
}

impl CacheAges {
    pub fn for_kind(&self, kind: ItemType) -> String {
        let age = match kind {
            ItemType::Exam => &self.exams,
            ItemType::Scholarship => &self.scholarships,
            ItemType::Guide => &self.guides,
        };
        age.clone().unwrap_or_else(|| "never".to_string())
    }

    /// First known age across collections, or "never"
    pub fn last_updated(&self) -> String {
        [&self.exams, &self.scholarships, &self.guides]
            .into_iter()
            .flatten()
            .next()
            .cloned()
            .unwrap_or_else(|| "never".to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================
