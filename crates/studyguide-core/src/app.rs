//! Application state shared by the UI shell.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::api::{ApiClient, CatalogSource};
use crate::bookmarks::{BookmarkError, BookmarkRegistry, Toggled};
use crate::cache::{CacheAges, CacheManager, DataSource, FetchError};
use crate::config::Config;
use crate::filter::{search_all, SearchResults, ValidationError};
use crate::models::{Bookmark, CatalogItem, Exam, Guide, Item, ItemType, Scholarship};
use crate::preferences::{Preferences, PreferencesStore};
use crate::storage::{FileBackend, KeyValueStore, StorageError};
use crate::store::CollectionStore;

/// Per-collection outcome of [`AppState::refresh_all`].
#[derive(Debug)]
pub struct RefreshReport {
    pub exams: Result<DataSource, FetchError>,
    pub scholarships: Result<DataSource, FetchError>,
    pub guides: Result<DataSource, FetchError>,
}

impl RefreshReport {
    pub fn all_ok(&self) -> bool {
        self.exams.is_ok() && self.scholarships.is_ok() && self.guides.is_ok()
    }

    /// True if any collection is showing data older than the cache TTL
    pub fn any_stale(&self) -> bool {
        [&self.exams, &self.scholarships, &self.guides]
            .iter()
            .any(|r| matches!(r, Ok(DataSource::Stale)))
    }
}

/// Everything the UI needs, owned in one place and passed by reference.
pub struct AppState {
    config: Config,
    cache: CacheManager,
    source: Arc<dyn CatalogSource>,
    pub exams: CollectionStore<Exam>,
    pub scholarships: CollectionStore<Scholarship>,
    pub guides: CollectionStore<Guide>,
    bookmarks: Arc<BookmarkRegistry>,
    preferences: PreferencesStore,
}

impl AppState {
    /// File-backed storage under the configured data directory and the HTTP
    /// catalog client.
    pub fn new(config: Config) -> Result<Self> {
        let dir = config.storage_dir()?;
        let backend = FileBackend::new(dir.clone())
            .with_context(|| format!("Failed to open storage at {}", dir.display()))?;
        let client = ApiClient::new(&config)?;
        debug!(storage = %dir.display(), api = %config.api_base_url, "App state created");
        Ok(Self::with_parts(
            config,
            KeyValueStore::new(Arc::new(backend)),
            Arc::new(client),
        ))
    }

    pub fn with_parts(config: Config, store: KeyValueStore, source: Arc<dyn CatalogSource>) -> Self {
        Self {
            cache: CacheManager::from_config(store.clone(), &config),
            bookmarks: Arc::new(BookmarkRegistry::new(store.clone())),
            preferences: PreferencesStore::new(store),
            config,
            source,
            exams: CollectionStore::new(),
            scholarships: CollectionStore::new(),
            guides: CollectionStore::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn preferences(&self) -> &Preferences {
        self.preferences.current()
    }

    /// Shared handle for toggling bookmarks from spawned tasks
    pub fn bookmark_registry(&self) -> Arc<BookmarkRegistry> {
        Arc::clone(&self.bookmarks)
    }

    /// Restore persisted preferences and bookmarks.
    pub async fn init(&mut self) {
        let offline = self.preferences.load().await.offline_mode;
        let bookmarks = self.bookmarks.load().await;
        info!(offline, bookmarks, "App state initialized");
    }

    /// Refresh all three collections concurrently. In offline mode only the
    /// cache is consulted.
    pub async fn refresh_all(&mut self) -> RefreshReport {
        let cache = &self.cache;
        let source = self.source.as_ref();

        let (exams, scholarships, guides) = if self.preferences.current().offline_mode {
            info!("Offline mode: loading collections from cache");
            tokio::join!(
                self.exams.load_offline(cache),
                self.scholarships.load_offline(cache),
                self.guides.load_offline(cache),
            )
        } else {
            info!("Refreshing all collections");
            tokio::join!(
                self.exams.refresh(cache, source),
                self.scholarships.refresh(cache, source),
                self.guides.refresh(cache, source),
            )
        };

        let report = RefreshReport {
            exams,
            scholarships,
            guides,
        };
        if !report.all_ok() {
            warn!("Some collections could not be loaded");
        }
        report
    }

    pub async fn set_offline_mode(&mut self, offline: bool) -> Result<(), StorageError> {
        self.preferences.update(|p| p.offline_mode = offline).await?;
        Ok(())
    }

    pub async fn update_preferences<F>(&mut self, f: F) -> Result<&Preferences, StorageError>
    where
        F: FnOnce(&mut Preferences),
    {
        self.preferences.update(f).await
    }

    // ===== Bookmarks =====

    pub async fn toggle_bookmark(&self, item_id: &str, item_type: ItemType) -> Result<Toggled, BookmarkError> {
        self.bookmarks.toggle(item_id, item_type).await
    }

    pub fn is_bookmarked(&self, item_id: &str, item_type: ItemType) -> bool {
        self.bookmarks.is_bookmarked(item_id, item_type)
    }

    fn resolve(&self, bookmark: &Bookmark) -> Option<CatalogItem> {
        let id = bookmark.item_id.as_str();
        match bookmark.item_type {
            ItemType::Exam => self.exams.find(id).cloned().map(Item::into_catalog_item),
            ItemType::Scholarship => self.scholarships.find(id).cloned().map(Item::into_catalog_item),
            ItemType::Guide => self.guides.find(id).cloned().map(Item::into_catalog_item),
        }
    }

    /// Bookmarked records that are present in the loaded collections, in
    /// bookmark order.
    pub fn bookmarked_items(&self) -> Vec<CatalogItem> {
        self.bookmarks
            .bookmarks()
            .iter()
            .filter_map(|b| self.resolve(b))
            .collect()
    }

    // ===== Search & cache =====

    pub fn search(&self, query: &str) -> Result<SearchResults, ValidationError> {
        search_all(query, self.exams.items(), self.scholarships.items(), self.guides.items())
    }

    pub async fn cache_ages(&self) -> CacheAges {
        self.cache.cache_ages().await
    }

    pub async fn is_cache_stale(&self) -> bool {
        self.cache.any_stale().await
    }

    /// Drop cached collections; bookmarks and preferences are kept
    pub async fn clear_cache(&self) {
        self.cache.clear_all().await;
    }
}
