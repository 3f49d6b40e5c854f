use std::collections::HashSet;
use std::sync::{Mutex, PoisonError, RwLock};

use tracing::{debug, info, warn};

use super::BookmarkError;
use crate::models::{Bookmark, ItemType};
use crate::storage::{keys, KeyValueStore};

type BookmarkKey = (ItemType, String);

/// Outcome of a successful toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toggled {
    Added(Bookmark),
    Removed(Bookmark),
}

impl Toggled {
    pub fn bookmark(&self) -> &Bookmark {
        match self {
            Toggled::Added(b) | Toggled::Removed(b) => b,
        }
    }

    pub fn is_added(&self) -> bool {
        matches!(self, Toggled::Added(_))
    }
}

/// Marks a key busy for the lifetime of the guard.
struct InFlight<'a> {
    set: &'a Mutex<HashSet<BookmarkKey>>,
    key: BookmarkKey,
}

impl<'a> InFlight<'a> {
    /// `None` if the key is already busy
    fn acquire(set: &'a Mutex<HashSet<BookmarkKey>>, key: BookmarkKey) -> Option<Self> {
        let inserted = set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone());
        inserted.then_some(Self { set, key })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

pub struct BookmarkRegistry {
    store: KeyValueStore,
    /// Mirror of the persisted list, in insertion order
    bookmarks: RwLock<Vec<Bookmark>>,
    /// Keys with a toggle currently running
    in_flight: Mutex<HashSet<BookmarkKey>>,
    /// Serializes read-modify-write cycles on the shared list
    write_lock: tokio::sync::Mutex<()>,
}

impl BookmarkRegistry {
    pub fn new(store: KeyValueStore) -> Self {
        Self {
            store,
            bookmarks: RwLock::new(Vec::new()),
            in_flight: Mutex::new(HashSet::new()),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    fn replace_memory(&self, list: Vec<Bookmark>) {
        *self.bookmarks.write().unwrap_or_else(PoisonError::into_inner) = list;
    }

    fn with_memory<R>(&self, f: impl FnOnce(&[Bookmark]) -> R) -> R {
        f(&self.bookmarks.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Load the persisted list into memory. Unreadable storage yields an
    /// empty set. Returns the number of bookmarks loaded.
    pub async fn load(&self) -> usize {
        let list: Vec<Bookmark> = self.store.get(keys::BOOKMARKS).await.unwrap_or_default();
        let count = list.len();
        self.replace_memory(list);
        debug!(count, "Bookmarks loaded");
        count
    }

    /// Add the bookmark for (item_id, item_type) if absent, remove it if
    /// present.
    ///
    /// The decision is made against storage, not memory. While a toggle for
    /// a key is running, further toggles for that key are rejected with
    /// `ToggleInProgress`. Memory only changes after storage accepted the
    /// new list.
    pub async fn toggle(&self, item_id: &str, item_type: ItemType) -> Result<Toggled, BookmarkError> {
        let Some(_busy) = InFlight::acquire(&self.in_flight, (item_type, item_id.to_string())) else {
            debug!(item_id, %item_type, "Toggle ignored, already in flight");
            return Err(BookmarkError::ToggleInProgress {
                item_type,
                item_id: item_id.to_string(),
            });
        };

        let _write = self.write_lock.lock().await;

        let mut list: Vec<Bookmark> = self
            .store
            .try_get(keys::BOOKMARKS)
            .await?
            .unwrap_or_default();

        let outcome = match list.iter().position(|b| b.matches(item_id, item_type)) {
            Some(index) => Toggled::Removed(list.remove(index)),
            None => {
                let bookmark = Bookmark::new(item_id, item_type);
                list.push(bookmark.clone());
                Toggled::Added(bookmark)
            }
        };

        if let Err(e) = self.store.try_set(keys::BOOKMARKS, &list).await {
            warn!(item_id, %item_type, error = %e, "Bookmark change not persisted");
            return Err(e.into());
        }

        self.replace_memory(list);
        info!(item_id, %item_type, added = outcome.is_added(), "Bookmark toggled");
        Ok(outcome)
    }

    /// Membership against the in-memory set
    pub fn is_bookmarked(&self, item_id: &str, item_type: ItemType) -> bool {
        self.with_memory(|list| list.iter().any(|b| b.matches(item_id, item_type)))
    }

    /// Whether a toggle for this item is currently running
    pub fn is_toggling(&self, item_id: &str, item_type: ItemType) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(item_type, item_id.to_string()))
    }

    pub fn bookmarks(&self) -> Vec<Bookmark> {
        self.with_memory(|list| list.to_vec())
    }

    pub fn bookmarks_of(&self, item_type: ItemType) -> Vec<Bookmark> {
        self.with_memory(|list| {
            list.iter()
                .filter(|b| b.item_type == item_type)
                .cloned()
                .collect()
        })
    }

    pub fn len(&self) -> usize {
        self.with_memory(|list| list.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every bookmark
    pub async fn clear(&self) -> Result<(), BookmarkError> {
        let _write = self.write_lock.lock().await;
        self.store.try_set(keys::BOOKMARKS, &Vec::<Bookmark>::new()).await?;
        self.replace_memory(Vec::new());
        info!("Bookmarks cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::storage::StorageBackend;
    use crate::test_support::ControlledBackend;

    fn registry() -> (BookmarkRegistry, Arc<ControlledBackend>) {
        let backend = Arc::new(ControlledBackend::new());
        let registry = BookmarkRegistry::new(KeyValueStore::new(backend.clone()));
        (registry, backend)
    }

    #[tokio::test]
    async fn test_toggle_adds_then_removes() {
        let (registry, _) = registry();

        let added = registry.toggle("s1", ItemType::Scholarship).await.unwrap();
        assert!(added.is_added());
        assert_eq!(added.bookmark().item_id, "s1");
        assert_eq!(added.bookmark().item_type, ItemType::Scholarship);
        assert_eq!(registry.len(), 1);
        assert!(registry.is_bookmarked("s1", ItemType::Scholarship));

        let removed = registry.toggle("s1", ItemType::Scholarship).await.unwrap();
        assert_eq!(removed, Toggled::Removed(added.bookmark().clone()));
        assert!(!registry.is_bookmarked("s1", ItemType::Scholarship));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_same_id_different_type_is_distinct() {
        let (registry, _) = registry();
        registry.toggle("1", ItemType::Exam).await.unwrap();
        registry.toggle("1", ItemType::Guide).await.unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.bookmarks_of(ItemType::Guide).len(), 1);
        assert!(!registry.is_bookmarked("1", ItemType::Scholarship));
    }

    #[tokio::test]
    async fn test_toggle_pair_restores_stored_bytes() {
        let (registry, _) = registry();
        registry.toggle("e1", ItemType::Exam).await.unwrap();
        registry.toggle("g1", ItemType::Guide).await.unwrap();
        let before = registry.store.get_raw(keys::BOOKMARKS).await.unwrap();

        registry.toggle("s9", ItemType::Scholarship).await.unwrap();
        registry.toggle("s9", ItemType::Scholarship).await.unwrap();

        let after = registry.store.get_raw(keys::BOOKMARKS).await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_concurrent_toggles_on_same_key_change_state_once() {
        let (registry, backend) = registry();
        backend.delay_writes(Duration::from_millis(50));

        let (first, second) = tokio::join!(
            registry.toggle("s1", ItemType::Scholarship),
            registry.toggle("s1", ItemType::Scholarship),
        );

        assert!(first.unwrap().is_added());
        assert!(matches!(second, Err(BookmarkError::ToggleInProgress { .. })));
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_toggling("s1", ItemType::Scholarship));
    }

    #[tokio::test]
    async fn test_concurrent_toggles_on_different_keys_both_persist() {
        let (registry, backend) = registry();
        backend.delay_writes(Duration::from_millis(20));

        let (a, b) = tokio::join!(
            registry.toggle("e1", ItemType::Exam),
            registry.toggle("e2", ItemType::Exam),
        );
        assert!(a.unwrap().is_added());
        assert!(b.unwrap().is_added());

        let stored: Vec<Bookmark> = registry.store.get(keys::BOOKMARKS).await.unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_memory_unchanged() {
        let (registry, backend) = registry();
        registry.toggle("g1", ItemType::Guide).await.unwrap();

        backend.fail_writes(true);
        let result = registry.toggle("g1", ItemType::Guide).await;
        assert!(matches!(result, Err(BookmarkError::Storage(_))));
        assert!(registry.is_bookmarked("g1", ItemType::Guide));

        let result = registry.toggle("g2", ItemType::Guide).await;
        assert!(result.is_err());
        assert!(!registry.is_bookmarked("g2", ItemType::Guide));
        assert!(!registry.is_toggling("g2", ItemType::Guide));

        // Registry keeps working once storage recovers
        backend.fail_writes(false);
        assert!(registry.toggle("g2", ItemType::Guide).await.unwrap().is_added());
    }

    #[tokio::test]
    async fn test_toggle_decides_from_storage() {
        let (registry, _) = registry();
        // Another writer added the bookmark behind the registry's back
        let external = Bookmark::new("e7", ItemType::Exam);
        registry.store.set(keys::BOOKMARKS, &vec![external.clone()]).await;
        assert!(!registry.is_bookmarked("e7", ItemType::Exam));

        let outcome = registry.toggle("e7", ItemType::Exam).await.unwrap();
        assert_eq!(outcome, Toggled::Removed(external));
        assert!(!registry.is_bookmarked("e7", ItemType::Exam));
    }

    #[tokio::test]
    async fn test_load_reads_persisted_list() {
        let (registry, _) = registry();
        let list = vec![
            Bookmark::new("a", ItemType::Exam),
            Bookmark::new("b", ItemType::Guide),
        ];
        registry.store.set(keys::BOOKMARKS, &list).await;

        assert_eq!(registry.load().await, 2);
        assert_eq!(registry.bookmarks(), list);
    }

    #[tokio::test]
    async fn test_load_with_corrupt_storage_is_empty() {
        let backend = Arc::new(ControlledBackend::new());
        backend
            .write(keys::BOOKMARKS, "[{broken".to_string())
            .await
            .unwrap();
        let registry = BookmarkRegistry::new(KeyValueStore::new(backend));
        assert_eq!(registry.load().await, 0);
    }

    #[tokio::test]
    async fn test_clear() {
        let (registry, _) = registry();
        registry.toggle("a", ItemType::Exam).await.unwrap();
        registry.clear().await.unwrap();
        assert!(registry.is_empty());
        assert_eq!(registry.store.get_raw(keys::BOOKMARKS).await.as_deref(), Some("[]"));
    }
}
