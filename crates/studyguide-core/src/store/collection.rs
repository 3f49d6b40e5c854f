use std::collections::BTreeSet;

use chrono::{DateTime, TimeZone, Utc};
use tracing::{debug, info, warn};

use crate::api::{CatalogSource, RemoteCollection};
use crate::cache::{CacheManager, DataSource, FetchError, Fetched};
use crate::filter::{filter_items, DateRange, FilterState, ValidationError, ALL_CATEGORIES};
use crate::utils::eq_ignore_case;

/// What the UI should render for a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionView {
    Loading,
    /// Nothing to show; render an empty state with a retry action
    Failed { message: String },
    /// Items are available. `stale` asks for a "may be outdated" banner.
    Ready { stale: bool },
}

/// State for one catalog collection.
///
/// `filtered` is recomputed from `items` and `filter` after every change to
/// either, so it always reflects the current inputs. Invalid filter inputs
/// are rejected and leave the previous state in place.
#[derive(Debug, Clone)]
pub struct CollectionStore<T> {
    items: Vec<T>,
    filtered: Vec<T>,
    filter: FilterState,
    loading: bool,
    error: Option<String>,
    stale: bool,
    last_updated: Option<i64>,
}

impl<T> Default for CollectionStore<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            filtered: Vec::new(),
            filter: FilterState::default(),
            loading: false,
            error: None,
            stale: false,
            last_updated: None,
        }
    }
}

impl<T: RemoteCollection> CollectionStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Accessors =====

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn filtered(&self) -> &[T] {
        &self.filtered
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// When the current items were obtained from the remote
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }

    pub fn find(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn view(&self) -> CollectionView {
        if self.loading {
            CollectionView::Loading
        } else if let (Some(message), true) = (&self.error, self.items.is_empty()) {
            CollectionView::Failed {
                message: message.clone(),
            }
        } else {
            CollectionView::Ready { stale: self.stale }
        }
    }

    // ===== Loading =====

    /// Mark a load as started. Pair with [`Self::finish_loading`] when the
    /// fetch runs outside this store.
    pub fn start_loading(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Apply the outcome of a fetch. On failure, previously loaded items
    /// are kept and flagged stale.
    pub fn finish_loading(&mut self, result: Result<Fetched<T>, FetchError>) -> Result<DataSource, FetchError> {
        self.loading = false;
        match result {
            Ok(fetched) => {
                let source = fetched.source;
                self.stale = fetched.is_stale();
                self.last_updated = Some(fetched.timestamp);
                self.error = None;
                self.items = fetched.items;
                self.recompute();
                debug!(kind = %T::KIND, items = self.items.len(), ?source, "Collection loaded");
                Ok(source)
            }
            Err(e) => {
                warn!(kind = %T::KIND, error = %e, "Collection load failed");
                self.error = Some(e.user_message());
                self.stale = !self.items.is_empty();
                Err(e)
            }
        }
    }

    /// Load through the cache, falling back to stale data when the remote
    /// fails.
    pub async fn refresh(&mut self, cache: &CacheManager, source: &dyn CatalogSource) -> Result<DataSource, FetchError> {
        self.start_loading();
        let result = cache
            .fetch_with_cache(T::KIND.cache_key(), || T::fetch_from(source))
            .await;
        let outcome = self.finish_loading(result);
        if outcome.is_ok() {
            info!(kind = %T::KIND, items = self.items.len(), stale = self.stale, "Collection refreshed");
        }
        outcome
    }

    /// Load from cache only, whatever its age.
    pub async fn load_offline(&mut self, cache: &CacheManager) -> Result<DataSource, FetchError> {
        self.start_loading();
        let result = cache
            .load_cached::<T>(T::KIND.cache_key())
            .await
            .ok_or_else(|| FetchError::NotCached(T::KIND.cache_key().to_string()));
        self.finish_loading(result)
    }

    // ===== Filter inputs =====

    fn apply_filter(&mut self, next: FilterState) -> Result<(), ValidationError> {
        next.validate()?;
        self.filter = next;
        self.recompute();
        Ok(())
    }

    fn recompute(&mut self) {
        self.filtered = filter_items(&self.items, &self.filter);
    }

    pub fn set_search_query(&mut self, query: &str) -> Result<(), ValidationError> {
        self.apply_filter(FilterState {
            search_query: query.to_string(),
            ..self.filter.clone()
        })
    }

    pub fn set_categories<I, S>(&mut self, categories: I) -> Result<(), ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.apply_filter(FilterState {
            selected_categories: categories.into_iter().map(Into::into).collect(),
            ..self.filter.clone()
        })
    }

    /// Flip one category chip. Choosing "All" clears the selection.
    pub fn toggle_category(&mut self, category: &str) -> Result<(), ValidationError> {
        let mut selected: BTreeSet<String> = self.filter.selected_categories.clone();
        if eq_ignore_case(category, ALL_CATEGORIES) {
            selected.clear();
        } else {
            let before = selected.len();
            selected.retain(|c| !eq_ignore_case(c, category));
            if selected.len() == before {
                selected.insert(category.to_string());
            }
        }
        self.set_categories(selected)
    }

    pub fn set_month(&mut self, month: Option<u32>) -> Result<(), ValidationError> {
        self.apply_filter(FilterState {
            month,
            ..self.filter.clone()
        })
    }

    pub fn set_date_range(&mut self, range: DateRange) -> Result<(), ValidationError> {
        self.apply_filter(FilterState {
            date_range: range,
            ..self.filter.clone()
        })
    }

    pub fn reset_filters(&mut self) {
        self.filter = FilterState::default();
        self.recompute();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::models::{Exam, Item, Scholarship};
    use crate::storage::KeyValueStore;
    use crate::test_support::{exam, scholarship, FakeSource};
    use crate::utils::parse_timestamp;

    fn cache() -> CacheManager {
        CacheManager::new(KeyValueStore::in_memory(), chrono::Duration::hours(24), Duration::from_secs(5))
    }

    fn ids<T: Item>(items: &[T]) -> Vec<&str> {
        items.iter().map(|i| i.id()).collect()
    }

    fn exams() -> Vec<Exam> {
        vec![
            exam("jan", "2025-01-10T00:00:00Z", "2025-01-12T00:00:00Z"),
            exam("mar1", "2025-03-02T00:00:00Z", "2025-03-04T00:00:00Z"),
            exam("mar2", "2025-03-20T00:00:00Z", "2025-03-22T00:00:00Z"),
        ]
    }

    #[tokio::test]
    async fn test_refresh_populates_items_and_view() {
        let source = FakeSource::new(exams(), vec![], vec![]);
        let mut store = CollectionStore::<Exam>::new();
        assert_eq!(store.view(), CollectionView::Ready { stale: false });

        let origin = store.refresh(&cache(), &source).await.unwrap();
        assert_eq!(origin, DataSource::Network);
        assert_eq!(store.items().len(), 3);
        assert_eq!(ids(store.filtered()), vec!["jan", "mar1", "mar2"]);
        assert!(store.last_updated().is_some());
        assert_eq!(store.view(), CollectionView::Ready { stale: false });
    }

    #[tokio::test]
    async fn test_month_filter_keeps_order() {
        let source = FakeSource::new(exams(), vec![], vec![]);
        let mut store = CollectionStore::<Exam>::new();
        store.refresh(&cache(), &source).await.unwrap();

        store.set_month(Some(3)).unwrap();
        assert_eq!(ids(store.filtered()), vec!["mar1", "mar2"]);

        store.reset_filters();
        assert_eq!(store.filtered().len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_input_keeps_previous_view() {
        let source = FakeSource::new(exams(), vec![], vec![]);
        let mut store = CollectionStore::<Exam>::new();
        store.refresh(&cache(), &source).await.unwrap();
        store.set_month(Some(1)).unwrap();

        let long = "x".repeat(101);
        assert!(matches!(
            store.set_search_query(&long),
            Err(ValidationError::SearchTooLong { len: 101, .. })
        ));
        assert_eq!(store.filter().search_query, "");

        let backwards = DateRange::between(
            parse_timestamp("2025-06-01").unwrap(),
            parse_timestamp("2025-01-01").unwrap(),
        );
        assert_eq!(store.set_date_range(backwards), Err(ValidationError::InvalidDateRange));
        assert_eq!(store.set_month(Some(13)), Err(ValidationError::InvalidMonth(13)));
        assert_eq!(ids(store.filtered()), vec!["jan"]);
    }

    #[tokio::test]
    async fn test_toggle_category_and_all() {
        let source = FakeSource::new(
            vec![],
            vec![
                scholarship("s1", "Merit", "2025-02-01T00:00:00Z"),
                scholarship("s2", "Need-based", "2025-02-01T00:00:00Z"),
            ],
            vec![],
        );
        let mut store = CollectionStore::<Scholarship>::new();
        store.refresh(&cache(), &source).await.unwrap();

        store.toggle_category("merit").unwrap();
        assert_eq!(ids(store.filtered()), vec!["s1"]);

        store.toggle_category("merit").unwrap();
        assert_eq!(store.filtered().len(), 2);

        store.toggle_category("Need-based").unwrap();
        store.toggle_category(ALL_CATEGORIES).unwrap();
        assert!(store.filter().selected_categories.is_empty());
        assert_eq!(store.filtered().len(), 2);
    }

    #[tokio::test]
    async fn test_toggle_category_ignores_case() {
        let source = FakeSource::new(
            vec![],
            vec![
                scholarship("s1", "Merit", "2025-02-01T00:00:00Z"),
                scholarship("s2", "Need-based", "2025-02-01T00:00:00Z"),
            ],
            vec![],
        );
        let mut store = CollectionStore::<Scholarship>::new();
        store.refresh(&cache(), &source).await.unwrap();

        store.toggle_category("Merit").unwrap();
        assert_eq!(ids(store.filtered()), vec!["s1"]);

        store.toggle_category("MERIT").unwrap();
        assert!(store.filter().selected_categories.is_empty());
        assert_eq!(store.filtered().len(), 2);

        store.toggle_category("all").unwrap();
        assert!(store.filter().selected_categories.is_empty());
    }

    #[tokio::test]
    async fn test_failure_without_cache_shows_failed_view() {
        let source = FakeSource::new(exams(), vec![], vec![]);
        source.set_failing(true);
        let mut store = CollectionStore::<Exam>::new();

        let result = store.refresh(&cache(), &source).await;
        assert!(matches!(result, Err(FetchError::Api { .. })));
        assert!(!store.is_loading());
        assert!(matches!(store.view(), CollectionView::Failed { .. }));
    }

    #[tokio::test]
    async fn test_failure_with_expired_cache_is_stale() {
        let expired = CacheManager::new(KeyValueStore::in_memory(), chrono::Duration::zero(), Duration::from_secs(5));
        let source = FakeSource::new(exams(), vec![], vec![]);
        let mut store = CollectionStore::<Exam>::new();
        store.refresh(&expired, &source).await.unwrap();

        source.set_failing(true);
        let origin = store.refresh(&expired, &source).await.unwrap();
        assert_eq!(origin, DataSource::Stale);
        assert_eq!(store.items().len(), 3);
        assert_eq!(store.view(), CollectionView::Ready { stale: true });
    }

    #[tokio::test]
    async fn test_load_offline() {
        let cache = cache();
        let mut store = CollectionStore::<Exam>::new();
        assert!(matches!(
            store.load_offline(&cache).await,
            Err(FetchError::NotCached(_))
        ));
        assert!(matches!(store.view(), CollectionView::Failed { .. }));

        let source = FakeSource::new(exams(), vec![], vec![]);
        CollectionStore::<Exam>::new().refresh(&cache, &source).await.unwrap();

        assert_eq!(store.load_offline(&cache).await.unwrap(), DataSource::Cache);
        assert_eq!(store.filtered().len(), 3);
        assert_eq!(source.calls(), 1);
    }

    #[test]
    fn test_start_loading_reports_loading() {
        let mut store = CollectionStore::<Exam>::new();
        store.start_loading();
        assert_eq!(store.view(), CollectionView::Loading);
    }
}
