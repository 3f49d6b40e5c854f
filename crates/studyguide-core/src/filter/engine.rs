use chrono::Datelike;

use super::{FilterState, ValidationError};
use crate::models::{DateSpan, Exam, Guide, Item, Scholarship};
use crate::utils::{eq_ignore_case, parse_timestamp};

/// Whether `item` passes every active predicate of `state`.
/// `query` is the normalized query (see `FilterState::normalized_query`).
fn passes<T: Item>(item: &T, state: &FilterState, query: Option<&str>) -> bool {
    if let Some(query) = query {
        if !item.matches_query(query) {
            return false;
        }
    }

    if state.category_filter_active()
        && !state
            .selected_categories
            .iter()
            .any(|c| eq_ignore_case(c, item.category()))
    {
        return false;
    }

    if let (Some(month), Some(raw)) = (state.month, item.month_date()) {
        if parse_timestamp(raw).map(|d| d.month()) != Some(month) {
            return false;
        }
    }

    if let Some((range_start, range_end)) = state.date_range.bounds() {
        let within = |d: chrono::DateTime<chrono::Utc>| range_start <= d && d <= range_end;
        let in_range = match item.date_span() {
            DateSpan::Range { start, end } => {
                start.is_some_and(within)
                    || end.is_some_and(within)
                    || matches!((start, end), (Some(s), Some(e)) if s <= range_start && e >= range_end)
            }
            DateSpan::Single(date) => date.is_some_and(within),
            DateSpan::Undated => true,
        };
        if !in_range {
            return false;
        }
    }

    true
}

/// Single-item form of [`filter_items`]
pub fn matches<T: Item>(item: &T, state: &FilterState) -> bool {
    passes(item, state, state.normalized_query().as_deref())
}

/// Items passing all active predicates, in their original order.
pub fn filter_items<T: Item>(items: &[T], state: &FilterState) -> Vec<T> {
    let query = state.normalized_query();
    items
        .iter()
        .filter(|item| passes(*item, state, query.as_deref()))
        .cloned()
        .collect()
}

/// Matches for one query across all three collections.
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub exams: Vec<Exam>,
    pub scholarships: Vec<Scholarship>,
    pub guides: Vec<Guide>,
}

impl SearchResults {
    pub fn total(&self) -> usize {
        self.exams.len() + self.scholarships.len() + self.guides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Global text search. A blank query yields no results rather than everything.
pub fn search_all(
    query: &str,
    exams: &[Exam],
    scholarships: &[Scholarship],
    guides: &[Guide],
) -> Result<SearchResults, ValidationError> {
    let state = FilterState {
        search_query: query.to_string(),
        ..FilterState::default()
    };
    state.validate()?;
    if state.normalized_query().is_none() {
        return Ok(SearchResults::default());
    }
    Ok(SearchResults {
        exams: filter_items(exams, &state),
        scholarships: filter_items(scholarships, &state),
        guides: filter_items(guides, &state),
    })
}
