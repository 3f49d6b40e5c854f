use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::eq_ignore_case;

/// Longest accepted search query, in characters
pub const MAX_SEARCH_LENGTH: usize = 100;

/// Category chip meaning "no category filter"
pub const ALL_CATEGORIES: &str = "All";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Search query must be less than {max} characters (got {len})")]
    SearchTooLong { len: usize, max: usize },

    #[error("Start date must be before end date")]
    InvalidDateRange,

    #[error("Month must be between 1 and 12 (got {0})")]
    InvalidMonth(u32),
}

/// Inclusive date window. Only applied when both ends are set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::new(Some(start), Some(end))
    }

    /// Both bounds, if the range is active
    pub fn bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.bounds()
            .map(|(start, end)| start <= at && at <= end)
            .unwrap_or(true)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.bounds() {
            Some((start, end)) if start > end => Err(ValidationError::InvalidDateRange),
            _ => Ok(()),
        }
    }
}

/// Inputs to the filter engine. Defaults to "no filtering".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub search_query: String,
    pub selected_categories: BTreeSet<String>,
    /// 1-based month of the item's start; exams only
    pub month: Option<u32>,
    pub date_range: DateRange,
}

impl FilterState {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let len = self.search_query.chars().count();
        if len > MAX_SEARCH_LENGTH {
            return Err(ValidationError::SearchTooLong {
                len,
                max: MAX_SEARCH_LENGTH,
            });
        }
        if let Some(month) = self.month {
            if !(1..=12).contains(&month) {
                return Err(ValidationError::InvalidMonth(month));
            }
        }
        self.date_range.validate()
    }

    /// Lowercased, trimmed query, or `None` when text search is inactive
    pub fn normalized_query(&self) -> Option<String> {
        let trimmed = self.search_query.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_lowercase())
        }
    }

    /// Whether the category axis constrains anything
    pub fn category_filter_active(&self) -> bool {
        !self.selected_categories.is_empty()
            && !self
                .selected_categories
                .iter()
                .any(|c| eq_ignore_case(c, ALL_CATEGORIES))
    }

    pub fn is_empty(&self) -> bool {
        self.normalized_query().is_none()
            && !self.category_filter_active()
            && self.month.is_none()
            && self.date_range.bounds().is_none()
    }
}
