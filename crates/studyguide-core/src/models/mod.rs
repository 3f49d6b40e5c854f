//! Data models for catalog entities.
//!
//! This module contains the records served by the remote catalog and the
//! records the app persists locally:
//!
//! - `Exam`: exam calendar entries with sitting and registration windows
//! - `Scholarship`: funding opportunities with an application deadline
//! - `Guide`: step-by-step educational guides
//! - `Bookmark`: a persisted marker linking to a saved item by type and id
//!
//! Every record implements [`Item`], which is what the cache, filter engine
//! and collection stores are generic over.

pub mod bookmark;
pub mod exam;
pub mod guide;
pub mod scholarship;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub use bookmark::Bookmark;
pub use exam::{Exam, ExamLevel};
pub use guide::{Guide, GuideAudience, GuideStep};
pub use scholarship::Scholarship;

/// The three kinds of catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum ItemType {
    Exam,
    Scholarship,
    Guide,
}

impl ItemType {
    pub const ALL: [ItemType; 3] = [ItemType::Exam, ItemType::Scholarship, ItemType::Guide];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Exam => "exam",
            ItemType::Scholarship => "scholarship",
            ItemType::Guide => "guide",
        }
    }

    /// Storage key holding the cached collection for this kind
    pub fn cache_key(&self) -> &'static str {
        match self {
            ItemType::Exam => "@cache_exams",
            ItemType::Scholarship => "@cache_scholarships",
            ItemType::Guide => "@cache_guides",
        }
    }

    /// Path segment of the remote collection endpoint
    pub fn endpoint(&self) -> &'static str {
        match self {
            ItemType::Exam => "exams",
            ItemType::Scholarship => "scholarships",
            ItemType::Guide => "guides",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Dates an item exposes to the date-range filter, already parsed.
/// A field that is present but unparseable is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSpan {
    /// Items that occupy an interval (exam sittings)
    Range {
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    },
    /// Items with a single relevant date (scholarship deadlines)
    Single(Option<DateTime<Utc>>),
    /// Items with no date axis (guides)
    Undated,
}

/// Behavior shared by every catalog record.
pub trait Item: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: ItemType;

    fn id(&self) -> &str;

    /// Display title
    fn title(&self) -> &str;

    /// Case-insensitive free-text match. `query` should already be lowercased.
    fn matches_query(&self, query: &str) -> bool;

    /// Value compared against the selected categories
    fn category(&self) -> &str;

    fn date_span(&self) -> DateSpan;

    /// Date whose month is compared against a month selection.
    /// `None` means the item has no month axis and always passes.
    fn month_date(&self) -> Option<&str> {
        None
    }

    fn into_catalog_item(self) -> CatalogItem;
}

/// Any catalog record, for places where kinds are mixed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "item", rename_all = "lowercase")]
pub enum CatalogItem {
    Exam(Exam),
    Scholarship(Scholarship),
    Guide(Guide),
}

impl CatalogItem {
    pub fn item_type(&self) -> ItemType {
        match self {
            CatalogItem::Exam(_) => ItemType::Exam,
            CatalogItem::Scholarship(_) => ItemType::Scholarship,
            CatalogItem::Guide(_) => ItemType::Guide,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            CatalogItem::Exam(e) => e.id(),
            CatalogItem::Scholarship(s) => s.id(),
            CatalogItem::Guide(g) => g.id(),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            CatalogItem::Exam(e) => e.title(),
            CatalogItem::Scholarship(s) => s.title(),
            CatalogItem::Guide(g) => g.title(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ItemType::Scholarship).unwrap(), "\"scholarship\"");
        let parsed: ItemType = serde_json::from_str("\"guide\"").unwrap();
        assert_eq!(parsed, ItemType::Guide);
    }

    #[test]
    fn test_item_type_keys_are_disjoint() {
        let keys: std::collections::HashSet<_> =
            ItemType::ALL.iter().map(|t| t.cache_key()).collect();
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn test_item_type_display() {
        assert_eq!(ItemType::Exam.to_string(), "exam");
        assert_eq!(ItemType::Guide.endpoint(), "guides");
    }
}
