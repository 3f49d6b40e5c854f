use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ItemType;

/// A saved item. Persisted as
/// `{ "id", "type", "itemId", "createdAt" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Bookmark {
    /// Bookmark record id, distinct from the item id
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    #[serde(rename = "itemId")]
    pub item_id: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl Bookmark {
    /// Create a bookmark with a fresh id, stamped now
    pub fn new(item_id: &str, item_type: ItemType) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            item_type,
            item_id: item_id.to_string(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn matches(&self, item_id: &str, item_type: ItemType) -> bool {
        self.item_type == item_type && self.item_id == item_id
    }
}
