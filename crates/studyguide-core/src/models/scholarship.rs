use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CatalogItem, DateSpan, Item, ItemType};
use crate::utils::{contains_ignore_case, parse_timestamp};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Scholarship {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Organization providing the scholarship
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub amount: String,
    pub deadline: String,
    #[serde(default)]
    pub eligibility: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(rename = "applicationUrl", default)]
    pub application_url: String,
    /// e.g. "Undergraduate", "Postgraduate", "Research"
    #[serde(rename = "type")]
    pub scholarship_type: String,
    #[serde(default)]
    pub country: String,
    #[serde(rename = "imageUrl", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(rename = "lastUpdated", default)]
    pub last_updated: String,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Scholarship {
    pub fn deadline_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.deadline)
    }

    /// Days left until the deadline, negative once it has passed
    pub fn days_until_deadline(&self, now: DateTime<Utc>) -> Option<i64> {
        self.deadline_at().map(|d| (d - now).num_days())
    }
}

impl Item for Scholarship {
    const KIND: ItemType = ItemType::Scholarship;

    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn matches_query(&self, query: &str) -> bool {
        contains_ignore_case(&self.title, query)
            || contains_ignore_case(&self.description, query)
            || contains_ignore_case(&self.provider, query)
            || contains_ignore_case(&self.scholarship_type, query)
            || contains_ignore_case(&self.country, query)
    }

    fn category(&self) -> &str {
        &self.scholarship_type
    }

    fn date_span(&self) -> DateSpan {
        DateSpan::Single(self.deadline_at())
    }

    fn into_catalog_item(self) -> CatalogItem {
        CatalogItem::Scholarship(self)
    }
}
