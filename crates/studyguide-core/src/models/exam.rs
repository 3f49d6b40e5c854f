use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use super::{CatalogItem, DateSpan, Item, ItemType};
use crate::utils::{contains_ignore_case, parse_timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum ExamLevel {
    #[serde(rename = "PRIMARY", alias = "primary")]
    Primary,
    #[serde(rename = "SECONDARY", alias = "secondary")]
    Secondary,
    #[serde(rename = "TERTIARY", alias = "tertiary")]
    Tertiary,
}

impl ExamLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExamLevel::Primary => "PRIMARY",
            ExamLevel::Secondary => "SECONDARY",
            ExamLevel::Tertiary => "TERTIARY",
        }
    }
}

impl fmt::Display for ExamLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExamLevel::Primary => write!(f, "Primary"),
            ExamLevel::Secondary => write!(f, "Secondary"),
            ExamLevel::Tertiary => write!(f, "Tertiary"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Exam {
    pub id: String,
    /// Short name, e.g. "GCE O/L"
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub description: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub registration_start_date: Option<String>,
    #[serde(default)]
    pub registration_end_date: Option<String>,
    #[serde(default)]
    pub fees: String,
    #[serde(default)]
    pub eligibility: Vec<String>,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub venues: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_date: Option<String>,
    #[serde(default)]
    pub organizing_body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub level: ExamLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Exam {
    pub fn starts_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.start_date)
    }

    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.end_date)
    }

    /// Month of the first sitting, 1-based
    pub fn start_month(&self) -> Option<u32> {
        self.starts_at().map(|dt| dt.month())
    }

    /// Whether registration is open at `now`.
    /// Exams without a complete registration window are never open.
    pub fn registration_open_at(&self, now: DateTime<Utc>) -> bool {
        let window = (
            self.registration_start_date.as_deref().and_then(parse_timestamp),
            self.registration_end_date.as_deref().and_then(parse_timestamp),
        );
        match window {
            (Some(start), Some(end)) => start <= now && now <= end,
            _ => false,
        }
    }
}

impl Item for Exam {
    const KIND: ItemType = ItemType::Exam;

    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn matches_query(&self, query: &str) -> bool {
        contains_ignore_case(&self.name, query)
            || contains_ignore_case(&self.full_name, query)
            || contains_ignore_case(&self.description, query)
            || contains_ignore_case(&self.organizing_body, query)
            || self.subjects.iter().any(|s| contains_ignore_case(s, query))
    }

    fn category(&self) -> &str {
        self.level.as_str()
    }

    fn date_span(&self) -> DateSpan {
        DateSpan::Range {
            start: self.starts_at(),
            end: self.ends_at(),
        }
    }

    fn month_date(&self) -> Option<&str> {
        Some(&self.start_date)
    }

    fn into_catalog_item(self) -> CatalogItem {
        CatalogItem::Exam(self)
    }
}
