use serde::{Deserialize, Serialize};

use super::{CatalogItem, DateSpan, Item, ItemType};
use crate::utils::contains_ignore_case;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum GuideAudience {
    #[serde(rename = "STUDENT", alias = "student")]
    Student,
    #[serde(rename = "PARENT", alias = "parent")]
    Parent,
    #[serde(rename = "GRADUATE", alias = "graduate")]
    Graduate,
    #[serde(rename = "ALL", alias = "all")]
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct GuideStep {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "imageUrl", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Guide {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub audience: GuideAudience,
    #[serde(default)]
    pub steps: Vec<GuideStep>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub last_updated: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Guide {
    pub fn is_for(&self, audience: GuideAudience) -> bool {
        self.audience == GuideAudience::All || self.audience == audience
    }
}

impl Item for Guide {
    const KIND: ItemType = ItemType::Guide;

    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn matches_query(&self, query: &str) -> bool {
        contains_ignore_case(&self.title, query)
            || contains_ignore_case(&self.description, query)
            || contains_ignore_case(&self.category, query)
            || self.tags.iter().any(|t| contains_ignore_case(t, query))
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn date_span(&self) -> DateSpan {
        DateSpan::Undated
    }

    fn into_catalog_item(self) -> CatalogItem {
        CatalogItem::Guide(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guide(audience: GuideAudience) -> Guide {
        Guide {
            id: "g1".to_string(),
            title: "Registering for university".to_string(),
            description: "Step by step".to_string(),
            category: "school-registration".to_string(),
            audience,
            steps: vec![],
            tags: vec!["Admissions".to_string()],
            last_updated: "2025-01-01".to_string(),
            image_url: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_guide_matches_tags() {
        assert!(guide(GuideAudience::All).matches_query("admission"));
        assert!(guide(GuideAudience::All).matches_query("registration"));
        assert!(!guide(GuideAudience::All).matches_query("scholarship"));
    }

    #[test]
    fn test_guide_audience() {
        assert!(guide(GuideAudience::All).is_for(GuideAudience::Parent));
        assert!(guide(GuideAudience::Student).is_for(GuideAudience::Student));
        assert!(!guide(GuideAudience::Student).is_for(GuideAudience::Parent));
    }

    #[test]
    fn test_guide_tags_default_empty() {
        let json = r#"{"id":"g2","title":"T","category":"Study","audience":"student"}"#;
        let g: Guide = serde_json::from_str(json).unwrap();
        assert!(g.tags.is_empty());
        assert_eq!(g.audience, GuideAudience::Student);
        assert_eq!(g.date_span(), DateSpan::Undated);
    }
}
