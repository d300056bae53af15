//! Canon data: categorized reference lists fetched from a wiki.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One canon article as produced by the wiki ingestion pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonItem {
    /// Wiki page id.
    pub id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Wiki categories the article was categorized from.
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(rename = "abstract", default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl CanonItem {
    /// Image to show for the item, preferring `image_url` over `thumbnail`.
    pub fn display_image(&self) -> Option<&str> {
        self.image_url.as_deref().or(self.thumbnail.as_deref())
    }

    /// JSON stored in `wiki_articles.content`.
    ///
    /// Carries every field except the title, name, image and URL fields;
    /// the abstract is stored as `description`.
    pub fn content_json(&self) -> serde_json::Value {
        let mut content = serde_json::Map::new();
        content.insert("id".into(), self.id.into());
        content.insert("categories".into(), self.categories.clone().into());
        if let Some(text) = &self.abstract_text {
            content.insert("abstract".into(), text.clone().into());
            content.insert("description".into(), text.clone().into());
        }
        serde_json::Value::Object(content)
    }
}

/// Category name to the items in it.
pub type CanonData = BTreeMap<String, Vec<CanonItem>>;

/// Total number of items across all categories.
pub fn total_items(data: &CanonData) -> usize {
    data.values().map(Vec::len).sum()
}

/// Names of categories that hold at least one item.
pub fn non_empty_categories(data: &CanonData) -> Vec<String> {
    data.iter()
        .filter(|(_, items)| !items.is_empty())
        .map(|(name, _)| name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, title: &str) -> CanonItem {
        CanonItem {
            id,
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn content_excludes_title_and_links() {
        let it = CanonItem {
            url: Some("/wiki/Hoth".into()),
            abstract_text: Some("Ice planet".into()),
            thumbnail: Some("https://img/hoth".into()),
            image_url: Some("https://img/hoth".into()),
            categories: vec!["Planets".into()],
            ..item(7, "Hoth")
        };
        let content = it.content_json();
        assert_eq!(content["description"], "Ice planet");
        assert_eq!(content["id"], 7);
        assert!(content.get("title").is_none());
        assert!(content.get("url").is_none());
        assert!(content.get("image_url").is_none());
        assert!(content.get("thumbnail").is_none());
    }

    #[test]
    fn display_image_falls_back_to_thumbnail() {
        let it = CanonItem {
            thumbnail: Some("thumb".into()),
            ..item(1, "A")
        };
        assert_eq!(it.display_image(), Some("thumb"));
    }

    #[test]
    fn abstract_uses_wire_name() {
        let it = CanonItem {
            abstract_text: Some("text".into()),
            ..item(1, "A")
        };
        let json = serde_json::to_value(&it).unwrap();
        assert_eq!(json["abstract"], "text");
    }

    #[test]
    fn counts_items_and_non_empty_categories() {
        let mut data = CanonData::new();
        data.insert("planets".into(), vec![item(1, "Hoth"), item(2, "Endor")]);
        data.insert("droids".into(), vec![]);
        assert_eq!(total_items(&data), 2);
        assert_eq!(non_empty_categories(&data), vec!["planets".to_string()]);
    }
}
