//! Request and response types for the Logfolio API.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::request::MultipartForm;

// ─────────────────────────────────────────────────────────────────────────────
// Categories
// ─────────────────────────────────────────────────────────────────────────────

/// A user category (e.g. "Anime", "Books").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    /// False for the built-in defaults.
    #[serde(default)]
    pub user_defined: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Body for creating a category.
#[derive(Debug, Clone, Serialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Items
// ─────────────────────────────────────────────────────────────────────────────

/// An image attached to an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemImage {
    pub id: i64,
    pub image_url: String,
    #[serde(default)]
    pub upload_time: Option<String>,
}

/// A log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub finish_time: Option<String>,
    #[serde(default)]
    pub due_time: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub images: Vec<ItemImage>,
}

impl Item {
    /// URL of the first image, used as the cover.
    pub fn cover(&self) -> Option<&str> {
        self.images.first().map(|img| img.image_url.as_str())
    }
}

/// `GET /items/` answers a page envelope when `limit` is given and a bare
/// list otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemList {
    Page { items: Vec<Item>, total: u64 },
    All(Vec<Item>),
}

impl ItemList {
    pub fn items(&self) -> &[Item] {
        match self {
            ItemList::Page { items, .. } | ItemList::All(items) => items,
        }
    }

    pub fn into_items(self) -> Vec<Item> {
        match self {
            ItemList::Page { items, .. } | ItemList::All(items) => items,
        }
    }

    /// Total matching items on the server.
    pub fn total(&self) -> u64 {
        match self {
            ItemList::Page { total, .. } => *total,
            ItemList::All(items) => items.len() as u64,
        }
    }
}

/// Filters for listing items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListItemsQuery {
    pub category_id: Option<i64>,
    pub year: Option<i32>,
    pub is_completed: Option<bool>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub search: Option<String>,
}

/// `GET /items/years`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearsResponse {
    pub years: Vec<i32>,
}

/// `GET /items/category-counts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub total: u64,
    /// Count per category name.
    #[serde(default)]
    pub by_category: BTreeMap<String, u64>,
}

/// `GET /items/statistics/year/{year}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearStatistics {
    pub total: u64,
    #[serde(default)]
    pub by_category: BTreeMap<String, u64>,
    /// Keyed by month number as a string, `"1"` to `"12"`.
    #[serde(default)]
    pub by_month: BTreeMap<String, u64>,
}

impl YearStatistics {
    /// Count for a month (1-12).
    pub fn month(&self, month: u32) -> u64 {
        self.by_month.get(&month.to_string()).copied().unwrap_or(0)
    }
}

/// A completed item with a cover, as shown on the achievement wall and in the
/// annual gallery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallItem {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub image: Option<String>,
    /// WebP rendition of `image`, when the server has one.
    #[serde(default)]
    pub image_webp: Option<String>,
    /// `MM-DD` in the gallery, ISO date on the wall.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// `GET /items/achievement-wall`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementWall {
    #[serde(default)]
    pub items: Vec<WallItem>,
    #[serde(default)]
    pub total: u64,
}

/// An uploaded file.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Fields of the item create/update form.
#[derive(Debug, Clone, Default)]
pub struct ItemForm {
    pub title: String,
    pub category_id: Option<i64>,
    pub finish_time: Option<String>,
    pub due_time: Option<String>,
    pub notes: Option<String>,
    pub is_completed: Option<bool>,
    /// Remote cover the server should download.
    pub cover_image_url: Option<String>,
    /// Leave `finish_time` unset even when completing.
    pub skip_finish_time: bool,
    pub files: Vec<Upload>,
}

impl ItemForm {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Encode as multipart. Empty optional fields are omitted.
    pub fn to_multipart(&self) -> MultipartForm {
        let mut form = MultipartForm::new().text("title", self.title.trim());
        if let Some(id) = self.category_id {
            form = form.text("category_id", id.to_string());
        }
        for (name, value) in [
            ("finish_time", &self.finish_time),
            ("due_time", &self.due_time),
            ("notes", &self.notes),
            ("cover_image_url", &self.cover_image_url),
        ] {
            if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
                form = form.text(name, value);
            }
        }
        if let Some(done) = self.is_completed {
            form = form.text("is_completed", done.to_string());
        }
        if self.skip_finish_time {
            form = form.text("skip_finish_time", "true");
        }
        for file in &self.files {
            form = form.file(
                "files",
                file.filename.clone(),
                file.content_type.clone(),
                file.data.clone(),
            );
        }
        form
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Search
// ─────────────────────────────────────────────────────────────────────────────

/// One search result. Only the display fields are typed; the rest is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchItem {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub title_japanese: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchItem {
    /// Prefer the original-language title, then the title, then nothing.
    pub fn display_title(&self) -> &str {
        [&self.title_japanese, &self.title]
            .into_iter()
            .flatten()
            .map(|t| t.as_str())
            .find(|t| !t.is_empty())
            .unwrap_or("")
    }

    /// Only items with a cover URL are shown.
    pub fn is_displayable(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.is_empty())
    }
}

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub data: Vec<SearchItem>,
    #[serde(default)]
    pub has_next_page: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_list_accepts_both_shapes() {
        let page: ItemList = serde_json::from_value(json!({
            "items": [{"id": 1, "title": "Dune"}],
            "total": 14
        }))
        .unwrap();
        assert_eq!(page.total(), 14);
        assert_eq!(page.items()[0].title, "Dune");

        let all: ItemList =
            serde_json::from_value(json!([{"id": 1, "title": "Dune"}, {"id": 2, "title": "Up"}]))
                .unwrap();
        assert_eq!(all.total(), 2);
    }

    #[test]
    fn test_search_item_display_title() {
        let item: SearchItem = serde_json::from_value(json!({
            "url": "https://cdn.example/a.jpg",
            "title": "Frieren",
            "title_japanese": "葬送のフリーレン",
            "type": "anime",
            "score": 9.3
        }))
        .unwrap();
        assert_eq!(item.display_title(), "葬送のフリーレン");
        assert_eq!(item.kind.as_deref(), Some("anime"));
        assert_eq!(item.extra.get("score"), Some(&json!(9.3)));

        let plain = SearchItem {
            title_japanese: Some(String::new()),
            ..item.clone()
        };
        assert_eq!(plain.display_title(), "Frieren");
    }

    #[test]
    fn test_search_item_without_url_is_hidden() {
        let item: SearchItem = serde_json::from_value(json!({"title": "No cover"})).unwrap();
        assert!(!item.is_displayable());
    }

    #[test]
    fn test_year_statistics_month_lookup() {
        let stats: YearStatistics = serde_json::from_value(json!({
            "total": 3,
            "by_category": {"Books": 3},
            "by_month": {"1": 2, "7": 1}
        }))
        .unwrap();
        assert_eq!(stats.month(1), 2);
        assert_eq!(stats.month(12), 0);
    }

    #[test]
    fn test_item_form_omits_blank_fields() {
        let mut form = ItemForm::new("  Elden Ring ");
        form.category_id = Some(3);
        form.notes = Some("   ".into());
        form.cover_image_url = Some("https://img.example/er.jpg".into());

        let multipart = form.to_multipart();
        assert_eq!(multipart.text_value("title"), Some("Elden Ring"));
        assert_eq!(multipart.text_value("category_id"), Some("3"));
        assert_eq!(multipart.text_value("notes"), None);
        assert_eq!(
            multipart.text_value("cover_image_url"),
            Some("https://img.example/er.jpg")
        );
    }
}
