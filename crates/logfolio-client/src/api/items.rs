//! Items API.

use serde_json::Value;

use crate::api::with_query;
use crate::client::LogfolioClient;
use crate::error::{Error, Result};
use crate::gateway::decode;
use crate::request::{ApiRequest, Method, MultipartForm, RequestOptions};
use crate::types::{
    AchievementWall, CategoryCounts, Item, ItemForm, ItemImage, ItemList, ListItemsQuery, Upload,
    WallItem, YearStatistics, YearsResponse,
};

/// Prefix whose cached responses every item mutation invalidates.
const ITEMS_PREFIX: &str = "/items";

/// Items API client.
///
/// Reads go through the coordinator (cached, deduplicated, retried). Uploads
/// go straight through the gateway.
pub struct ItemsApi {
    client: LogfolioClient,
}

impl ItemsApi {
    pub(crate) fn new(client: LogfolioClient) -> Self {
        Self { client }
    }

    /// List items.
    pub async fn list(&self, query: &ListItemsQuery) -> Result<ItemList> {
        let endpoint = with_query(
            "/items/",
            [
                ("category_id", query.category_id.map(|v| v.to_string())),
                ("year", query.year.map(|v| v.to_string())),
                ("is_completed", query.is_completed.map(|v| v.to_string())),
                ("limit", query.limit.map(|v| v.to_string())),
                ("offset", query.offset.map(|v| v.to_string())),
                (
                    "search",
                    query
                        .search
                        .as_deref()
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string),
                ),
            ],
        );
        self.client.coordinator().get(&endpoint).await
    }

    /// Get an item by ID.
    pub async fn get(&self, id: i64) -> Result<Item> {
        self.client.coordinator().get(&format!("/items/{}", id)).await
    }

    /// Open todos.
    pub async fn todos(&self) -> Result<Vec<Item>> {
        self.client.coordinator().get("/items/todos").await
    }

    /// Years that have completed items, newest first.
    pub async fn years(&self) -> Result<Vec<i32>> {
        let response: YearsResponse = self.client.coordinator().get("/items/years").await?;
        Ok(response.years)
    }

    /// Item counts per category, optionally for one year.
    pub async fn category_counts(&self, year: Option<i32>) -> Result<CategoryCounts> {
        let endpoint = with_query(
            "/items/category-counts",
            [("year", year.map(|y| y.to_string()))],
        );
        self.client.coordinator().get(&endpoint).await
    }

    /// Per-category and per-month totals for a year.
    pub async fn year_statistics(&self, year: i32) -> Result<YearStatistics> {
        self.client
            .coordinator()
            .get(&format!("/items/statistics/year/{}", year))
            .await
    }

    /// Completed items with covers for a year, oldest first.
    pub async fn annual_gallery(&self, year: i32) -> Result<Vec<WallItem>> {
        self.client
            .coordinator()
            .get(&format!("/items/annual-gallery/{}", year))
            .await
    }

    /// Achievement wall for a category. Without a category the server
    /// answers an empty wall.
    pub async fn achievement_wall(&self, category_id: Option<i64>) -> Result<AchievementWall> {
        let endpoint = with_query(
            "/items/achievement-wall",
            [("category_id", category_id.map(|id| id.to_string()))],
        );
        self.client.coordinator().get(&endpoint).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Delete an item.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = self
            .client
            .coordinator()
            .request_default(&format!("/items/{}", id), RequestOptions::delete())
            .await;
        self.invalidate();
        result.map(|_| ())
    }

    /// Mark an item completed.
    pub async fn complete(&self, id: i64) -> Result<Item> {
        let result = self
            .client
            .coordinator()
            .request_default(
                &format!("/items/{}/complete", id),
                RequestOptions::put(None),
            )
            .await;
        self.invalidate();
        decode(result?)
    }

    /// Delete one image.
    pub async fn delete_image(&self, image_id: i64) -> Result<()> {
        let result = self
            .client
            .coordinator()
            .request_default(
                &format!("/items/images/{}", image_id),
                RequestOptions::delete(),
            )
            .await;
        self.invalidate();
        result.map(|_| ())
    }

    /// Create an item from a multipart form.
    pub async fn create(&self, form: &ItemForm) -> Result<Item> {
        validate_form(form)?;
        self.upload(Method::Post, "/items/", form.to_multipart())
            .await
            .and_then(decode)
    }

    /// Replace an item's fields.
    pub async fn update(&self, id: i64, form: &ItemForm) -> Result<Item> {
        validate_form(form)?;
        self.upload(Method::Put, &format!("/items/{}", id), form.to_multipart())
            .await
            .and_then(decode)
    }

    /// Attach images to an item.
    pub async fn add_images(&self, id: i64, files: Vec<Upload>) -> Result<Vec<ItemImage>> {
        if files.is_empty() {
            return Err(Error::Validation("no images selected".into()));
        }
        let form = files.into_iter().fold(MultipartForm::new(), |form, file| {
            form.file("files", file.filename, file.content_type, file.data)
        });
        self.upload(Method::Post, &format!("/items/{}/images", id), form)
            .await
            .and_then(decode)
    }

    /// Have the server download a remote image and attach it as the cover.
    pub async fn add_cover_from_url(&self, id: i64, cover_url: &str) -> Result<Vec<ItemImage>> {
        let cover_url = cover_url.trim();
        if cover_url.is_empty() {
            return Err(Error::Validation("cover URL must not be empty".into()));
        }
        let form = MultipartForm::new().text("cover_image_url", cover_url);
        self.upload(Method::Post, &format!("/items/{}/cover-from-url", id), form)
            .await
            .and_then(decode)
    }

    /// Send a multipart request directly and invalidate item reads, whatever
    /// the outcome.
    async fn upload(&self, method: Method, endpoint: &str, form: MultipartForm) -> Result<Value> {
        let request = ApiRequest::new(method, endpoint).multipart(form);
        let result = self.client.gateway().send(&request).await;
        self.invalidate();
        result
    }

    fn invalidate(&self) {
        self.client.coordinator().invalidate(ITEMS_PREFIX);
    }
}

fn validate_form(form: &ItemForm) -> Result<()> {
    if form.title.trim().is_empty() {
        return Err(Error::Validation("title must not be empty".into()));
    }
    Ok(())
}
