//! Category list cache.
//!
//! Categories change rarely and are read on almost every screen, so the list
//! is kept in its own entry with a longer lifetime than the generic response
//! cache. Mutations clear it before returning.

use std::sync::Arc;
use std::time::Duration;

use logfolio_types::{SharedClock, SystemClock};
use parking_lot::Mutex;

use crate::cache::CacheEntry;
use crate::coordinator::Coordinator;
use crate::error::{Error, Result};
use crate::gateway::decode;
use crate::request::RequestOptions;
use crate::types::{Category, CreateCategoryRequest};

/// Default lifetime of the category list.
pub const DEFAULT_CATEGORIES_TTL: Duration = Duration::from_secs(300);

const CATEGORIES_ENDPOINT: &str = "/categories/";

/// Cached access to the category list. Cheap to clone; clones share the entry.
#[derive(Clone)]
pub struct CategoryCache {
    coordinator: Coordinator,
    state: Arc<Mutex<CategoryState>>,
    ttl: Duration,
    clock: SharedClock,
}

#[derive(Default)]
struct CategoryState {
    entry: Option<CacheEntry<Vec<Category>>>,
    /// Bumped on every invalidation. A refill only stores its result if the
    /// generation it started under is still current.
    generation: u64,
}

impl CategoryCache {
    pub fn new(coordinator: Coordinator, ttl: Duration) -> Self {
        Self::with_clock(coordinator, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(coordinator: Coordinator, ttl: Duration, clock: SharedClock) -> Self {
        Self {
            coordinator,
            state: Arc::new(Mutex::new(CategoryState::default())),
            ttl,
            clock,
        }
    }

    /// All categories. With `use_cache`, a live entry is served locally.
    pub async fn get_all(&self, use_cache: bool) -> Result<Vec<Category>> {
        let generation = {
            let mut state = self.state.lock();
            if use_cache {
                let now = self.clock.now();
                if let Some(entry) = &state.entry {
                    if entry.is_fresh(now, self.ttl) {
                        tracing::trace!("category cache hit");
                        return Ok(entry.value.clone());
                    }
                }
                if state.entry.take().is_some() {
                    tracing::debug!("category cache expired");
                }
            }
            state.generation
        };

        // Bypass the response cache so a forced refill always reaches the
        // server; concurrent refills still share one request.
        let value = self
            .coordinator
            .request(
                CATEGORIES_ENDPOINT,
                RequestOptions::get(),
                false,
                self.coordinator.config().default_retry_budget,
            )
            .await?;
        let categories: Vec<Category> = decode(value)?;

        let mut state = self.state.lock();
        if state.generation == generation {
            state.entry = Some(CacheEntry {
                value: categories.clone(),
                stored_at: self.clock.now(),
            });
        } else {
            tracing::debug!("discarding category refill started before invalidation");
        }
        Ok(categories)
    }

    /// Drop the cached list. A refill already in flight is detached, so the
    /// next read issues its own request instead of joining the stale one.
    pub fn invalidate(&self) {
        {
            let mut state = self.state.lock();
            state.entry = None;
            state.generation += 1;
        }
        self.coordinator.forget_in_flight(CATEGORIES_ENDPOINT);
    }

    /// Whether a live list is cached.
    pub fn is_cached(&self) -> bool {
        let state = self.state.lock();
        state
            .entry
            .as_ref()
            .is_some_and(|entry| entry.is_fresh(self.clock.now(), self.ttl))
    }

    /// Create a category. The cache is cleared whatever the outcome.
    pub async fn create(&self, name: &str) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("category name must not be empty".into()));
        }

        let body = serde_json::to_value(CreateCategoryRequest {
            name: name.to_string(),
        })?;
        let result = self
            .coordinator
            .request_default(CATEGORIES_ENDPOINT, RequestOptions::post(body))
            .await;
        self.invalidate();

        decode(result?)
    }

    /// Delete a category. The cache is cleared whatever the outcome.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let endpoint = format!("{}{}", CATEGORIES_ENDPOINT, id);
        let result = self
            .coordinator
            .request_default(&endpoint, RequestOptions::delete())
            .await;
        self.invalidate();

        result.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::CoordinatorConfig;
    use crate::gateway::Gateway;
    use crate::request::Method;
    use crate::transport::{MockTransport, RawResponse};
    use logfolio_types::ManualClock;
    use serde_json::json;

    fn setup() -> (CategoryCache, Arc<MockTransport>, Arc<ManualClock>) {
        let mock = Arc::new(MockTransport::new());
        let clock = Arc::new(ManualClock::new());
        let coordinator = Coordinator::with_clock(
            Gateway::new(mock.clone()),
            CoordinatorConfig::default(),
            clock.clone(),
        );
        let cache = CategoryCache::with_clock(coordinator, DEFAULT_CATEGORIES_TTL, clock.clone());
        (cache, mock, clock)
    }

    fn categories() -> serde_json::Value {
        json!([
            {"id": 1, "name": "Anime", "user_defined": false},
            {"id": 2, "name": "Books", "user_defined": false}
        ])
    }

    #[tokio::test]
    async fn test_get_all_serves_from_cache() {
        let (cache, mock, clock) = setup();
        mock.push_get(CATEGORIES_ENDPOINT, categories());

        assert_eq!(cache.get_all(true).await.unwrap().len(), 2);
        clock.advance(Duration::from_secs(299));
        assert_eq!(cache.get_all(true).await.unwrap().len(), 2);
        assert_eq!(mock.request_count(), 1);

        clock.advance(Duration::from_secs(1));
        cache.get_all(true).await.unwrap();
        assert_eq!(mock.request_count(), 2);
    }

    #[tokio::test]
    async fn test_forced_refresh_reaches_network() {
        let (cache, mock, _clock) = setup();
        mock.push_get(CATEGORIES_ENDPOINT, categories());

        cache.get_all(true).await.unwrap();
        cache.get_all(false).await.unwrap();
        assert_eq!(mock.request_count(), 2);
    }

    #[tokio::test]
    async fn test_create_invalidates_even_on_failure() {
        let (cache, mock, _clock) = setup();
        mock.push_get(CATEGORIES_ENDPOINT, categories());
        mock.push(
            Method::Post,
            CATEGORIES_ENDPOINT,
            Ok(RawResponse::json(400, &json!({"detail": "Category already exists"}))),
        );

        cache.get_all(true).await.unwrap();
        assert!(cache.is_cached());

        let err = cache.create("Anime").await.unwrap_err();
        assert_eq!(err.user_message(), "Category already exists");
        assert!(!cache.is_cached());
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name_without_request() {
        let (cache, mock, _clock) = setup();
        let err = cache.create("   ").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_then_get_all_refetches() {
        let (cache, mock, _clock) = setup();
        mock.push_get(CATEGORIES_ENDPOINT, categories());
        mock.push(Method::Delete, "/categories/2", Ok(RawResponse::new(204, "")));

        cache.get_all(true).await.unwrap();
        cache.delete(2).await.unwrap();
        cache.get_all(true).await.unwrap();

        assert_eq!(mock.count(Method::Get, CATEGORIES_ENDPOINT), 2);
    }
}
