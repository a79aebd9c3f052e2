//! Main client implementation.

use std::sync::Arc;
use std::time::Duration;

use logfolio_types::{SharedClock, SharedNotifier, SystemClock};

use crate::api::{ItemsApi, SearchApi};
use crate::categories::{CategoryCache, DEFAULT_CATEGORIES_TTL};
use crate::coordinator::{Coordinator, CoordinatorConfig, DEFAULT_RESPONSE_TTL};
use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::retry::{DEFAULT_BACKOFF, DEFAULT_RETRY_BUDGET};
use crate::search::{SearchFilters, SearchSession, SearchView, DEFAULT_SCROLL_THRESHOLD};
use crate::transport::{ReqwestTransport, Transport, DEFAULT_API_PATH, DEFAULT_TIMEOUT};

/// Logfolio API client.
///
/// Owns one coordinator and one category cache; clones share both.
///
/// # Example
///
/// ```no_run
/// use logfolio_client::LogfolioClient;
///
/// # async fn example() -> logfolio_client::Result<()> {
/// let client = LogfolioClient::builder()
///     .base_url("http://127.0.0.1:8000")
///     .build()?;
///
/// let categories = client.categories().get_all(true).await?;
/// let years = client.items().years().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LogfolioClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    coordinator: Coordinator,
    categories: CategoryCache,
    notifier: Option<SharedNotifier>,
    search_filters: SearchFilters,
    scroll_threshold: u32,
}

impl LogfolioClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client with default settings pointing to localhost.
    pub fn localhost() -> Result<Self> {
        Self::builder().build()
    }

    /// The request coordinator.
    pub fn coordinator(&self) -> &Coordinator {
        &self.inner.coordinator
    }

    /// The uncoordinated gateway.
    pub fn gateway(&self) -> &Gateway {
        self.inner.coordinator.gateway()
    }

    /// The injected notifier, if any.
    pub fn notifier(&self) -> Option<&SharedNotifier> {
        self.inner.notifier.as_ref()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// The shared category cache.
    pub fn categories(&self) -> &CategoryCache {
        &self.inner.categories
    }

    /// Access the items API.
    pub fn items(&self) -> ItemsApi {
        ItemsApi::new(self.clone())
    }

    /// Access the search API.
    pub fn search(&self) -> SearchApi {
        SearchApi::new(self.clone())
    }

    /// Default filters for new searches.
    pub fn search_filters(&self) -> &SearchFilters {
        &self.inner.search_filters
    }

    /// Start a paginated search session rendering into `view`.
    pub fn search_session(&self, view: Arc<dyn SearchView>) -> SearchSession {
        SearchSession::new(self.gateway().clone(), view, self.inner.notifier.clone())
            .with_threshold(self.inner.scroll_threshold)
    }
}

/// Builder for creating a LogfolioClient.
pub struct ClientBuilder {
    base_url: String,
    api_path: String,
    timeout: Duration,
    response_ttl: Duration,
    categories_ttl: Duration,
    retry_budget: u32,
    retry_backoff: Duration,
    search_filters: SearchFilters,
    scroll_threshold: u32,
    transport: Option<Arc<dyn Transport>>,
    clock: Option<SharedClock>,
    notifier: Option<SharedNotifier>,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            api_path: DEFAULT_API_PATH.to_string(),
            timeout: DEFAULT_TIMEOUT,
            response_ttl: DEFAULT_RESPONSE_TTL,
            categories_ttl: DEFAULT_CATEGORIES_TTL,
            retry_budget: DEFAULT_RETRY_BUDGET,
            retry_backoff: DEFAULT_BACKOFF,
            search_filters: SearchFilters::default(),
            scroll_threshold: DEFAULT_SCROLL_THRESHOLD,
            transport: None,
            clock: None,
            notifier: None,
        }
    }

    /// Set the server origin.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the API path prefix (default `/api`).
    pub fn api_path(mut self, path: impl Into<String>) -> Self {
        self.api_path = path.into();
        self
    }

    /// Set the per-attempt request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the response cache lifetime.
    pub fn response_ttl(mut self, ttl: Duration) -> Self {
        self.response_ttl = ttl;
        self
    }

    /// Set the category cache lifetime.
    pub fn categories_ttl(mut self, ttl: Duration) -> Self {
        self.categories_ttl = ttl;
        self
    }

    /// Set the retry budget and backoff step.
    pub fn retry(mut self, budget: u32, backoff: Duration) -> Self {
        self.retry_budget = budget;
        self.retry_backoff = backoff;
        self
    }

    /// Set default search filters.
    pub fn search_filters(mut self, filters: SearchFilters) -> Self {
        self.search_filters = filters;
        self
    }

    /// Set the scroll threshold for search sessions.
    pub fn scroll_threshold(mut self, threshold: u32) -> Self {
        self.scroll_threshold = threshold;
        self
    }

    /// Use a custom transport instead of reqwest.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a custom clock for cache timestamps.
    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Deliver user-facing notices to `notifier`.
    pub fn notifier(mut self, notifier: SharedNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<LogfolioClient> {
        if self.timeout.is_zero() {
            return Err(Error::Config("timeout must be positive".to_string()));
        }

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(
                &self.base_url,
                &self.api_path,
                self.timeout,
            )?),
        };
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let coordinator = Coordinator::with_clock(
            Gateway::new(transport),
            CoordinatorConfig {
                ttl: self.response_ttl,
                retry_backoff: self.retry_backoff,
                default_retry_budget: self.retry_budget,
            },
            clock.clone(),
        );
        let categories = CategoryCache::with_clock(coordinator.clone(), self.categories_ttl, clock);

        Ok(LogfolioClient {
            inner: Arc::new(ClientInner {
                coordinator,
                categories,
                notifier: self.notifier,
                search_filters: self.search_filters,
                scroll_threshold: self.scroll_threshold,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    #[test]
    fn test_builder_rejects_bad_base_url() {
        let result = ClientBuilder::new().base_url("not a url").build();
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_builder_rejects_zero_timeout() {
        let result = ClientBuilder::new().timeout(Duration::ZERO).build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_applies_retry_settings() {
        let client = LogfolioClient::builder()
            .transport(Arc::new(MockTransport::new()))
            .retry(4, Duration::from_millis(50))
            .build()
            .unwrap();
        assert_eq!(client.coordinator().config().default_retry_budget, 4);
        assert_eq!(
            client.coordinator().config().retry_backoff,
            Duration::from_millis(50)
        );
    }
}
