//! Request coordination: deduplication, response caching and retry.
//!
//! Every call is identified by a [`CacheKey`]. While a call with a given key
//! is in flight, later callers join it instead of issuing their own request.
//! Successful GETs are cached for a TTL. Transport failures are retried with
//! linear backoff inside the shared task, so joined callers see one retry
//! sequence and one outcome.
//!
//! Invalidating a prefix also detaches in-flight GETs under it. A detached
//! request still settles for the callers already waiting on it, but later
//! callers start a fresh request and its response is never cached.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use logfolio_types::{SharedClock, SystemClock};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cache::TtlCache;
use crate::error::{Error, Result};
use crate::gateway::{decode, Gateway};
use crate::request::{ApiRequest, CacheKey, RequestOptions};
use crate::retry::{with_retry, DEFAULT_BACKOFF, DEFAULT_RETRY_BUDGET};

/// Default lifetime of a cached response.
pub const DEFAULT_RESPONSE_TTL: Duration = Duration::from_secs(30);

type SharedResponse = Shared<BoxFuture<'static, Result<Value>>>;

/// An in-flight request. The ticket tells a settling task whether its slot
/// is still its own or was detached (and possibly reused) meanwhile.
struct Pending {
    ticket: u64,
    response: SharedResponse,
}

/// Coordinator tuning.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// How long a cached GET response stays valid.
    pub ttl: Duration,
    /// Linear backoff step between retries.
    pub retry_backoff: Duration,
    /// Retries used by [`Coordinator::request_default`].
    pub default_retry_budget: u32,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_RESPONSE_TTL,
            retry_backoff: DEFAULT_BACKOFF,
            default_retry_budget: DEFAULT_RETRY_BUDGET,
        }
    }
}

/// Snapshot of coordinator bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorStats {
    /// Stored responses, expired ones included until next touched.
    pub cached: usize,
    /// Requests currently in flight.
    pub pending: usize,
}

/// Deduplicating, caching request front-end. Cheap to clone.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    gateway: Gateway,
    config: CoordinatorConfig,
    state: Mutex<CoordinatorState>,
}

struct CoordinatorState {
    cache: TtlCache<CacheKey, Value>,
    pending: HashMap<CacheKey, Pending>,
    next_ticket: u64,
}

impl CoordinatorState {
    fn owns_slot(&self, key: &CacheKey, ticket: u64) -> bool {
        self.pending.get(key).is_some_and(|p| p.ticket == ticket)
    }

    fn detach_under(&mut self, prefix: &str) -> usize {
        let before = self.pending.len();
        self.pending.retain(|key, _| !key.is_get_under(prefix));
        before - self.pending.len()
    }
}

impl Coordinator {
    /// Create a coordinator using the system clock.
    pub fn new(gateway: Gateway, config: CoordinatorConfig) -> Self {
        Self::with_clock(gateway, config, Arc::new(SystemClock))
    }

    /// Create a coordinator with an injected clock.
    pub fn with_clock(gateway: Gateway, config: CoordinatorConfig, clock: SharedClock) -> Self {
        let cache = TtlCache::new(config.ttl, clock);
        Self {
            inner: Arc::new(CoordinatorInner {
                gateway,
                config,
                state: Mutex::new(CoordinatorState {
                    cache,
                    pending: HashMap::new(),
                    next_ticket: 0,
                }),
            }),
        }
    }

    /// The gateway requests are sent through.
    pub fn gateway(&self) -> &Gateway {
        &self.inner.gateway
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    /// Issue a coordinated request.
    ///
    /// An in-flight call with the same key is joined. Otherwise, with
    /// `use_cache`, a live cached response is returned without touching the
    /// network. Successful GETs are cached when `use_cache` is set.
    pub async fn request(
        &self,
        endpoint: &str,
        options: RequestOptions,
        use_cache: bool,
        retry_budget: u32,
    ) -> Result<Value> {
        let key = CacheKey::new(endpoint, &options);

        let shared = {
            let mut state = self.inner.state.lock();
            if let Some(pending) = state.pending.get(&key) {
                tracing::debug!(key = %key, "joining in-flight request");
                pending.response.clone()
            } else {
                if use_cache {
                    if let Some(value) = state.cache.get(&key) {
                        tracing::trace!(key = %key, "cache hit");
                        return Ok(value);
                    }
                    tracing::trace!(key = %key, "cache miss");
                }
                let ticket = state.next_ticket;
                state.next_ticket += 1;
                let shared =
                    self.spawn(key.clone(), ticket, endpoint, options, use_cache, retry_budget);
                state.pending.insert(
                    key,
                    Pending {
                        ticket,
                        response: shared.clone(),
                    },
                );
                shared
            }
        };

        shared.await
    }

    /// [`Self::request`] with the cache enabled and the default retry budget.
    pub async fn request_default(&self, endpoint: &str, options: RequestOptions) -> Result<Value> {
        self.request(endpoint, options, true, self.inner.config.default_retry_budget)
            .await
    }

    /// Cached GET, deserialized into `T`.
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let value = self.request_default(endpoint, RequestOptions::get()).await?;
        decode(value)
    }

    /// Drop cached GET responses for `prefix` and every endpoint below it,
    /// and detach in-flight GETs there. Returns the number of cached
    /// responses dropped.
    pub fn invalidate(&self, prefix: &str) -> usize {
        let mut state = self.inner.state.lock();
        let dropped = state.cache.retain(|key| !key.is_get_under(prefix));
        let detached = state.detach_under(prefix);
        if dropped > 0 || detached > 0 {
            tracing::debug!(endpoint = prefix, dropped, detached, "invalidated cached responses");
        }
        dropped
    }

    /// Detach in-flight GETs for `prefix` and below without touching the
    /// cache. Returns the number detached.
    pub fn forget_in_flight(&self, prefix: &str) -> usize {
        let detached = self.inner.state.lock().detach_under(prefix);
        if detached > 0 {
            tracing::debug!(endpoint = prefix, detached, "detached in-flight requests");
        }
        detached
    }

    /// Drop every cached response and detach every in-flight request.
    pub fn clear(&self) {
        let mut state = self.inner.state.lock();
        state.cache.clear();
        state.pending.clear();
    }

    pub fn stats(&self) -> CoordinatorStats {
        let state = self.inner.state.lock();
        CoordinatorStats {
            cached: state.cache.len(),
            pending: state.pending.len(),
        }
    }

    /// Start the request on its own task so it settles even if every caller
    /// stops waiting. The task writes the cache, then clears the pending slot,
    /// but only while the slot still carries `ticket`.
    fn spawn(
        &self,
        key: CacheKey,
        ticket: u64,
        endpoint: &str,
        options: RequestOptions,
        use_cache: bool,
        retry_budget: u32,
    ) -> SharedResponse {
        let inner = self.inner.clone();
        let endpoint = endpoint.to_string();

        let handle = tokio::spawn(async move {
            let request = ApiRequest::from_options(&endpoint, &options);
            let gateway = &inner.gateway;
            let request_ref = &request;
            let result = with_retry(
                retry_budget,
                inner.config.retry_backoff,
                &endpoint,
                || gateway.send(request_ref),
            )
            .await;

            let mut state = inner.state.lock();
            if !state.owns_slot(&key, ticket) {
                tracing::debug!(key = %key, "request detached before settling; not cached");
                return result;
            }
            if let Ok(value) = &result {
                if use_cache && options.is_get() {
                    state.cache.insert(key.clone(), value.clone());
                }
            }
            state.pending.remove(&key);
            result
        });

        async move {
            match handle.await {
                Ok(result) => result,
                Err(e) => Err(Error::Internal(format!("request task failed: {}", e))),
            }
        }
        .boxed()
        .shared()
    }
}
