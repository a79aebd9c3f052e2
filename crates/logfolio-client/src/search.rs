//! Incrementally paginated cover search.
//!
//! A [`SearchSession`] owns the search state for one result area. The first
//! page is fetched by [`SearchSession::start_search`]; later pages are pulled
//! by scroll events through [`SearchSession::on_scroll`]. The session talks
//! to its host only through a [`SearchView`] and an optional notifier.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use logfolio_types::{notify, Notice, SharedNotifier};
use parking_lot::Mutex;

use crate::api::search::page_endpoint;
use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::request::ApiRequest;
use crate::types::{SearchItem, SearchPage};

/// Default remaining scroll distance, in pixels, that triggers the next page.
pub const DEFAULT_SCROLL_THRESHOLD: u32 = 120;

const NO_RESULTS_MESSAGE: &str = "No results found";
const SEARCH_FAILED_MESSAGE: &str = "Search failed, please try again";

// ─────────────────────────────────────────────────────────────────────────────
// Filters
// ─────────────────────────────────────────────────────────────────────────────

/// Media type filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchKind {
    #[default]
    Both,
    Anime,
    Manga,
    Game,
}

impl SearchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Both => "both",
            SearchKind::Anime => "anime",
            SearchKind::Manga => "manga",
            SearchKind::Game => "game",
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "both" | "" => Ok(SearchKind::Both),
            "anime" => Ok(SearchKind::Anime),
            "manga" => Ok(SearchKind::Manga),
            "game" => Ok(SearchKind::Game),
            other => Err(Error::Validation(format!("unknown search type: {}", other))),
        }
    }
}

/// Filters applied to every page of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilters {
    pub kind: SearchKind,
    /// Upstream source selector.
    pub source: String,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            kind: SearchKind::Both,
            source: "both".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// State and view
// ─────────────────────────────────────────────────────────────────────────────

/// Snapshot of a session's progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    /// Trimmed query; empty before the first search.
    pub query: String,
    pub filters: SearchFilters,
    /// Last page successfully shown.
    pub page: u32,
    /// First page in flight.
    pub loading: bool,
    /// A further page in flight.
    pub loading_more: bool,
    /// As reported by the last page received. Sole gate for further pages.
    pub has_next_page: bool,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            query: String::new(),
            filters: SearchFilters::default(),
            page: 1,
            loading: false,
            loading_more: false,
            has_next_page: false,
        }
    }
}

/// Scroll position of the result area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub client_height: f64,
    pub scroll_height: f64,
}

impl ScrollMetrics {
    /// Whether the visible bottom is within `threshold` pixels of the end.
    pub fn near_bottom(&self, threshold: u32) -> bool {
        self.scroll_top + self.client_height >= self.scroll_height - f64::from(threshold)
    }
}

/// Result area rendering capability.
///
/// Calls are made while the session's state lock is held, so implementations
/// must not call back into the session.
pub trait SearchView: Send + Sync {
    /// Remove all results and messages.
    fn clear(&self);
    /// Show or hide the first-page spinner.
    fn set_loading(&self, loading: bool);
    /// Append displayable results.
    fn append(&self, items: &[SearchItem]);
    /// Replace the area with a message (no results, or failure).
    fn show_empty(&self, message: &str);
    /// Show the trailing "loading more" placeholder.
    fn show_loading_more(&self);
    /// Remove the placeholder.
    fn hide_loading_more(&self);
}

/// Outcome of a page request.
#[derive(Debug, Clone, PartialEq)]
pub enum PageLoad {
    /// The page arrived and was shown.
    Loaded {
        page: u32,
        /// Displayable items of this page.
        items: Vec<SearchItem>,
        has_next_page: bool,
    },
    /// Guards prevented a request.
    Skipped,
    /// A newer search started while this page was in flight; nothing was shown.
    Superseded,
}

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

/// Paginated search bound to one view.
pub struct SearchSession {
    gateway: Gateway,
    view: Arc<dyn SearchView>,
    notifier: Option<SharedNotifier>,
    threshold: u32,
    inner: Mutex<SessionInner>,
}

#[derive(Default)]
struct SessionInner {
    state: SearchState,
    /// Bumped by every `start_search`; responses from older searches are dropped.
    generation: u64,
    /// The view shows a "no results" or failure message instead of results.
    empty_state: bool,
}

impl SearchSession {
    pub fn new(
        gateway: Gateway,
        view: Arc<dyn SearchView>,
        notifier: Option<SharedNotifier>,
    ) -> Self {
        Self {
            gateway,
            view,
            notifier,
            threshold: DEFAULT_SCROLL_THRESHOLD,
            inner: Mutex::new(SessionInner::default()),
        }
    }

    /// Set the scroll threshold in pixels.
    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Current state.
    pub fn state(&self) -> SearchState {
        self.inner.lock().state.clone()
    }

    /// Start a new search, discarding the previous one.
    ///
    /// A blank query is rejected locally and reported through the notifier.
    pub async fn start_search(&self, query: &str, filters: SearchFilters) -> Result<PageLoad> {
        let query = query.trim().to_string();
        if query.is_empty() {
            let err = Error::Validation("Please enter a search term".into());
            notify(
                self.notifier.as_ref(),
                Notice::error(err.kind(), err.user_message()),
            );
            return Err(err);
        }

        let generation = {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            inner.empty_state = false;
            inner.state = SearchState {
                query: query.clone(),
                filters: filters.clone(),
                page: 1,
                loading: true,
                loading_more: false,
                has_next_page: false,
            };
            self.view.clear();
            self.view.set_loading(true);
            inner.generation
        };

        tracing::debug!(query = %query, kind = %filters.kind, "starting search");
        let result = self.fetch(&query, &filters, 1).await;

        let outcome = {
            let mut inner = self.inner.lock();
            if inner.generation != generation {
                tracing::debug!(query = %query, "discarding superseded first page");
                return Ok(PageLoad::Superseded);
            }
            inner.state.loading = false;
            self.view.set_loading(false);

            match result {
                Ok(page) => {
                    inner.state.has_next_page = page.has_next_page;
                    let items = displayable(page.data);
                    if items.is_empty() {
                        inner.empty_state = true;
                        self.view.show_empty(NO_RESULTS_MESSAGE);
                    } else {
                        self.view.append(&items);
                    }
                    Ok(PageLoad::Loaded {
                        page: 1,
                        items,
                        has_next_page: page.has_next_page,
                    })
                }
                Err(e) => {
                    inner.empty_state = true;
                    self.view.show_empty(SEARCH_FAILED_MESSAGE);
                    Err(e)
                }
            }
        };

        if let Err(e) = &outcome {
            self.report(e, 1);
        }
        outcome
    }

    /// Fetch and append the next page if the guards allow it.
    pub async fn load_more(&self) -> Result<PageLoad> {
        let (generation, query, filters, next) = {
            let mut inner = self.inner.lock();
            let state = &inner.state;
            if state.loading_more
                || !state.has_next_page
                || state.query.is_empty()
                || inner.empty_state
            {
                return Ok(PageLoad::Skipped);
            }
            let request = (
                inner.generation,
                state.query.clone(),
                state.filters.clone(),
                state.page + 1,
            );
            inner.state.loading_more = true;
            self.view.show_loading_more();
            request
        };

        tracing::debug!(query = %query, page = next, "loading next page");
        let result = self.fetch(&query, &filters, next).await;

        let outcome = {
            let mut inner = self.inner.lock();
            if inner.generation != generation {
                tracing::debug!(query = %query, page = next, "discarding superseded page");
                return Ok(PageLoad::Superseded);
            }
            inner.state.loading_more = false;
            self.view.hide_loading_more();

            result.map(|page| {
                inner.state.page = next;
                inner.state.has_next_page = page.has_next_page;
                let items = displayable(page.data);
                self.view.append(&items);
                PageLoad::Loaded {
                    page: next,
                    items,
                    has_next_page: page.has_next_page,
                }
            })
        };

        if let Err(e) = &outcome {
            self.report(e, next);
        }
        outcome
    }

    /// Load the next page when the result area is scrolled near its end.
    pub async fn on_scroll(&self, metrics: ScrollMetrics) -> Result<PageLoad> {
        if !metrics.near_bottom(self.threshold) {
            return Ok(PageLoad::Skipped);
        }
        self.load_more().await
    }

    async fn fetch(&self, query: &str, filters: &SearchFilters, page: u32) -> Result<SearchPage> {
        let request = ApiRequest::get(page_endpoint(query, filters, page));
        self.gateway.send_as(&request).await
    }

    fn report(&self, err: &Error, page: u32) {
        tracing::warn!(page, error = %err, "search page failed");
        notify(
            self.notifier.as_ref(),
            Notice::error(err.kind(), err.user_message()),
        );
    }
}

fn displayable(items: Vec<SearchItem>) -> Vec<SearchItem> {
    items.into_iter().filter(SearchItem::is_displayable).collect()
}
