//! Cover search API.

use crate::api::with_query;
use crate::client::LogfolioClient;
use crate::error::{Error, Result};
use crate::request::ApiRequest;
use crate::search::SearchFilters;
use crate::types::SearchPage;

const SEARCH_ENDPOINT: &str = "/anime-search";

/// Cover search API client.
pub struct SearchApi {
    client: LogfolioClient,
}

impl SearchApi {
    pub(crate) fn new(client: LogfolioClient) -> Self {
        Self { client }
    }

    /// Fetch one page of results. Never cached, never deduplicated.
    pub async fn page(&self, query: &str, filters: &SearchFilters, page: u32) -> Result<SearchPage> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::Validation("search query must not be empty".into()));
        }
        let request = ApiRequest::get(page_endpoint(query, filters, page));
        self.client.gateway().send_as(&request).await
    }

    /// First page of results through the coordinator, for quick cover
    /// suggestions where a cached answer is fine.
    pub async fn cover_candidates(&self, query: &str, filters: &SearchFilters) -> Result<SearchPage> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::Validation("search query must not be empty".into()));
        }
        self.client
            .coordinator()
            .get(&page_endpoint(query, filters, 1))
            .await
    }
}

/// `/anime-search?q=&type=&page=&source=`
pub(crate) fn page_endpoint(query: &str, filters: &SearchFilters, page: u32) -> String {
    with_query(
        SEARCH_ENDPOINT,
        [
            ("q", Some(query.to_string())),
            ("type", Some(filters.kind.as_str().to_string())),
            ("page", Some(page.to_string())),
            ("source", Some(filters.source.clone())),
        ],
    )
}
