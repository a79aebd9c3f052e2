//! Client-side request orchestration for the Logfolio backend.
//!
//! # Layers
//!
//! - [`Transport`]: the single chokepoint to the network ([`ReqwestTransport`]
//!   in production, [`MockTransport`] in tests).
//! - [`Gateway`]: classifies responses into JSON or an [`Error`].
//! - [`Coordinator`]: deduplicates in-flight requests, caches GET responses
//!   for a TTL, retries transport failures with linear backoff.
//! - [`CategoryCache`]: long-lived cache of the category list.
//! - [`SearchSession`]: scroll-driven paginated cover search.
//!
//! # Example
//!
//! ```no_run
//! use logfolio_client::{ListItemsQuery, LogfolioClient, Result};
//!
//! # async fn example() -> Result<()> {
//! let client = LogfolioClient::builder()
//!     .base_url("http://127.0.0.1:8000")
//!     .build()?;
//!
//! let page = client
//!     .items()
//!     .list(&ListItemsQuery {
//!         limit: Some(20),
//!         ..Default::default()
//!     })
//!     .await?;
//! println!("{} of {} items", page.items().len(), page.total());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod categories;
pub mod client;
pub mod coordinator;
pub mod error;
pub mod gateway;
pub mod request;
pub mod retry;
pub mod search;
pub mod transport;
pub mod types;

pub use api::{ItemsApi, SearchApi};
pub use cache::{CacheEntry, TtlCache};
pub use categories::CategoryCache;
pub use client::{ClientBuilder, LogfolioClient};
pub use coordinator::{Coordinator, CoordinatorConfig, CoordinatorStats};
pub use error::{Error, Result};
pub use gateway::Gateway;
pub use request::{ApiRequest, CacheKey, Method, MultipartForm, RequestBody, RequestOptions};
pub use search::{
    PageLoad, ScrollMetrics, SearchFilters, SearchKind, SearchSession, SearchState, SearchView,
};
pub use transport::{MockTransport, RawResponse, ReqwestTransport, Transport};
pub use types::*;
