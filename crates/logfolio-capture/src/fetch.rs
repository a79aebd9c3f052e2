//! Cross-origin image fetching and blob storage.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use url::Url;

use crate::error::FetchError;

/// Fetched image bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    pub data: Bytes,
    pub content_type: Option<String>,
}

/// Fetches a remote image without credentials.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Blob, FetchError>;
}

/// reqwest-backed fetcher. No cookie store, so no credentials are sent.
#[derive(Debug, Clone)]
pub struct ReqwestImageFetcher {
    http: reqwest::Client,
}

impl ReqwestImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!("logfolio-capture/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl ImageFetcher for ReqwestImageFetcher {
    async fn fetch(&self, url: &Url) -> Result<Blob, FetchError> {
        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let data = response.bytes().await?;
        Ok(Blob { data, content_type })
    }
}

/// Issues short-lived local URLs for fetched blobs.
pub trait BlobStore: Send + Sync {
    /// Store `blob` and return a `blob:` URL for it.
    fn create(&self, blob: Blob) -> String;

    /// Release a URL returned by [`BlobStore::create`]. Unknown URLs are ignored.
    fn revoke(&self, url: &str);
}

/// In-process blob store.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Blob>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<Blob> {
        self.blobs.lock().get(url).cloned()
    }

    /// Number of live URLs.
    pub fn len(&self) -> usize {
        self.blobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.lock().is_empty()
    }
}

impl BlobStore for MemoryBlobStore {
    fn create(&self, blob: Blob) -> String {
        let url = format!("blob:logfolio/{}", uuid::Uuid::new_v4());
        self.blobs.lock().insert(url.clone(), blob);
        url
    }

    fn revoke(&self, url: &str) {
        self.blobs.lock().remove(url);
    }
}
