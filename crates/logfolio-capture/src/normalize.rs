//! Making every image in the target safe to composite.
//!
//! Cross-origin images would taint the capture, so they are fetched without
//! credentials and swapped for local blob URLs. Same-origin images only need
//! to finish loading. Nothing here is fatal: an image that cannot be
//! normalized is captured as it is.

use std::time::Duration;

use futures::future::join_all;
use url::Url;

use crate::fetch::{BlobStore, ImageFetcher};
use crate::job::ExportJob;

/// How an image source is handled before capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// Empty, `data:` or `blob:`; nothing to wait for.
    Inline,
    /// Served by the page's own origin.
    SameOrigin,
    /// Must be fetched and swapped for a blob URL.
    CrossOrigin(Url),
}

/// Classify `src` relative to the page `origin`.
pub fn classify(src: &str, origin: Option<&Url>) -> SourceKind {
    let src = src.trim();
    if src.is_empty() || src.starts_with("data:") || src.starts_with("blob:") {
        return SourceKind::Inline;
    }

    let resolved = match origin {
        Some(origin) => origin.join(src),
        None => Url::parse(src),
    };
    match resolved {
        Ok(url) if origin.is_some_and(|o| o.origin() == url.origin()) => SourceKind::SameOrigin,
        Ok(url) if matches!(url.scheme(), "http" | "https") => SourceKind::CrossOrigin(url),
        // Unresolvable or non-network sources load (or fail) on their own.
        _ => SourceKind::SameOrigin,
    }
}

/// Normalize every image of `job` concurrently and wait until all settle.
///
/// Each wait and fetch is bounded by `timeout`.
pub async fn normalize_images(
    job: &ExportJob,
    origin: Option<&Url>,
    fetcher: &dyn ImageFetcher,
    blobs: &dyn BlobStore,
    timeout: Duration,
) {
    let tasks = (0..job.len()).map(|index| async move {
        normalize_one(job, index, origin, fetcher, blobs, timeout).await;
        job.settle();
    });
    join_all(tasks).await;
    tracing::debug!(
        images = job.len(),
        normalized = job.normalized(),
        "images settled"
    );
}

async fn normalize_one(
    job: &ExportJob,
    index: usize,
    origin: Option<&Url>,
    fetcher: &dyn ImageFetcher,
    blobs: &dyn BlobStore,
    timeout: Duration,
) {
    let (Some(image), Some(src)) = (job.image(index), job.original_src(index)) else {
        return;
    };

    match classify(&src, origin) {
        SourceKind::Inline => {}
        SourceKind::SameOrigin => {
            if tokio::time::timeout(timeout, image.wait_loaded()).await.is_err() {
                tracing::debug!(src = %src, "image load timed out");
            }
        }
        SourceKind::CrossOrigin(url) => match tokio::time::timeout(timeout, fetcher.fetch(&url)).await {
            Ok(Ok(blob)) => {
                let blob_url = blobs.create(blob);
                job.record_blob(index, blob_url.clone());
                image.set_src(&blob_url);
                if tokio::time::timeout(timeout, image.wait_loaded()).await.is_err() {
                    tracing::debug!(src = %src, "blob image load timed out");
                }
            }
            Ok(Err(e)) => {
                tracing::debug!(src = %src, error = %e, "proceeding without normalization");
            }
            Err(_) => {
                tracing::debug!(src = %src, "image fetch timed out, proceeding without normalization");
            }
        },
    }
}
