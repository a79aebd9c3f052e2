//! Per-export bookkeeping of swapped image sources.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::fetch::BlobStore;
use crate::surface::{CaptureImage, Substitution};

struct JobImage {
    image: Arc<dyn CaptureImage>,
    original_src: String,
    blob_url: Option<String>,
}

/// Tracks every image of one export and the blob URL swapped into it, if any.
///
/// [`ExportJob::release`] puts every original source back and revokes every
/// blob URL. It is idempotent and also runs on drop.
pub struct ExportJob {
    images: Mutex<Vec<JobImage>>,
    settled: AtomicUsize,
    blobs: Arc<dyn BlobStore>,
    released: Mutex<bool>,
}

impl ExportJob {
    /// Snapshot the current sources of `images`.
    pub fn new(images: Vec<Arc<dyn CaptureImage>>, blobs: Arc<dyn BlobStore>) -> Self {
        let images = images
            .into_iter()
            .map(|image| JobImage {
                original_src: image.src(),
                image,
                blob_url: None,
            })
            .collect();
        Self {
            images: Mutex::new(images),
            settled: AtomicUsize::new(0),
            blobs,
            released: Mutex::new(false),
        }
    }

    pub fn len(&self) -> usize {
        self.images.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.lock().is_empty()
    }

    /// Source of image `index` when the job started.
    pub fn original_src(&self, index: usize) -> Option<String> {
        self.images.lock().get(index).map(|i| i.original_src.clone())
    }

    pub fn image(&self, index: usize) -> Option<Arc<dyn CaptureImage>> {
        self.images.lock().get(index).map(|i| i.image.clone())
    }

    /// Record that `blob_url` now backs image `index`.
    pub fn record_blob(&self, index: usize, blob_url: String) {
        if let Some(entry) = self.images.lock().get_mut(index) {
            entry.blob_url = Some(blob_url);
        }
    }

    /// Mark one image as settled; returns the new count.
    pub fn settle(&self) -> usize {
        self.settled.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn settled(&self) -> usize {
        self.settled.load(Ordering::SeqCst)
    }

    /// Number of images backed by a blob URL.
    pub fn normalized(&self) -> usize {
        self.images
            .lock()
            .iter()
            .filter(|i| i.blob_url.is_some())
            .count()
    }

    /// Original-to-blob pairs for the compositor, in image order.
    pub fn substitutions(&self) -> Vec<Substitution> {
        self.images
            .lock()
            .iter()
            .filter_map(|i| {
                i.blob_url.as_ref().map(|blob| Substitution {
                    original: i.original_src.clone(),
                    replacement: blob.clone(),
                })
            })
            .collect()
    }

    /// Restore sources and revoke blob URLs. Later calls do nothing.
    pub fn release(&self) {
        let mut released = self.released.lock();
        if *released {
            return;
        }
        *released = true;

        let mut restored = 0usize;
        for entry in self.images.lock().iter_mut() {
            if let Some(blob_url) = entry.blob_url.take() {
                entry.image.set_src(&entry.original_src);
                self.blobs.revoke(&blob_url);
                restored += 1;
            }
        }
        tracing::debug!(images = restored, "export job released");
    }

    pub fn is_released(&self) -> bool {
        *self.released.lock()
    }
}

impl Drop for ExportJob {
    fn drop(&mut self) {
        self.release();
    }
}
