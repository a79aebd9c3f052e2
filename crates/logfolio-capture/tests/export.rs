//! Export pipeline behaviour with in-memory host capabilities.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use logfolio_capture::{
    Blob, BlobStore, CaptureError, CaptureImage, Compositor, Downloader, ExportJob, ExportOptions,
    ExportPipeline, ExportTarget, FetchError, ImageFetcher, ImageFormat, MemoryBlobStore, Raster,
    RenderOptions,
};
use logfolio_types::{Notice, NoticeLevel, SharedNotifier};
use parking_lot::Mutex;
use url::Url;

// ─────────────────────────────────────────────────────────────────────────────
// Fakes
// ─────────────────────────────────────────────────────────────────────────────

struct FakeImage {
    src: Mutex<String>,
    /// `None` means the image never finishes loading.
    load_time: Option<Duration>,
}

impl FakeImage {
    fn new(src: &str) -> Arc<Self> {
        Arc::new(Self {
            src: Mutex::new(src.to_string()),
            load_time: Some(Duration::ZERO),
        })
    }

    fn stuck(src: &str) -> Arc<Self> {
        Arc::new(Self {
            src: Mutex::new(src.to_string()),
            load_time: None,
        })
    }
}

#[async_trait]
impl CaptureImage for FakeImage {
    fn src(&self) -> String {
        self.src.lock().clone()
    }

    fn set_src(&self, src: &str) {
        *self.src.lock() = src.to_string();
    }

    async fn wait_loaded(&self) {
        match self.load_time {
            Some(delay) => tokio::time::sleep(delay).await,
            None => std::future::pending::<()>().await,
        }
    }
}

struct FakeTarget {
    cells: usize,
    images: Vec<Arc<FakeImage>>,
}

impl ExportTarget for FakeTarget {
    fn origin(&self) -> Option<Url> {
        Url::parse("https://log.example.com/").ok()
    }

    fn cell_count(&self) -> usize {
        self.cells
    }

    fn images(&self) -> Vec<Arc<dyn CaptureImage>> {
        self.images
            .iter()
            .map(|i| i.clone() as Arc<dyn CaptureImage>)
            .collect()
    }
}

#[derive(Default)]
struct FakeFetcher {
    failing_hosts: Vec<String>,
    fetched: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageFetcher for FakeFetcher {
    async fn fetch(&self, url: &Url) -> Result<Blob, FetchError> {
        self.fetched.lock().push(url.to_string());
        if url
            .host_str()
            .is_some_and(|h| self.failing_hosts.iter().any(|f| f == h))
        {
            return Err(FetchError::Status(403));
        }
        Ok(Blob {
            data: Bytes::from_static(b"jpeg"),
            content_type: Some("image/jpeg".into()),
        })
    }
}

#[derive(Clone)]
struct FakeRaster {
    width: u32,
    height: u32,
    formats: Vec<ImageFormat>,
}

impl Raster for FakeRaster {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn resize(&self, width: u32, height: u32) -> Box<dyn Raster> {
        Box::new(FakeRaster {
            width,
            height,
            ..self.clone()
        })
    }

    fn encode(&self, format: ImageFormat, _quality: Option<f32>) -> Option<Bytes> {
        self.formats
            .contains(&format)
            .then(|| Bytes::from(format.extension().as_bytes().to_vec()))
    }
}

struct FakeCompositor {
    raster: Option<FakeRaster>,
    calls: Mutex<Vec<RenderOptions>>,
    /// Image sources as seen at render time.
    seen_sources: Mutex<Vec<String>>,
}

impl FakeCompositor {
    fn rendering(width: u32, height: u32, formats: Vec<ImageFormat>) -> Arc<Self> {
        Arc::new(Self {
            raster: Some(FakeRaster {
                width,
                height,
                formats,
            }),
            calls: Mutex::new(Vec::new()),
            seen_sources: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            raster: None,
            calls: Mutex::new(Vec::new()),
            seen_sources: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Compositor for FakeCompositor {
    async fn render(
        &self,
        target: &dyn ExportTarget,
        options: &RenderOptions,
    ) -> logfolio_capture::Result<Box<dyn Raster>> {
        self.calls.lock().push(options.clone());
        *self.seen_sources.lock() = target.images().iter().map(|i| i.src()).collect();
        match &self.raster {
            Some(raster) => Ok(Box::new(raster.clone())),
            None => Err(CaptureError::Render("canvas unavailable".into())),
        }
    }
}

#[derive(Default)]
struct RecordingDownloader {
    saved: Mutex<HashMap<String, (String, Bytes)>>,
}

#[async_trait]
impl Downloader for RecordingDownloader {
    async fn save(&self, filename: &str, mime: &str, data: Bytes) -> logfolio_capture::Result<String> {
        self.saved
            .lock()
            .insert(filename.to_string(), (mime.to_string(), data));
        Ok(format!("memory://{}", filename))
    }
}

struct Harness {
    pipeline: ExportPipeline,
    blobs: Arc<MemoryBlobStore>,
    fetcher: Arc<FakeFetcher>,
    compositor: Arc<FakeCompositor>,
    downloader: Arc<RecordingDownloader>,
    notices: Arc<Mutex<Vec<Notice>>>,
}

fn harness(fetcher: FakeFetcher, compositor: Arc<FakeCompositor>) -> Harness {
    let blobs = Arc::new(MemoryBlobStore::new());
    let fetcher = Arc::new(fetcher);
    let downloader = Arc::new(RecordingDownloader::default());
    let notices = Arc::new(Mutex::new(Vec::new()));
    let sink = notices.clone();
    let notifier: SharedNotifier = Arc::new(move |n: Notice| sink.lock().push(n));

    let pipeline = ExportPipeline::new(
        fetcher.clone(),
        blobs.clone(),
        compositor.clone(),
        downloader.clone(),
    )
    .with_notifier(notifier);

    Harness {
        pipeline,
        blobs,
        fetcher,
        compositor,
        downloader,
        notices,
    }
}

fn webp_and_png() -> Vec<ImageFormat> {
    vec![ImageFormat::Webp, ImageFormat::Png]
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_empty_wall_is_refused_before_capture() {
    let h = harness(
        FakeFetcher::default(),
        FakeCompositor::rendering(800, 600, webp_and_png()),
    );
    let target = FakeTarget {
        cells: 0,
        images: vec![],
    };

    let err = h.pipeline.export_composite(&target).await.unwrap_err();
    assert!(matches!(err, CaptureError::NothingToExport));
    assert!(h.compositor.calls.lock().is_empty());

    let notices = h.notices.lock();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
}

#[tokio::test]
async fn test_cross_origin_images_are_swapped_then_restored() {
    let h = harness(
        FakeFetcher::default(),
        FakeCompositor::rendering(800, 600, webp_and_png()),
    );
    let remote = FakeImage::new("https://cdn.example.net/covers/1.jpg");
    let local = FakeImage::new("/api/uploads/2.jpg");
    let inline = FakeImage::new("data:image/png;base64,AAAA");
    let target = FakeTarget {
        cells: 3,
        images: vec![remote.clone(), local.clone(), inline.clone()],
    };

    let receipt = h.pipeline.export_composite(&target).await.unwrap();

    // During render the remote image pointed at a blob URL.
    let seen = h.compositor.seen_sources.lock().clone();
    assert!(seen[0].starts_with("blob:"));
    assert_eq!(seen[1], "/api/uploads/2.jpg");

    let calls = h.compositor.calls.lock();
    assert_eq!(calls[0].scale, 2.0);
    assert_eq!(calls[0].background, "#0f0f1a");
    assert_eq!(calls[0].substitutions.len(), 1);
    assert_eq!(
        calls[0].substitutions[0].original,
        "https://cdn.example.net/covers/1.jpg"
    );

    // Afterwards everything is back and no blob URL is alive.
    assert_eq!(remote.src(), "https://cdn.example.net/covers/1.jpg");
    assert!(h.blobs.is_empty());
    assert_eq!(h.fetcher.fetched.lock().len(), 1);

    assert_eq!(receipt.format, ImageFormat::Webp);
    assert_eq!(receipt.normalized_images, 1);
    assert!(receipt.filename.starts_with("achievement-wall-"));
    assert!(receipt.filename.ends_with(".webp"));
    assert_eq!(receipt.filename.len(), "achievement-wall-2026-01-01.webp".len());
    assert!(h.downloader.saved.lock().contains_key(&receipt.filename));

    let levels: Vec<NoticeLevel> = h.notices.lock().iter().map(|n| n.level).collect();
    assert_eq!(levels, vec![NoticeLevel::Info, NoticeLevel::Success]);
}

#[tokio::test]
async fn test_fetch_failure_proceeds_without_normalization() {
    let h = harness(
        FakeFetcher {
            failing_hosts: vec!["cdn.example.net".into()],
            ..Default::default()
        },
        FakeCompositor::rendering(800, 600, webp_and_png()),
    );
    let remote = FakeImage::new("https://cdn.example.net/covers/1.jpg");
    let target = FakeTarget {
        cells: 1,
        images: vec![remote.clone()],
    };

    let receipt = h.pipeline.export_composite(&target).await.unwrap();
    assert_eq!(receipt.normalized_images, 0);
    assert_eq!(
        h.compositor.seen_sources.lock()[0],
        "https://cdn.example.net/covers/1.jpg"
    );
    assert!(h.compositor.calls.lock()[0].substitutions.is_empty());
}

#[tokio::test]
async fn test_render_failure_still_restores_sources() {
    let h = harness(FakeFetcher::default(), FakeCompositor::failing());
    let remote = FakeImage::new("https://cdn.example.net/covers/9.jpg");
    let target = FakeTarget {
        cells: 1,
        images: vec![remote.clone()],
    };

    let err = h.pipeline.export_composite(&target).await.unwrap_err();
    assert!(matches!(err, CaptureError::Render(_)));
    assert_eq!(remote.src(), "https://cdn.example.net/covers/9.jpg");
    assert!(h.blobs.is_empty());
    assert!(h.downloader.saved.lock().is_empty());

    let last = h.notices.lock().last().cloned().unwrap();
    assert_eq!(last.level, NoticeLevel::Error);
}

#[tokio::test]
async fn test_tall_raster_is_capped() {
    let h = harness(
        FakeFetcher::default(),
        FakeCompositor::rendering(1000, 40_000, webp_and_png()),
    );
    let target = FakeTarget {
        cells: 200,
        images: vec![],
    };

    let receipt = h.pipeline.export_composite(&target).await.unwrap();
    assert_eq!((receipt.width, receipt.height), (410, 16_384));
}

#[tokio::test]
async fn test_falls_back_to_png_when_webp_unsupported() {
    let h = harness(
        FakeFetcher::default(),
        FakeCompositor::rendering(800, 600, vec![ImageFormat::Png]),
    );
    let target = FakeTarget {
        cells: 1,
        images: vec![],
    };

    let receipt = h.pipeline.export_composite(&target).await.unwrap();
    assert_eq!(receipt.format, ImageFormat::Png);
    assert!(receipt.filename.ends_with(".png"));
    let saved = h.downloader.saved.lock();
    assert_eq!(saved[&receipt.filename].0, "image/png");
}

#[tokio::test]
async fn test_no_encoding_is_an_error() {
    let h = harness(
        FakeFetcher::default(),
        FakeCompositor::rendering(800, 600, vec![]),
    );
    let target = FakeTarget {
        cells: 1,
        images: vec![],
    };

    let err = h.pipeline.export_composite(&target).await.unwrap_err();
    assert!(matches!(err, CaptureError::Encode));
}

#[tokio::test(start_paused = true)]
async fn test_stuck_image_is_bounded_by_timeout() {
    let h = harness(
        FakeFetcher::default(),
        FakeCompositor::rendering(800, 600, webp_and_png()),
    );
    let pipeline = h.pipeline.with_options(ExportOptions {
        image_timeout: Duration::from_millis(200),
        ..Default::default()
    });
    let target = FakeTarget {
        cells: 2,
        images: vec![
            FakeImage::stuck("/api/uploads/slow.jpg"),
            FakeImage::new("/api/uploads/fast.jpg"),
        ],
    };

    let started = tokio::time::Instant::now();
    pipeline.export_composite(&target).await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert_eq!(h.compositor.calls.lock().len(), 1);
}

#[test]
fn test_dropping_job_releases_blobs() {
    let blobs = Arc::new(MemoryBlobStore::new());
    let image = FakeImage::new("https://cdn.example.net/a.jpg");
    let job = ExportJob::new(vec![image.clone() as Arc<dyn CaptureImage>], blobs.clone());

    let blob_url = blobs.create(Blob {
        data: Bytes::from_static(b"x"),
        content_type: None,
    });
    job.record_blob(0, blob_url.clone());
    image.set_src(&blob_url);
    assert_eq!(job.substitutions().len(), 1);

    drop(job);
    assert_eq!(image.src(), "https://cdn.example.net/a.jpg");
    assert!(blobs.is_empty());
}
