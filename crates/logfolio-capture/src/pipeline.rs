//! The export pipeline: normalize, render, cap, encode, download.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use logfolio_config::ExportConfig;
use logfolio_types::{notify, Notice, SharedNotifier};

use crate::download::Downloader;
use crate::error::{CaptureError, Result};
use crate::fetch::{BlobStore, ImageFetcher};
use crate::job::ExportJob;
use crate::normalize::normalize_images;
use crate::surface::{Compositor, ExportTarget, ImageFormat, Raster, RenderOptions};

/// Default output height ceiling, in pixels.
pub const DEFAULT_MAX_HEIGHT: u32 = 16_384;

/// Encodings tried in order; the first that yields data wins.
pub const ENCODE_PRIORITY: [(ImageFormat, Option<f32>); 2] =
    [(ImageFormat::Webp, Some(0.85)), (ImageFormat::Png, None)];

/// Selectors hidden in the captured clone.
pub const DEFAULT_SUPPRESSED_CHROME: [&str; 3] =
    [".wall-export-btn", ".wall-tabs", ".wall-fullscreen"];

/// Pipeline tuning.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub scale: f32,
    pub max_height: u32,
    /// Bound on each image fetch and load during normalization.
    pub image_timeout: Duration,
    pub filename_prefix: String,
    pub background: String,
    pub suppress: Vec<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            scale: 2.0,
            max_height: DEFAULT_MAX_HEIGHT,
            image_timeout: Duration::from_secs(15),
            filename_prefix: "achievement-wall".to_string(),
            background: "#0f0f1a".to_string(),
            suppress: DEFAULT_SUPPRESSED_CHROME
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl From<&ExportConfig> for ExportOptions {
    fn from(config: &ExportConfig) -> Self {
        Self {
            scale: config.scale,
            max_height: config.max_height,
            image_timeout: config.image_timeout(),
            filename_prefix: config.filename_prefix.clone(),
            background: config.background.clone(),
            ..Self::default()
        }
    }
}

/// What a successful export produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReceipt {
    pub filename: String,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
    /// Where the downloader put the file.
    pub location: String,
    /// Images swapped for blob URLs during capture.
    pub normalized_images: usize,
}

/// Export pipeline with its capabilities.
pub struct ExportPipeline {
    fetcher: Arc<dyn ImageFetcher>,
    blobs: Arc<dyn BlobStore>,
    compositor: Arc<dyn Compositor>,
    downloader: Arc<dyn Downloader>,
    notifier: Option<SharedNotifier>,
    options: ExportOptions,
}

impl ExportPipeline {
    pub fn new(
        fetcher: Arc<dyn ImageFetcher>,
        blobs: Arc<dyn BlobStore>,
        compositor: Arc<dyn Compositor>,
        downloader: Arc<dyn Downloader>,
    ) -> Self {
        Self {
            fetcher,
            blobs,
            compositor,
            downloader,
            notifier: None,
            options: ExportOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_notifier(mut self, notifier: SharedNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Capture `target` and download it as a single image.
    ///
    /// Image sources swapped during capture are restored on every path
    /// before this returns.
    pub async fn export_composite(&self, target: &dyn ExportTarget) -> Result<ExportReceipt> {
        if target.cell_count() == 0 {
            let err = CaptureError::NothingToExport;
            notify(
                self.notifier.as_ref(),
                Notice::error(err.kind(), "There is nothing to export"),
            );
            return Err(err);
        }

        notify(self.notifier.as_ref(), Notice::info("Generating image..."));

        let job = ExportJob::new(target.images(), self.blobs.clone());
        tracing::info!(cells = target.cell_count(), images = job.len(), "export started");

        let result = self.run(target, &job).await;
        job.release();

        match &result {
            Ok(receipt) => {
                tracing::info!(
                    filename = %receipt.filename,
                    width = receipt.width,
                    height = receipt.height,
                    "export saved"
                );
                notify(
                    self.notifier.as_ref(),
                    Notice::success(format!("Image saved: {}", receipt.filename)),
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "export failed");
                notify(
                    self.notifier.as_ref(),
                    Notice::error(e.kind(), format!("Export failed: {}", e)),
                );
            }
        }
        result
    }

    async fn run(&self, target: &dyn ExportTarget, job: &ExportJob) -> Result<ExportReceipt> {
        let origin = target.origin();
        normalize_images(
            job,
            origin.as_ref(),
            self.fetcher.as_ref(),
            self.blobs.as_ref(),
            self.options.image_timeout,
        )
        .await;

        let render_options = RenderOptions {
            scale: self.options.scale,
            background: self.options.background.clone(),
            suppress: self.options.suppress.clone(),
            substitutions: job.substitutions(),
        };
        let raster = self.compositor.render(target, &render_options).await?;
        let raster = cap_height(raster, self.options.max_height);

        let (format, data) = encode_first(raster.as_ref()).ok_or(CaptureError::Encode)?;
        let filename = export_filename(
            &self.options.filename_prefix,
            chrono::Utc::now().date_naive(),
            format,
        );
        let bytes = data.len();
        let location = self.downloader.save(&filename, format.mime(), data).await?;

        Ok(ExportReceipt {
            filename,
            format,
            width: raster.width(),
            height: raster.height(),
            bytes,
            location,
            normalized_images: job.normalized(),
        })
    }
}

/// Scale `(width, height)` down so the height does not exceed `max_height`.
pub fn fit_within_ceiling(width: u32, height: u32, max_height: u32) -> (u32, u32) {
    if height <= max_height {
        return (width, height);
    }
    let scaled = (f64::from(width) * f64::from(max_height) / f64::from(height)).round() as u32;
    (scaled.max(1), max_height)
}

fn cap_height(raster: Box<dyn Raster>, max_height: u32) -> Box<dyn Raster> {
    let (width, height) = fit_within_ceiling(raster.width(), raster.height(), max_height);
    if (width, height) == (raster.width(), raster.height()) {
        return raster;
    }
    tracing::debug!(
        from_height = raster.height(),
        to_width = width,
        to_height = height,
        "raster exceeds height ceiling, redrawing"
    );
    raster.resize(width, height)
}

fn encode_first(raster: &dyn Raster) -> Option<(ImageFormat, bytes::Bytes)> {
    ENCODE_PRIORITY.iter().find_map(|&(format, quality)| {
        match raster.encode(format, quality) {
            Some(data) if !data.is_empty() => Some((format, data)),
            _ => {
                tracing::debug!(format = %format, "encoding unavailable, trying next format");
                None
            }
        }
    })
}

/// `<prefix>-<YYYY-MM-DD>.<ext>`
pub fn export_filename(prefix: &str, date: NaiveDate, format: ImageFormat) -> String {
    format!(
        "{}-{}.{}",
        prefix,
        date.format("%Y-%m-%d"),
        format.extension()
    )
}
