//! Host capabilities the pipeline drives.
//!
//! The pipeline never touches a document or canvas directly. A host (browser
//! bridge, headless renderer, test fake) implements these traits.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::error::Result;

/// An image element inside the export target.
#[async_trait]
pub trait CaptureImage: Send + Sync {
    /// Current source, as written in the markup (may be relative).
    fn src(&self) -> String;

    /// Point the image at a new source.
    fn set_src(&self, src: &str);

    /// Resolve once the current source has loaded or failed to load.
    async fn wait_loaded(&self);
}

/// The region to capture.
pub trait ExportTarget: Send + Sync {
    /// Origin of the page hosting the target. `None` when there is no page,
    /// in which case every absolute `http(s)` source is cross-origin.
    fn origin(&self) -> Option<Url>;

    /// Number of exportable cells.
    fn cell_count(&self) -> usize;

    /// Images inside the cells, in document order.
    fn images(&self) -> Vec<Arc<dyn CaptureImage>>;
}

/// Output encodings, in no particular order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Webp,
    Png,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Webp => "webp",
            ImageFormat::Png => "png",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ImageFormat::Webp => "image/webp",
            ImageFormat::Png => "image/png",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A rendered bitmap.
pub trait Raster: Send + Sync {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Redraw into a new raster of the given size.
    fn resize(&self, width: u32, height: u32) -> Box<dyn Raster>;

    /// Encode, or `None` if the format is unsupported.
    fn encode(&self, format: ImageFormat, quality: Option<f32>) -> Option<Bytes>;
}

/// Source swap applied to the captured clone only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub original: String,
    pub replacement: String,
}

/// Parameters handed to the compositor.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Supersampling factor.
    pub scale: f32,
    /// Colour painted behind the capture.
    pub background: String,
    /// Selectors of decorative chrome to hide in the clone.
    pub suppress: Vec<String>,
    /// Normalized sources for the clone, in image order.
    pub substitutions: Vec<Substitution>,
}

/// Renders a target to a raster.
#[async_trait]
pub trait Compositor: Send + Sync {
    async fn render(&self, target: &dyn ExportTarget, options: &RenderOptions)
        -> Result<Box<dyn Raster>>;
}
