//! Software rendering with the `image` crate.
//!
//! [`ImageRaster`] is an RGBA bitmap. [`GridCompositor`] lays the cells of a
//! target out as a grid of cover tiles, reading swapped sources from the blob
//! store and everything else through an [`ImageFetcher`].

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use url::Url;

use crate::error::{CaptureError, Result};
use crate::fetch::{ImageFetcher, MemoryBlobStore};
use crate::surface::{Compositor, ExportTarget, ImageFormat, Raster, RenderOptions};

/// Colour used when the configured background does not parse.
const FALLBACK_BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// An in-memory RGBA bitmap.
#[derive(Debug, Clone)]
pub struct ImageRaster {
    pixels: RgbaImage,
}

impl ImageRaster {
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    /// A `width` x `height` bitmap filled with `colour`.
    pub fn filled(width: u32, height: u32, colour: Rgba<u8>) -> Self {
        Self::new(RgbaImage::from_pixel(width, height, colour))
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

impl Raster for ImageRaster {
    fn width(&self) -> u32 {
        self.pixels.width()
    }

    fn height(&self) -> u32 {
        self.pixels.height()
    }

    fn resize(&self, width: u32, height: u32) -> Box<dyn Raster> {
        let pixels = imageops::resize(&self.pixels, width.max(1), height.max(1), FilterType::Triangle);
        Box::new(ImageRaster::new(pixels))
    }

    /// WebP output is lossless, so `quality` is ignored.
    fn encode(&self, format: ImageFormat, _quality: Option<f32>) -> Option<Bytes> {
        let mut out = Cursor::new(Vec::new());
        let (width, height) = self.pixels.dimensions();
        let raw = self.pixels.as_raw();
        let encoded = match format {
            ImageFormat::Png => {
                PngEncoder::new(&mut out).write_image(raw, width, height, ExtendedColorType::Rgba8)
            }
            ImageFormat::Webp => WebPEncoder::new_lossless(&mut out).write_image(
                raw,
                width,
                height,
                ExtendedColorType::Rgba8,
            ),
        };
        match encoded {
            Ok(()) => Some(Bytes::from(out.into_inner())),
            Err(e) => {
                tracing::debug!(format = %format, error = %e, "encoder failed");
                None
            }
        }
    }
}

/// Parse `#rgb` or `#rrggbb`.
pub fn parse_colour(value: &str) -> Option<Rgba<u8>> {
    let hex = value.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = channel(&c.to_string())?;
                rgb[i] = v * 17;
            }
            Some(Rgba([rgb[0], rgb[1], rgb[2], 255]))
        }
        6 => Some(Rgba([
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
            255,
        ])),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Grid compositor
// ─────────────────────────────────────────────────────────────────────────────

/// Tile geometry at scale 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub columns: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub gap: u32,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            columns: 6,
            tile_width: 160,
            tile_height: 240,
            gap: 8,
        }
    }
}

impl GridLayout {
    /// Pixel geometry for `cells` cells at `scale`: `(columns, tile_w, tile_h, gap)`.
    fn scaled(&self, cells: usize, scale: f32) -> (u32, u32, u32, u32) {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        let px = |v: u32| ((v as f32 * scale).round() as u32).max(1);
        let columns = self.columns.clamp(1, cells.max(1) as u32);
        (columns, px(self.tile_width), px(self.tile_height), (self.gap as f32 * scale).round() as u32)
    }
}

/// Renders one cover tile per cell; the i-th image fills the i-th cell.
///
/// Images that cannot be read or decoded leave their tile as background.
/// Chrome suppression does not apply: nothing but covers is drawn.
pub struct GridCompositor {
    blobs: Arc<MemoryBlobStore>,
    fetcher: Arc<dyn ImageFetcher>,
    layout: GridLayout,
}

impl GridCompositor {
    pub fn new(blobs: Arc<MemoryBlobStore>, fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self {
            blobs,
            fetcher,
            layout: GridLayout::default(),
        }
    }

    pub fn with_layout(mut self, layout: GridLayout) -> Self {
        self.layout = layout;
        self
    }

    async fn load(&self, src: &str, origin: Option<&Url>) -> Option<Bytes> {
        if src.trim().is_empty() || src.starts_with("data:") {
            return None;
        }
        if src.starts_with("blob:") {
            return self.blobs.get(src).map(|blob| blob.data);
        }

        let url = match origin {
            Some(origin) => origin.join(src),
            None => Url::parse(src),
        };
        let url = match url {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!(src, error = %e, "unresolvable image source");
                return None;
            }
        };
        match self.fetcher.fetch(&url).await {
            Ok(blob) => Some(blob.data),
            Err(e) => {
                tracing::debug!(src, error = %e, "image unavailable, tile left blank");
                None
            }
        }
    }
}

#[async_trait]
impl Compositor for GridCompositor {
    async fn render(
        &self,
        target: &dyn ExportTarget,
        options: &RenderOptions,
    ) -> Result<Box<dyn Raster>> {
        let cells = target.cell_count();
        if cells == 0 {
            return Err(CaptureError::Render("target has no cells".into()));
        }

        let (columns, tile_width, tile_height, gap) = self.layout.scaled(cells, options.scale);
        let rows = (cells as u32).div_ceil(columns);
        let width = columns * tile_width + (columns + 1) * gap;
        let height = rows * tile_height + (rows + 1) * gap;
        let background = parse_colour(&options.background).unwrap_or(FALLBACK_BACKGROUND);

        let mut canvas = RgbaImage::from_pixel(width, height, background);
        let origin = target.origin();
        let mut drawn = 0usize;

        for (index, image) in target.images().iter().take(cells).enumerate() {
            let src = image.src();
            let src = options
                .substitutions
                .iter()
                .find(|s| s.original == src)
                .map(|s| s.replacement.clone())
                .unwrap_or(src);

            let Some(data) = self.load(&src, origin.as_ref()).await else {
                continue;
            };
            let cover = match image::load_from_memory(&data) {
                Ok(cover) => cover,
                Err(e) => {
                    tracing::debug!(src = %src, error = %e, "undecodable image, tile left blank");
                    continue;
                }
            };
            let tile = cover
                .resize_to_fill(tile_width, tile_height, FilterType::Triangle)
                .to_rgba8();

            let column = index as u32 % columns;
            let row = index as u32 / columns;
            let x = gap + column * (tile_width + gap);
            let y = gap + row * (tile_height + gap);
            imageops::overlay(&mut canvas, &tile, i64::from(x), i64::from(y));
            drawn += 1;
        }

        tracing::debug!(cells, drawn, width, height, "grid rendered");
        Ok(Box::new(ImageRaster::new(canvas)))
    }
}
