//! Wall command - the achievement wall, listed or exported as an image.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use clap::Args;
use console::{Style, style};
use logfolio_capture::{
    CaptureImage, ExportOptions, ExportPipeline, ExportTarget, FileDownloader, GridCompositor,
    ImageFetcher, MemoryBlobStore, ReqwestImageFetcher,
};
use logfolio_client::{AchievementWall, WallItem};
use logfolio_config::ExportConfig;
use parking_lot::Mutex;
use url::Url;

use super::{console_notifier, print_header, print_json, truncate, Context};

/// Arguments for the wall command.
#[derive(Args, Debug)]
pub struct WallArgs {
    /// Only this category
    #[arg(short, long)]
    pub category: Option<i64>,

    /// Render the wall into a single image file
    #[arg(long)]
    pub export: bool,

    /// Directory for the exported image (default: [export].output_dir)
    #[arg(short, long, requires = "export")]
    pub out: Option<PathBuf>,
}

/// Run the wall command.
pub async fn run(args: WallArgs, ctx: &Context) -> Result<()> {
    let wall = ctx.client.items().achievement_wall(args.category).await?;
    if args.export {
        return export(&wall, args.out, ctx).await;
    }
    if ctx.json_output {
        return print_json(&wall);
    }

    let dim = Style::new().dim();
    print_header(&format!("Achievement wall - {} completed", wall.total));
    if wall.items.is_empty() {
        println!("{}", dim.apply_to("Nothing completed yet"));
        return Ok(());
    }

    for item in &wall.items {
        println!(
            "{:<10} {} {}",
            item.date.as_deref().unwrap_or(""),
            style(truncate(&item.title, 48)).bold(),
            dim.apply_to(item.category.as_deref().unwrap_or(""))
        );
        if ctx.verbose {
            if let Some(image) = cover_source(item) {
                println!("{:<10} {}", "", dim.apply_to(image));
            }
        }
    }
    Ok(())
}

async fn export(wall: &AchievementWall, out: Option<PathBuf>, ctx: &Context) -> Result<()> {
    let downloader = match out {
        Some(dir) => FileDownloader::new(dir),
        None => FileDownloader::from_config(&ctx.export),
    };
    let pipeline = export_pipeline(&ctx.export, downloader)?.with_notifier(console_notifier());
    let target = WallTarget::new(wall, Url::parse(&ctx.server_url).ok());

    let receipt = pipeline.export_composite(&target).await?;
    if ctx.json_output {
        return print_json(&serde_json::json!({
            "path": receipt.location,
            "format": receipt.format.extension(),
            "width": receipt.width,
            "height": receipt.height,
            "bytes": receipt.bytes,
        }));
    }
    println!(
        "{}",
        Style::new().dim().apply_to(format!(
            "{} ({}x{}, {} bytes)",
            receipt.location, receipt.width, receipt.height, receipt.bytes
        ))
    );
    Ok(())
}

/// Software export pipeline writing through `downloader`.
fn export_pipeline(config: &ExportConfig, downloader: FileDownloader) -> Result<ExportPipeline> {
    let options = ExportOptions::from(config);
    let blobs = Arc::new(MemoryBlobStore::new());
    let fetcher: Arc<dyn ImageFetcher> = Arc::new(ReqwestImageFetcher::new(options.image_timeout)?);
    let compositor = GridCompositor::new(blobs.clone(), fetcher.clone());

    Ok(
        ExportPipeline::new(fetcher, blobs, Arc::new(compositor), Arc::new(downloader))
            .with_options(options),
    )
}

/// WebP rendition first.
fn cover_source(item: &WallItem) -> Option<&str> {
    item.image_webp.as_deref().or(item.image.as_deref())
}

// ─────────────────────────────────────────────────────────────────────────────
// Export target
// ─────────────────────────────────────────────────────────────────────────────

/// One cell per wall item. Items without a cover keep an empty source.
struct WallTarget {
    origin: Option<Url>,
    covers: Vec<Arc<WallCover>>,
}

impl WallTarget {
    fn new(wall: &AchievementWall, origin: Option<Url>) -> Self {
        let covers = wall
            .items
            .iter()
            .map(|item| {
                Arc::new(WallCover {
                    src: Mutex::new(cover_source(item).unwrap_or_default().to_string()),
                })
            })
            .collect();
        Self { origin, covers }
    }
}

impl ExportTarget for WallTarget {
    fn origin(&self) -> Option<Url> {
        self.origin.clone()
    }

    fn cell_count(&self) -> usize {
        self.covers.len()
    }

    fn images(&self) -> Vec<Arc<dyn CaptureImage>> {
        self.covers
            .iter()
            .map(|c| c.clone() as Arc<dyn CaptureImage>)
            .collect()
    }
}

/// Nothing is decoded until the compositor reads the source, so loading
/// completes immediately.
struct WallCover {
    src: Mutex<String>,
}

#[async_trait]
impl CaptureImage for WallCover {
    fn src(&self) -> String {
        self.src.lock().clone()
    }

    fn set_src(&self, src: &str) {
        *self.src.lock() = src.to_string();
    }

    async fn wait_loaded(&self) {}
}
