//! Achievement wall export.
//!
//! [`ExportPipeline::export_composite`] captures an [`ExportTarget`] into a
//! single image file:
//!
//! 1. refuse an empty target,
//! 2. normalize images concurrently (cross-origin sources become blob URLs),
//! 3. render through the [`Compositor`],
//! 4. cap the height, encode (WebP, then PNG),
//! 5. hand the file to the [`Downloader`],
//! 6. restore every swapped image source and revoke blob URLs.
//!
//! [`GridCompositor`] and [`ImageRaster`] are a software implementation of
//! the host traits for use outside a browser.

pub mod download;
pub mod error;
pub mod fetch;
pub mod job;
pub mod normalize;
pub mod pipeline;
pub mod raster;
pub mod surface;

pub use download::{Downloader, FileDownloader};
pub use error::{CaptureError, FetchError, Result};
pub use fetch::{Blob, BlobStore, ImageFetcher, MemoryBlobStore, ReqwestImageFetcher};
pub use job::ExportJob;
pub use normalize::{classify, normalize_images, SourceKind};
pub use pipeline::{
    export_filename, fit_within_ceiling, ExportOptions, ExportPipeline, ExportReceipt,
    DEFAULT_MAX_HEIGHT, ENCODE_PRIORITY,
};
pub use raster::{parse_colour, GridCompositor, GridLayout, ImageRaster};
pub use surface::{
    CaptureImage, Compositor, ExportTarget, ImageFormat, Raster, RenderOptions, Substitution,
};
