//! Capture error types.

use logfolio_types::ErrorKind;
use thiserror::Error;

/// Export pipeline error type.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The target has no cells; capture was not started.
    #[error("Nothing to export")]
    NothingToExport,

    /// The compositor failed to produce a raster.
    #[error("Render failed: {0}")]
    Render(String),

    /// No output format produced data.
    #[error("Encoding failed: no supported output format")]
    Encode,

    /// Writing the file failed.
    #[error("Download failed: {0}")]
    Download(String),
}

impl CaptureError {
    /// Machine-readable classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CaptureError::NothingToExport => ErrorKind::Validation,
            CaptureError::Render(_) | CaptureError::Encode => ErrorKind::Internal,
            CaptureError::Download(_) => ErrorKind::Internal,
        }
    }
}

/// Failure to fetch a single image. Never fatal to an export.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {0}")]
    Status(u16),

    #[error("{0}")]
    Transport(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(err.to_string())
    }
}

/// Result type for capture operations.
pub type Result<T> = std::result::Result<T, CaptureError>;
