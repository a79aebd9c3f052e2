//! Delivering the encoded image.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use logfolio_config::ExportConfig;

use crate::error::{CaptureError, Result};

/// Hands the finished file to the user.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Save `data` under `filename`. Returns where it ended up.
    async fn save(&self, filename: &str, mime: &str, data: Bytes) -> Result<String>;
}

/// Writes downloads into a directory.
#[derive(Debug, Clone)]
pub struct FileDownloader {
    dir: PathBuf,
}

impl FileDownloader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Downloader for `[export].output_dir`, falling back to the current
    /// directory.
    pub fn from_config(config: &ExportConfig) -> Self {
        Self::new(
            config
                .output_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(".")),
        )
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }
}

#[async_trait]
impl Downloader for FileDownloader {
    async fn save(&self, filename: &str, mime: &str, data: Bytes) -> Result<String> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CaptureError::Download(format!("{}: {}", self.dir.display(), e)))?;

        let path = self.dir.join(filename);
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| CaptureError::Download(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(path = %path.display(), mime, bytes = data.len(), "export written");
        Ok(path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_downloader_creates_dir_and_writes() {
        let dir = TempDir::new().unwrap();
        let downloader = FileDownloader::new(dir.path().join("exports"));

        let location = downloader
            .save("wall.png", "image/png", Bytes::from_static(b"png"))
            .await
            .unwrap();

        assert!(location.ends_with("wall.png"));
        let written = std::fs::read(dir.path().join("exports").join("wall.png")).unwrap();
        assert_eq!(written, b"png");
    }

    #[test]
    fn test_from_config_output_dir() {
        let config = ExportConfig {
            output_dir: Some(PathBuf::from("/tmp/walls")),
            ..ExportConfig::default()
        };
        assert_eq!(
            FileDownloader::from_config(&config).dir(),
            std::path::Path::new("/tmp/walls")
        );
        assert_eq!(
            FileDownloader::from_config(&ExportConfig::default()).dir(),
            std::path::Path::new(".")
        );
    }
}
