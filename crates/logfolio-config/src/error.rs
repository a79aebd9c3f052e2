//! Configuration errors.

use std::path::PathBuf;

use logfolio_types::ErrorKind;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file or its parent directory could not be written.
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot encode config as TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Parsed, but a value is out of range.
    #[error("[{field}] {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Config
    }
}
