//! Configuration system for the Logfolio client.
//!
//! Provides TOML-based configuration with:
//! - Server connection settings (`[server]`)
//! - Response and category cache lifetimes (`[cache]`)
//! - Transport retry policy (`[retry]`)
//! - Search paging and export pipeline tuning (`[search]`, `[export]`)
//! - Config file layering (user config + project-local overrides)

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, SourceStatus, load_config, load_config_file, load_config_with_options, save_config,
    user_config_dir, user_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
