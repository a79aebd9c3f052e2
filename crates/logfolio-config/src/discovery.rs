//! Finding and layering config files.
//!
//! Layers, lowest precedence first:
//! 1. `$LOGFOLIO_CONFIG_DIR/config.toml`, else `<platform config dir>/logfolio/config.toml`
//! 2. `logfolio.toml` in the project directory (the working directory by default)
//! 3. command line flags, applied by the binary
//!
//! A later layer replaces earlier ones one section at a time.

use std::path::{Path, PathBuf};

use crate::{ConfigError, LogfolioConfig, Result};

const USER_CONFIG_FILE: &str = "config.toml";
const PROJECT_CONFIG_FILE: &str = "logfolio.toml";
const APP_DIR: &str = "logfolio";
const CONFIG_DIR_ENV: &str = "LOGFOLIO_CONFIG_DIR";

/// What happened to one candidate layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    Loaded,
    /// No file at the path.
    Missing,
    /// Present but unreadable or invalid; see [`LoadedConfig::warnings`].
    Skipped,
}

/// One candidate layer.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub path: PathBuf,
    pub status: SourceStatus,
}

/// Merged configuration plus how it was assembled.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: LogfolioConfig,
    /// Candidates in precedence order, lowest first.
    pub sources: Vec<ConfigSource>,
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Paths of the layers that contributed.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.status == SourceStatus::Loaded)
            .map(|s| s.path.as_path())
            .collect()
    }
}

/// Discover and merge the user and project layers.
///
/// `project_dir` defaults to the working directory.
pub fn load_config(project_dir: Option<&Path>) -> Result<LoadedConfig> {
    load_config_with_options(project_dir, None)
}

/// Like [`load_config`], with the user config directory given explicitly.
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
) -> Result<LoadedConfig> {
    let user_file = match config_dir {
        Some(dir) => Some(dir.join(USER_CONFIG_FILE)),
        None => user_config_path(),
    };
    let project_file = project_dir
        .unwrap_or_else(|| Path::new("."))
        .join(PROJECT_CONFIG_FILE);

    let mut loaded = LoadedConfig {
        config: LogfolioConfig::new(),
        sources: Vec::new(),
        warnings: Vec::new(),
    };
    for path in user_file.into_iter().chain([project_file]) {
        let status = match read_layer(&path) {
            Ok(None) => SourceStatus::Missing,
            Ok(Some(layer)) => {
                loaded.config.merge(layer);
                tracing::debug!(path = %path.display(), "config layer loaded");
                SourceStatus::Loaded
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "config layer skipped");
                loaded.warnings.push(format!("{}: {}", path.display(), e));
                SourceStatus::Skipped
            }
        };
        loaded.sources.push(ConfigSource { path, status });
    }

    Ok(loaded)
}

/// Parse one file, without discovery or merging.
pub fn load_config_file(path: &Path) -> Result<LogfolioConfig> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    LogfolioConfig::from_toml(&text)
}

/// Write `config` to `path`, creating parent directories.
pub fn save_config(config: &LogfolioConfig, path: &Path) -> Result<()> {
    let write_error = |path: &Path, source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| write_error(parent, e))?;
    }
    std::fs::write(path, config.to_toml()?).map_err(|e| write_error(path, e))
}

/// `config.toml` inside [`user_config_dir`].
pub fn user_config_path() -> Option<PathBuf> {
    Some(user_config_dir()?.join(USER_CONFIG_FILE))
}

/// `$LOGFOLIO_CONFIG_DIR` when set and non-empty, else the platform config
/// directory joined with `logfolio`.
pub fn user_config_dir() -> Option<PathBuf> {
    match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::config_dir().map(|d| d.join(APP_DIR)),
    }
}

/// `Ok(None)` when there is no file at `path`.
fn read_layer(path: &Path) -> Result<Option<LogfolioConfig>> {
    if !path.is_file() {
        return Ok(None);
    }
    load_config_file(path).map(Some)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_read_error() {
        let err = load_config_file(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is not valid toml {{{{").unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_no_layers_gives_defaults() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        let loaded = load_config_with_options(Some(project.path()), Some(user.path())).unwrap();

        assert!(loaded.config.server.is_none());
        assert!(loaded.loaded_from().is_empty());
        assert_eq!(loaded.config.server().api_path, "/api");
        assert!(loaded
            .sources
            .iter()
            .all(|s| s.status == SourceStatus::Missing));
    }

    #[test]
    fn test_project_layer_replaces_user_sections() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();

        fs::write(
            user.path().join("config.toml"),
            r#"
[server]
base_url = "http://home.lan:8000"

[cache]
response_ttl_secs = 60
"#,
        )
        .unwrap();

        fs::write(
            project.path().join("logfolio.toml"),
            r#"
[server]
base_url = "http://localhost:9000"
"#,
        )
        .unwrap();

        let loaded = load_config_with_options(Some(project.path()), Some(user.path())).unwrap();

        assert_eq!(loaded.config.server().base_url, "http://localhost:9000");
        assert_eq!(loaded.config.cache().response_ttl_secs, 60);
        assert_eq!(loaded.loaded_from().len(), 2);
    }

    #[test]
    fn test_invalid_layer_becomes_warning() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::write(project.path().join("logfolio.toml"), "[server\n").unwrap();

        let loaded = load_config_with_options(Some(project.path()), Some(user.path())).unwrap();

        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].contains("logfolio.toml"));
        assert!(loaded.loaded_from().is_empty());
        assert_eq!(loaded.sources[1].status, SourceStatus::Skipped);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = LogfolioConfig::new();
        config.retry = Some(crate::RetryConfig {
            max_retries: 4,
            backoff_ms: 100,
        });
        save_config(&config, &path).unwrap();

        let loaded = load_config_file(&path).unwrap();
        assert_eq!(loaded.retry().max_retries, 4);
        assert_eq!(loaded.retry().backoff_ms, 100);
    }
}
