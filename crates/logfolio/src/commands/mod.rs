//! CLI command handlers.

pub mod categories;
pub mod items;
pub mod search;
pub mod wall;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use console::Style;
use logfolio_client::{ClientBuilder, LogfolioClient, SearchFilters, SearchKind};
use logfolio_config::{ExportConfig, LogfolioConfig, SearchConfig};
use logfolio_types::{Notice, NoticeLevel, SharedNotifier};
use serde::Serialize;

/// Shared context for all commands.
#[derive(Clone)]
pub struct Context {
    /// Client configured from the loaded config and global flags.
    pub client: LogfolioClient,
    /// Server the client talks to; image paths are relative to it.
    pub server_url: String,
    /// Effective `[export]` settings.
    pub export: ExportConfig,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    pub fn new(
        config: &LogfolioConfig,
        server: Option<String>,
        json_output: bool,
        verbose: bool,
    ) -> Result<Self> {
        let client = client_builder(config, server.as_deref())?
            .notifier(console_notifier())
            .build()
            .context("invalid client configuration")?;
        Ok(Self {
            client,
            server_url: server.unwrap_or_else(|| config.server().base_url),
            export: config.export(),
            json_output,
            verbose,
        })
    }
}

/// Map the loaded configuration onto a client builder. `server` wins over
/// `[server].base_url`.
pub fn client_builder(config: &LogfolioConfig, server: Option<&str>) -> Result<ClientBuilder> {
    let server_config = config.server();
    let cache = config.cache();
    let retry = config.retry();
    let search = config.search();

    Ok(LogfolioClient::builder()
        .base_url(server.unwrap_or(&server_config.base_url))
        .api_path(server_config.api_path.clone())
        .timeout(server_config.timeout())
        .response_ttl(cache.response_ttl())
        .categories_ttl(cache.categories_ttl())
        .retry(retry.max_retries, retry.backoff())
        .search_filters(search_filters(&search)?)
        .scroll_threshold(search.scroll_threshold))
}

/// Default search filters from `[search]`.
pub fn search_filters(config: &SearchConfig) -> Result<SearchFilters> {
    let kind: SearchKind = config
        .default_type
        .parse()
        .context("invalid [search].default_type")?;
    Ok(SearchFilters {
        kind,
        source: config.source.clone(),
    })
}

/// Notices go to stderr so `--json` output stays clean.
pub(crate) fn console_notifier() -> SharedNotifier {
    Arc::new(|notice: Notice| {
        let style = match notice.level {
            NoticeLevel::Info => Style::new().dim(),
            NoticeLevel::Success => Style::new().green(),
            NoticeLevel::Error => Style::new().red(),
        };
        eprintln!("{}", style.apply_to(notice.message));
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Output helpers
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn print_header(title: &str) {
    println!("{}", console::style(title).bold());
    println!("{}", Style::new().dim().apply_to("─".repeat(50)));
}

pub(crate) fn print_done(message: impl std::fmt::Display) {
    println!("{} {}", Style::new().green().apply_to("✓"), message);
}

pub(crate) fn truncate(s: &str, max_chars: usize) -> String {
    let s = s.replace('\n', " ");
    if s.chars().count() <= max_chars {
        s
    } else {
        let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_filters_from_config() {
        let config = SearchConfig {
            default_type: "Manga".to_string(),
            source: "jikan".to_string(),
            ..SearchConfig::default()
        };
        let filters = search_filters(&config).unwrap();
        assert_eq!(filters.kind, SearchKind::Manga);
        assert_eq!(filters.source, "jikan");
    }

    #[test]
    fn test_unknown_search_type_is_rejected() {
        let config = SearchConfig {
            default_type: "podcast".to_string(),
            ..SearchConfig::default()
        };
        assert!(search_filters(&config).is_err());
    }

    #[test]
    fn test_builder_accepts_server_override() {
        let config = LogfolioConfig::from_toml(
            r#"
[server]
base_url = "http://config.example:8000"
"#,
        )
        .unwrap();
        assert!(client_builder(&config, Some("http://flag.example:9000")).unwrap().build().is_ok());
        assert!(client_builder(&config, None).unwrap().build().is_ok());
    }

    #[test]
    fn test_zero_timeout_fails_to_build() {
        let config = LogfolioConfig::from_toml(
            r#"
[server]
timeout_secs = 0
"#,
        )
        .unwrap();
        assert!(client_builder(&config, None).unwrap().build().is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a\nb", 10), "a b");
        assert_eq!(truncate("葬送のフリーレン第二期", 6), "葬送の...");
    }
}
