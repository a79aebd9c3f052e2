//! Search command - paginated cover search.
//!
//! Drives a [`SearchSession`] with a terminal view. Each further page is
//! pulled the same way a scrolling result area pulls it: by reporting a
//! scroll position at the end of what has been rendered so far.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use console::Style;
use logfolio_client::{
    PageLoad, ScrollMetrics, SearchFilters, SearchItem, SearchKind, SearchSession, SearchView,
};
use parking_lot::Mutex;

use super::{print_json, truncate, Context};

/// Height of one rendered result row, in pixels.
const ROW_HEIGHT: f64 = 24.0;
/// Visible height of the result area, in pixels.
const VIEWPORT_HEIGHT: f64 = 480.0;

/// Arguments for the search command.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search query
    pub query: String,

    /// Media type (both, anime, manga, game)
    #[arg(short = 't', long = "type")]
    pub kind: Option<SearchKind>,

    /// Upstream source
    #[arg(long)]
    pub source: Option<String>,

    /// Maximum number of pages to load
    #[arg(short, long, default_value = "1")]
    pub pages: u32,
}

/// Run the search command.
pub async fn run(args: SearchArgs, ctx: &Context) -> Result<()> {
    let defaults = ctx.client.search_filters();
    let filters = SearchFilters {
        kind: args.kind.unwrap_or(defaults.kind),
        source: args.source.unwrap_or_else(|| defaults.source.clone()),
    };

    let view = Arc::new(ConsoleView::new(!ctx.json_output));
    let session = ctx.client.search_session(view.clone());

    let results = collect_pages(&session, &view, &args.query, filters, args.pages).await?;

    if ctx.json_output {
        return print_json(&results);
    }
    if ctx.verbose {
        let state = session.state();
        println!();
        println!(
            "{}",
            Style::new().dim().apply_to(format!(
                "{} results, {} page(s), more available: {}",
                view.rows(),
                state.page,
                state.has_next_page
            ))
        );
    }
    Ok(())
}

/// Run the first page, then scroll to the end of the view until `max_pages`
/// pages are shown or the session stops loading.
async fn collect_pages(
    session: &SearchSession,
    view: &ConsoleView,
    query: &str,
    filters: SearchFilters,
    max_pages: u32,
) -> Result<Vec<SearchItem>> {
    let mut results = Vec::new();
    if let PageLoad::Loaded { items, .. } = session.start_search(query, filters).await? {
        results.extend(items);
    }

    for _ in 1..max_pages {
        match session.on_scroll(view.scrolled_to_end()).await? {
            PageLoad::Loaded { items, .. } => results.extend(items),
            PageLoad::Skipped | PageLoad::Superseded => break,
        }
    }
    Ok(results)
}

// ─────────────────────────────────────────────────────────────────────────────
// Terminal view
// ─────────────────────────────────────────────────────────────────────────────

/// Prints results as they arrive and tracks how tall the list has grown.
pub struct ConsoleView {
    echo: bool,
    rows: Mutex<usize>,
}

impl ConsoleView {
    pub fn new(echo: bool) -> Self {
        Self {
            echo,
            rows: Mutex::new(0),
        }
    }

    pub fn rows(&self) -> usize {
        *self.rows.lock()
    }

    /// Scroll position with the last row at the bottom of the viewport.
    pub fn scrolled_to_end(&self) -> ScrollMetrics {
        let scroll_height = self.rows() as f64 * ROW_HEIGHT;
        ScrollMetrics {
            scroll_top: (scroll_height - VIEWPORT_HEIGHT).max(0.0),
            client_height: VIEWPORT_HEIGHT,
            scroll_height,
        }
    }
}

impl SearchView for ConsoleView {
    fn clear(&self) {
        *self.rows.lock() = 0;
    }

    fn set_loading(&self, loading: bool) {
        if loading && self.echo {
            eprintln!("{}", Style::new().dim().apply_to("Searching..."));
        }
    }

    fn append(&self, items: &[SearchItem]) {
        let mut rows = self.rows.lock();
        for item in items {
            *rows += 1;
            if self.echo {
                let dim = Style::new().dim();
                println!(
                    "{} {} {}",
                    dim.apply_to(format!("{:>3}.", *rows)),
                    truncate(item.display_title(), 48),
                    dim.apply_to(item.kind.as_deref().unwrap_or(""))
                );
                if let Some(url) = &item.url {
                    println!("     {}", dim.apply_to(url));
                }
            }
        }
    }

    fn show_empty(&self, message: &str) {
        *self.rows.lock() = 0;
        if self.echo {
            println!("{}", Style::new().dim().apply_to(message));
        }
    }

    fn show_loading_more(&self) {
        if self.echo {
            eprintln!("{}", Style::new().dim().apply_to("Loading more..."));
        }
    }

    fn hide_loading_more(&self) {}
}
