//! Items command - log entries, statistics and todos.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::{Style, style};
use logfolio_client::{Item, ListItemsQuery};

use super::{print_done, print_header, print_json, truncate, Context};

/// Arguments for the items command.
#[derive(Args, Debug)]
pub struct ItemsArgs {
    #[command(subcommand)]
    pub command: ItemsCommand,
}

#[derive(Subcommand, Debug)]
pub enum ItemsCommand {
    /// List log entries
    List {
        /// Only this category
        #[arg(short, long)]
        category: Option<i64>,

        /// Only entries finished in this year
        #[arg(short, long)]
        year: Option<i32>,

        /// Only unfinished entries
        #[arg(long)]
        todo: bool,

        /// Page size
        #[arg(short, long)]
        limit: Option<u32>,

        /// Page offset
        #[arg(long, requires = "limit")]
        offset: Option<u32>,

        /// Title search
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show a single entry
    Show {
        /// Item ID
        id: i64,
    },

    /// Delete an entry
    Rm {
        /// Item ID
        id: i64,
    },

    /// Mark an entry as completed
    Complete {
        /// Item ID
        id: i64,
    },

    /// List years that have entries
    Years,

    /// Monthly and per-category statistics for a year
    Stats {
        /// Year
        year: i32,
    },

    /// Entry counts per category
    Counts {
        /// Restrict to a year
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Open todos
    Todos,
}

/// Run the items command.
pub async fn run(args: ItemsArgs, ctx: &Context) -> Result<()> {
    let items = ctx.client.items();
    let dim = Style::new().dim();

    match args.command {
        ItemsCommand::List {
            category,
            year,
            todo,
            limit,
            offset,
            search,
        } => {
            let query = ListItemsQuery {
                category_id: category,
                year,
                is_completed: todo.then_some(false),
                limit,
                offset,
                search,
            };
            let list = items.list(&query).await?;
            if ctx.json_output {
                return print_json(&list);
            }

            print_header("Items");
            print_items(list.items());
            if list.total() > list.items().len() as u64 {
                println!();
                println!(
                    "{}",
                    dim.apply_to(format!(
                        "showing {} of {}",
                        list.items().len(),
                        list.total()
                    ))
                );
            }
        }
        ItemsCommand::Show { id } => {
            let item = items.get(id).await?;
            if ctx.json_output {
                return print_json(&item);
            }

            print_header(&item.title);
            let field = |label: &str, value: Option<&str>| {
                if let Some(value) = value.filter(|v| !v.is_empty()) {
                    println!("{} {}", dim.apply_to(format!("{:<10}", label)), value);
                }
            };
            field("category", item.category_name.as_deref());
            field("finished", item.finish_time.as_deref());
            field("due", item.due_time.as_deref());
            field("status", Some(status(&item)));
            field("notes", item.notes.as_deref());
            for image in &item.images {
                field("image", Some(image.image_url.as_str()));
            }
        }
        ItemsCommand::Rm { id } => {
            items.delete(id).await?;
            if ctx.json_output {
                return print_json(&serde_json::json!({ "deleted": id }));
            }
            print_done(format!("Item {} deleted", id));
        }
        ItemsCommand::Complete { id } => {
            let item = items.complete(id).await?;
            if ctx.json_output {
                return print_json(&item);
            }
            print_done(format!("Completed: {}", item.title));
        }
        ItemsCommand::Years => {
            let years = items.years().await?;
            if ctx.json_output {
                return print_json(&years);
            }
            print_header("Years");
            for year in years {
                println!("{}", year);
            }
        }
        ItemsCommand::Stats { year } => {
            let stats = items.year_statistics(year).await?;
            if ctx.json_output {
                return print_json(&stats);
            }

            print_header(&format!("{} - {} entries", year, stats.total));
            let peak = (1..=12).map(|m| stats.month(m)).max().unwrap_or(0).max(1);
            for month in 1..=12 {
                let count = stats.month(month);
                let bar = "█".repeat((count * 30 / peak) as usize);
                println!(
                    "{} {} {}",
                    dim.apply_to(format!("{:>2}", month)),
                    style(bar).cyan(),
                    count
                );
            }
            if !stats.by_category.is_empty() {
                println!();
                for (name, count) in &stats.by_category {
                    println!("{:<20} {}", name, count);
                }
            }
        }
        ItemsCommand::Counts { year } => {
            let counts = items.category_counts(year).await?;
            if ctx.json_output {
                return print_json(&counts);
            }

            let title = match year {
                Some(year) => format!("Counts for {}", year),
                None => "Counts".to_string(),
            };
            print_header(&title);
            for (name, count) in &counts.by_category {
                println!("{:<20} {}", name, count);
            }
            println!("{:<20} {}", style("total").bold(), counts.total);
        }
        ItemsCommand::Todos => {
            let todos = items.todos().await?;
            if ctx.json_output {
                return print_json(&todos);
            }
            print_header("Todos");
            print_items(&todos);
        }
    }

    Ok(())
}

fn print_items(items: &[Item]) {
    let dim = Style::new().dim();
    if items.is_empty() {
        println!("{}", dim.apply_to("No items found"));
        return;
    }
    for item in items {
        let date = item
            .finish_time
            .as_deref()
            .or(item.due_time.as_deref())
            .map(|d| d.get(..10).unwrap_or(d))
            .unwrap_or("");
        println!(
            "{} {:<10} {} {}",
            dim.apply_to(format!("[{:>4}]", item.id)),
            date,
            truncate(&item.title, 50),
            dim.apply_to(item.category_name.as_deref().unwrap_or(""))
        );
    }
}

fn status(item: &Item) -> &'static str {
    if item.is_completed { "completed" } else { "todo" }
}
