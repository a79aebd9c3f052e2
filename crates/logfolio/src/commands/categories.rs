//! Categories command - list, add and remove categories.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::Style;

use super::{print_done, print_header, print_json, Context};

/// Arguments for the categories command.
#[derive(Args, Debug)]
pub struct CategoriesArgs {
    #[command(subcommand)]
    pub command: CategoriesCommand,
}

#[derive(Subcommand, Debug)]
pub enum CategoriesCommand {
    /// List all categories
    List {
        /// Bypass the local category cache
        #[arg(long)]
        fresh: bool,
    },

    /// Add a category
    Add {
        /// Category name
        name: String,
    },

    /// Remove a category
    Rm {
        /// Category ID
        id: i64,
    },
}

/// Run the categories command.
pub async fn run(args: CategoriesArgs, ctx: &Context) -> Result<()> {
    let categories = ctx.client.categories();
    let dim = Style::new().dim();

    match args.command {
        CategoriesCommand::List { fresh } => {
            let all = categories.get_all(!fresh).await?;
            if ctx.json_output {
                return print_json(&all);
            }

            print_header("Categories");
            if all.is_empty() {
                println!("{}", dim.apply_to("No categories"));
            }
            for category in &all {
                let marker = if category.user_defined { "" } else { " (default)" };
                println!(
                    "{} {}{}",
                    dim.apply_to(format!("[{:>3}]", category.id)),
                    category.name,
                    dim.apply_to(marker)
                );
            }
        }
        CategoriesCommand::Add { name } => {
            let category = categories.create(&name).await?;
            if ctx.json_output {
                return print_json(&category);
            }
            print_done(format!(
                "Category created: {} {}",
                category.name,
                dim.apply_to(format!("[{}]", category.id))
            ));
        }
        CategoriesCommand::Rm { id } => {
            categories.delete(id).await?;
            if ctx.json_output {
                return print_json(&serde_json::json!({ "deleted": id }));
            }
            print_done(format!("Category {} deleted", id));
        }
    }

    Ok(())
}
