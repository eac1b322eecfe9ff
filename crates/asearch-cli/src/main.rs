mod ping;
mod region;
mod render;
mod search;
mod shell;

use asearch_core::{FieldId, JsonFilePreferences};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::region::RegionCommands;

#[derive(Debug, Parser)]
#[command(name = "asearch")]
#[command(about = "Search marketplace listings from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check that the search backend is reachable
    Ping,
    /// Run one search and print a page of results
    Search {
        /// Free-text query
        query: String,
        /// Region code to search in (defaults to the saved region)
        #[arg(long)]
        region: Option<String>,
        /// Only show rows whose item, ASIN or price contains this text
        #[arg(long)]
        filter: Option<String>,
        /// Column to sort by: rank, description, price, rating, reviews
        #[arg(long, default_value = "rank")]
        sort: FieldId,
        /// Sort descending
        #[arg(long)]
        desc: bool,
        /// Page to show, starting at 1
        #[arg(long, default_value = "1")]
        page: usize,
        /// Rows per page (0 shows everything); defaults to ASEARCH_PAGE_SIZE
        #[arg(long)]
        page_size: Option<usize>,
        /// Print the visible rows as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show, list or change the saved region
    Region {
        #[command(subcommand)]
        command: RegionCommands,
    },
    /// Interactive search session (the default)
    Shell,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Also loads `.env`.
    let config = asearch_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let mut preferences =
        JsonFilePreferences::open(config.preferences_path.clone(), config.default_region());

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Ping => ping::run_ping(&config).await?,
        Commands::Search {
            query,
            region,
            filter,
            sort,
            desc,
            page,
            page_size,
            json,
        } => {
            let options = search::SearchOptions {
                region,
                filter: filter.unwrap_or_default(),
                sort,
                descending: desc,
                page,
                page_size: page_size.unwrap_or(config.page_size),
                json,
            };
            search::run_search(&config, &preferences, &query, &options).await?;
        }
        Commands::Region { command } => match command {
            RegionCommands::Show => region::run_region_show(&preferences),
            RegionCommands::List => region::run_region_list(&config, &preferences),
            RegionCommands::Set { code } => {
                region::run_region_set(&config, &mut preferences, &code)?;
            }
        },
        Commands::Shell => shell::run_shell(&config, &mut preferences).await?,
    }

    Ok(())
}
