use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use scenty::database::{DEFAULT_DATABASE_URL, Database};
use scenty::models::ScrapeOutcome;
use scenty::scraper::Scraper;
use scenty::scrapers::fragrantica;
use scenty::{AddOutcome, PerfumeCatalog};

/// Scrape perfume pages and manage the local perfume catalog
#[derive(Debug, Parser)]
#[command(name = "scenty", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scrape a perfume page and print it without storing
    Search {
        #[arg(long)]
        url: String,
    },
    /// Scrape a perfume page and store it with its reviews
    Add {
        #[arg(long)]
        url: String,
    },
    /// Show a stored perfume by name
    Get {
        #[arg(long)]
        name: String,
    },
    /// Remove a stored perfume and its reviews
    Delete {
        #[arg(long)]
        name: String,
    },
    /// List every stored perfume
    List,
    /// Remove every stored perfume and review
    Clear,
    /// Show a random stored perfume
    Random,
    /// Show the highest rated perfumes
    Top {
        #[arg(long)]
        num: u32,
    },
    /// Show catalog statistics
    Stats,
    /// Show the stored reviews of a perfume
    Reviews {
        #[arg(long)]
        perfume_id: i64,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_message(message: String) -> Result<()> {
    print_json(&json!({ "message": message }))
}

fn print_error(error: &str) -> Result<()> {
    print_json(&json!({ "error": error }))
}

async fn open_catalog(scraper: Scraper) -> Result<PerfumeCatalog> {
    let db_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.into());
    let database = Database::new(&db_url).await?;

    Ok(PerfumeCatalog::new(scraper, database))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("SCENTY_LOG").unwrap_or_else(|_| {
            "info,html5ever=error,selectors=error,sqlx=warn".into()
        }))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = fragrantica::config().with_env_overrides();
    let scraper = Scraper::new(config)?;
    info!("Running {:?}", cli.command);

    // Searching only scrapes, so it never touches the database file
    if let Command::Search { url } = &cli.command {
        return match scraper.scrape_all(url).await? {
            ScrapeOutcome::Perfume(record) => print_json(&record),
            ScrapeOutcome::NoInformation => print_error("No information on this perfume"),
            ScrapeOutcome::Unreachable => print_error("Could not fetch the perfume page"),
        };
    }

    let catalog = open_catalog(scraper).await?;

    match cli.command {
        Command::Search { .. } => Ok(()),
        Command::Add { url } => match catalog.add_from_url(&url).await? {
            AddOutcome::Added { id, name } => print_json(&json!({
                "id": id,
                "message": format!(
                    "{name} added to table, corresponding reviews populated into reviews table"
                ),
            })),
            AddOutcome::AlreadyStored { id, name } => print_json(&json!({
                "id": id,
                "message": format!("{name} is already stored in the table"),
            })),
            AddOutcome::Unavailable => print_error("No usable perfume data at this URL"),
        },
        Command::Get { name } => match catalog.get(&name).await? {
            Some(perfume) => print_json(&perfume),
            None => print_error("perfume not found in table"),
        },
        Command::Delete { name } => match catalog.remove(&name).await? {
            Some(id) => print_json(&json!({
                "id": id,
                "message": format!(
                    "{name} removed from table, corresponding reviews removed from reviews table"
                ),
            })),
            None => print_error("perfume not found in table"),
        },
        Command::List => {
            let perfumes = catalog.all().await?;
            if perfumes.is_empty() {
                print_message("table is empty".to_string())
            } else {
                print_json(&perfumes)
            }
        }
        Command::Clear => {
            let removed = catalog.clear().await?;
            print_message(format!(
                "{removed} perfumes and corresponding reviews deleted"
            ))
        }
        Command::Random => match catalog.random().await? {
            Some(perfume) => print_json(&perfume),
            None => print_error("table is empty"),
        },
        Command::Top { num } => print_json(&catalog.top(num).await?),
        Command::Stats => match catalog.stats().await? {
            Some(stats) => print_json(&stats),
            None => print_error("table is empty"),
        },
        Command::Reviews { perfume_id } => {
            let reviews = catalog.reviews(perfume_id).await?;
            if reviews.is_empty() {
                print_error("reviews for given perfume id not found in table")
            } else {
                print_json(&reviews)
            }
        }
    }
}
