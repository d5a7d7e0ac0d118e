use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use sn_core::{ArticleStorage, DigestEntry, Error};
use sn_ingest::sources;
use sn_ingest::{handle_command, IngestArgs, IngestCommands, IngestManager};
use sn_ranking::{ArticleSelector, SelectorConfig, DEFAULT_WINDOW_DAYS};
use sn_storage::StorageKind;
use sn_web::AppState;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod duration;

use duration::HumanDuration;

/// Default number of articles picked by `sn select`.
const DEFAULT_LIMIT: usize = 5;

#[derive(Parser, Debug)]
#[command(name = "sn", author, version, about = "Rank industry news and pick the top articles for a digest", long_about = None)]
pub struct Cli {
    /// Storage backend: memory or sqlite
    #[arg(long, env = "SN_STORAGE", default_value = "memory")]
    storage: String,
    /// SQLite database location (sqlite: url or file path)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
    /// Trailing window used when a selection names no dates
    #[arg(long, env = "SN_WINDOW_DAYS", default_value_t = DEFAULT_WINDOW_DAYS)]
    window_days: i64,
    /// Feed locations, file paths or http(s) urls. Repeat or separate with commas.
    #[arg(long = "feed", env = "SN_FEED", value_delimiter = ',')]
    feeds: Vec<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Ingest articles. Without a subcommand every configured feed is read.
    Ingest {
        #[command(subcommand)]
        command: Option<IngestCommands>,
        /// Run in periodic mode with the specified interval (e.g. 1h, 30m, 1d, 1h15m30s)
        #[arg(long)]
        interval: Option<HumanDuration>,
    },
    /// Rank the articles in a date window and mark the top ones as selected
    Select {
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
        /// First day of the window (YYYY-MM-DD, UTC)
        #[arg(long)]
        start_date: Option<String>,
        /// Last day of the window (YYYY-MM-DD, UTC)
        #[arg(long)]
        end_date: Option<String>,
    },
    /// List stored articles, newest first
    List,
    /// Print the current selection as digest entries (JSON)
    Digest,
    /// Serve the HTTP API
    Serve {
        #[arg(long, env = "SN_BIND", default_value = "0.0.0.0:5000")]
        bind: String,
    },
}

async fn check_storage(storage: &Arc<dyn ArticleStorage>, kind: StorageKind) -> sn_core::Result<()> {
    let articles = storage.list_articles().await?;
    info!("🏦 Storage backend ready (using {}, {} articles)", kind, articles.len());
    Ok(())
}

async fn check_storage_with_retry(
    storage: &Arc<dyn ArticleStorage>,
    kind: StorageKind,
    max_retries: u32,
    timeout: Duration,
) -> sn_core::Result<()> {
    let mut retries = 0;
    let mut last_error = None;

    while retries < max_retries {
        match tokio::time::timeout(timeout, check_storage(storage, kind)).await {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => last_error = Some(e),
            Err(elapsed) => {
                last_error = Some(Error::Storage(format!("Storage health check timed out: {}", elapsed)));
            }
        }
        retries += 1;
        if retries < max_retries {
            info!("Storage health check failed, retrying {}/{}...", retries, max_retries);
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
    }

    Err(last_error.unwrap_or_else(|| Error::Storage("Storage health check failed after all retries".to_string())))
}

fn build_manager(storage: Arc<dyn ArticleStorage>, feeds: &[String]) -> sn_core::Result<IngestManager> {
    let mut manager = IngestManager::new(storage);
    for feed in feeds.iter().filter(|f| !f.trim().is_empty()) {
        manager.add_source(sources::from_location(feed)?);
    }
    Ok(manager)
}

fn print_selection(articles: &[sn_core::Article]) {
    for (rank, article) in articles.iter().enumerate() {
        println!(
            "{:>2}. {:.3} {} - {}",
            rank + 1,
            article.relevance_score.unwrap_or_default(),
            article.title,
            article.url
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();

    let cli = Cli::parse();
    let kind: StorageKind = cli.storage.parse()?;

    let storage = sn_storage::create_storage(kind, cli.database_url.as_deref()).await?;
    info!("💾 Checking storage connection...");
    check_storage_with_retry(&storage, kind, 3, Duration::from_secs(10)).await?;

    let manager = build_manager(storage.clone(), &cli.feeds)?;
    info!("📡 Feeds configured: {}", manager.source_names().join(", "));

    let config = SelectorConfig {
        window_days: cli.window_days,
        ..SelectorConfig::default()
    };

    // A memory store starts empty on every run; load the feeds first.
    if kind == StorageKind::Memory && !matches!(cli.command, Commands::Ingest { .. }) {
        if manager.source_names().is_empty() {
            warn!("Memory storage with no feeds configured, the corpus is empty");
        } else {
            manager.ingest_all().await?;
        }
    }

    match cli.command {
        Commands::Ingest { command, interval } => {
            let args = IngestArgs {
                command: command.unwrap_or(IngestCommands::All),
            };
            if let Some(interval) = interval {
                info!("Running in periodic mode with {}s interval", interval.0.as_secs());
                loop {
                    info!("Starting ingest cycle");
                    if let Err(e) = handle_command(args.clone(), &manager).await {
                        eprintln!("Error during ingest: {}", e);
                    }
                    info!("Waiting {}s before next ingest", interval.0.as_secs());
                    tokio::time::sleep(interval.0).await;
                }
            } else {
                handle_command(args, &manager).await?;
            }
        }
        Commands::Select { limit, start_date, end_date } => {
            let selector = ArticleSelector::new(storage.clone(), config)?;
            let selection = selector
                .select(limit, start_date.as_deref(), end_date.as_deref())
                .await?;
            if selection.is_empty() {
                println!(
                    "No articles published between {} and {}",
                    selection.window.start(),
                    selection.window.end()
                );
            } else {
                println!(
                    "Selected {} of {} articles",
                    selection.articles.len(),
                    selection.candidates
                );
                print_selection(&selection.articles);
            }
        }
        Commands::List => {
            for article in storage.list_articles().await? {
                let marker = if article.is_selected { "★" } else { " " };
                println!(
                    "{} {} {} - {}",
                    marker,
                    article.published_at.format("%Y-%m-%d %H:%M"),
                    article.title,
                    article.url
                );
            }
        }
        Commands::Digest => {
            let entries: Vec<DigestEntry> = storage
                .selected_articles()
                .await?
                .iter()
                .map(DigestEntry::from)
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        Commands::Serve { bind } => {
            let state = AppState::new(storage.clone(), config, manager)?;
            sn_web::serve(state, &bind).await?;
        }
    }

    Ok(())
}
