use clap::{Args, Subcommand};
use sn_core::{Result, UpsertStatus};

use crate::manager::{IngestManager, IngestReport};
use crate::sources;

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[command(subcommand)]
    pub command: IngestCommands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum IngestCommands {
    /// Ingest a JSON export written by a crawler
    File {
        /// Path to the export (an array of items or an object with `articles`)
        path: String,
    },
    /// Ingest a JSON feed served over http(s)
    Url {
        url: String,
    },
    /// Ingest every configured feed
    All,
    /// List configured feeds
    List,
}

pub async fn handle_command(args: IngestArgs, manager: &IngestManager) -> Result<IngestReport> {
    let report = match args.command {
        IngestCommands::File { path: location } | IngestCommands::Url { url: location } => {
            let source = sources::from_location(&location)?;
            manager.ingest_from(source.as_ref()).await?
        }
        IngestCommands::All => manager.ingest_all().await?,
        IngestCommands::List => {
            println!("Configured feeds:");
            for name in manager.source_names() {
                println!("  {}", name);
            }
            return Ok(IngestReport::default());
        }
    };
    print_report(&report);
    Ok(report)
}

pub fn status_emoji(status: UpsertStatus) -> &'static str {
    match status {
        UpsertStatus::New => "🆕",
        UpsertStatus::Updated => "📝",
        UpsertStatus::Unchanged => "⏭️",
    }
}

fn print_report(report: &IngestReport) {
    for (article, status) in &report.stored {
        println!("{} {} - {}", status_emoji(*status), article.title, article.url);
    }
    for (name, reason) in &report.failed_sources {
        eprintln!("Failed to ingest {}: {}", name, reason);
    }
    println!(
        "Stored {} articles ({} new, {} updated, {} unchanged), dropped {}",
        report.stored_count(),
        report.new,
        report.updated,
        report.unchanged,
        report.dropped
    );
}
