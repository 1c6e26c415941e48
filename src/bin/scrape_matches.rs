use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use vlr_archiver::{Crawler, FailureLog, MatchStore};

/// Fetch every unvisited match link and archive its statistics.
#[derive(Parser)]
#[command(name = "scrape-matches")]
struct Args {
    /// SQLite database holding the archive.
    #[arg(long, default_value = "sqlite://vlr-stats.db")]
    database_url: String,

    /// Number of detail pages processed in parallel.
    #[arg(long, default_value_t = 6)]
    workers: usize,

    /// File the urls of unresolved links are appended to.
    #[arg(long, default_value = "failures.log")]
    failure_log: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();
    let started = Instant::now();
    println!("Started at {}", Local::now().format("%H:%M:%S"));

    let store = MatchStore::connect(&args.database_url).await?;
    store.migrate().await?;
    let failures = Arc::new(FailureLog::open(&args.failure_log)?);

    let crawler = Crawler::new(store);
    let unresolved = crawler.archive_unvisited(args.workers, failures).await?;
    println!("Couldn't resolve {unresolved} matches.");

    println!(
        "\nFinished at {} after {:.1?}",
        Local::now().format("%H:%M:%S"),
        started.elapsed()
    );
    Ok(())
}
