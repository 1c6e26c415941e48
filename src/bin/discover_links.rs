use clap::Parser;
use tracing_subscriber::EnvFilter;

use vlr_archiver::{Crawler, MatchStore};

/// Walk the vlr.gg results index and record match links published since the
/// last archived one.
#[derive(Parser)]
#[command(name = "discover-links")]
struct Args {
    /// SQLite database holding the archive.
    #[arg(long, default_value = "sqlite://vlr-stats.db")]
    database_url: String,

    /// Number of index pages fetched in parallel.
    #[arg(long, default_value_t = 5)]
    workers: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let store = MatchStore::connect(&args.database_url).await?;
    store.migrate().await?;

    let crawler = Crawler::new(store);
    let links = crawler.discover(args.workers).await?;
    println!("{} new links found.", links.len());

    Ok(())
}
