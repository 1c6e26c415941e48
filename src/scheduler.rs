use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio::task::JoinSet;
use tracing::{debug, error, instrument, warn};

use crate::error::Result;
use crate::fetch::Fetch;
use crate::model::{GameStats, Link};
use crate::store::MatchStore;
use crate::vlr_scraper::detail_page_url;
use crate::vlr_scraper::match_detail::{parse_match_page, MatchPage};

/// Append-only log of links a run could not resolve, one entry per link
/// with the url and the failure detail.
pub struct FailureLog {
    file: Mutex<File>,
}

impl FailureLog {
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    fn append(&self, url: &str, detail: &str) {
        let Ok(mut file) = self.file.lock() else {
            return;
        };
        if let Err(err) = writeln!(file, "{url}\nReason: {detail}\n") {
            error!(url, %err, "could not write failure log entry");
        }
    }
}

/// How processing one link ended.
enum LinkOutcome {
    /// At least one game was fully persisted; the link is marked visited
    /// even when later games of the same page failed.
    Archived { games: usize },
    /// The site's explicit no-data state; marked visited with no records.
    NoData,
    /// Nothing could be persisted. The link stays unvisited and will be
    /// retried on a later run.
    NoGames,
}

/// Distribute `batch` over a fixed pool of `workers` and process every link
/// independently: fetch, build records, persist, update visited state.
///
/// One bad page never aborts the batch; per-link failures are appended to
/// `failures` and aggregated into the returned unresolved count. Partitions
/// are link-disjoint, so no two workers ever touch the same link row.
#[instrument(skip(fetcher, store, failures, batch), fields(links = batch.len()))]
pub async fn run<F: Fetch + 'static>(
    fetcher: Arc<F>,
    store: MatchStore,
    failures: Arc<FailureLog>,
    batch: Vec<Link>,
    workers: usize,
) -> usize {
    if batch.is_empty() {
        return 0;
    }

    let chunk_size = batch.len().div_ceil(workers.max(1));
    let mut pool = JoinSet::new();
    for partition in batch.chunks(chunk_size).map(<[Link]>::to_vec) {
        let fetcher = Arc::clone(&fetcher);
        let store = store.clone();
        let failures = Arc::clone(&failures);
        pool.spawn(async move {
            let mut unresolved = 0usize;
            for link in &partition {
                if !process_link(fetcher.as_ref(), &store, &failures, link).await {
                    unresolved += 1;
                }
            }
            unresolved
        });
    }

    let mut unresolved = 0;
    while let Some(joined) = pool.join_next().await {
        match joined {
            Ok(count) => unresolved += count,
            Err(err) => error!(%err, "scheduler worker failed"),
        }
    }
    unresolved
}

/// Returns whether the link was resolved this run.
async fn process_link<F: Fetch>(
    fetcher: &F,
    store: &MatchStore,
    failures: &FailureLog,
    link: &Link,
) -> bool {
    match try_process(fetcher, store, link).await {
        Ok(LinkOutcome::Archived { games }) => {
            debug!(url = %link.url, games, "archived match");
            true
        }
        Ok(LinkOutcome::NoData) => {
            debug!(url = %link.url, "no data recorded for match");
            true
        }
        Ok(LinkOutcome::NoGames) => {
            failures.append(&link.url, "no games could be archived");
            false
        }
        Err(err) => {
            failures.append(&link.url, &err.to_string());
            false
        }
    }
}

async fn try_process<F: Fetch>(
    fetcher: &F,
    store: &MatchStore,
    link: &Link,
) -> Result<LinkOutcome> {
    let body = fetcher.fetch(&detail_page_url(&link.url)).await?;

    let stats = match parse_match_page(&body)? {
        MatchPage::NoData => {
            store.mark_visited(link.id).await?;
            return Ok(LinkOutcome::NoData);
        }
        MatchPage::Stats(stats) => stats,
    };

    let match_id = store.insert_match(&stats).await?;

    let mut archived = 0;
    for game in &stats.games {
        // a game-local persistence failure skips that game only
        if let Err(err) = persist_game(store, match_id, game).await {
            warn!(url = %link.url, %err, "skipping game");
            continue;
        }
        archived += 1;
    }

    // a page with zero persisted games never reaches the mark-visited step
    // and stays retryable on the next run
    if archived == 0 {
        return Ok(LinkOutcome::NoGames);
    }
    store.mark_visited(link.id).await?;
    Ok(LinkOutcome::Archived { games: archived })
}

async fn persist_game(store: &MatchStore, match_id: i64, game: &GameStats) -> Result<()> {
    let game_id = store.insert_game(match_id, game).await?;
    for player in &game.players {
        store.insert_player(game_id, player).await?;
    }
    Ok(())
}
