use std::sync::Arc;

use tracing::instrument;

use crate::discovery;
use crate::error::Result;
use crate::fetch::Fetch;
use crate::scheduler::{self, FailureLog};
use crate::store::MatchStore;

/// The main entry point for an archiving run.
///
/// `Crawler` owns the HTTP fetcher and the store as explicit dependencies
/// and exposes the two halves of the pipeline: discovering newly published
/// match links and archiving the unvisited backlog. The resumption cursor
/// is queried from the store at the start of each discovery run.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> vlr_archiver::Result<()> {
/// use vlr_archiver::{Crawler, MatchStore};
///
/// let store = MatchStore::connect("sqlite://vlr-stats.db").await?;
/// store.migrate().await?;
/// let crawler = Crawler::new(store);
/// let links = crawler.discover(5).await?;
/// println!("{} new links found.", links.len());
/// # Ok(())
/// # }
/// ```
pub struct Crawler<F = reqwest::Client> {
    fetcher: Arc<F>,
    store: MatchStore,
}

impl Crawler<reqwest::Client> {
    /// Create a crawler with a default HTTP client.
    pub fn new(store: MatchStore) -> Self {
        Self::with_fetcher(reqwest::Client::new(), store)
    }
}

impl<F: Fetch + 'static> Crawler<F> {
    /// Create a crawler using the provided fetcher.
    ///
    /// Use this when you need to configure the HTTP client, or to swap the
    /// transport out entirely.
    pub fn with_fetcher(fetcher: F, store: MatchStore) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            store,
        }
    }

    /// Walk the results index for links published since the last visited
    /// one, record them as unvisited, and return them in page order.
    #[instrument(skip(self))]
    pub async fn discover(&self, index_workers: usize) -> Result<Vec<String>> {
        let cursor = self.store.last_visited_url().await?;
        let links =
            discovery::discover_new_links(self.fetcher.as_ref(), cursor.as_deref(), index_workers)
                .await?;
        self.store.record_new_links(&links).await?;
        Ok(links)
    }

    /// Fetch and archive the whole unvisited backlog across a fixed worker
    /// pool. Returns the number of links that could not be resolved this
    /// run; their urls and failure details are appended to `failures`.
    #[instrument(skip(self, failures))]
    pub async fn archive_unvisited(
        &self,
        workers: usize,
        failures: Arc<FailureLog>,
    ) -> Result<usize> {
        let backlog = self.store.unvisited_links(-1).await?;
        Ok(scheduler::run(
            Arc::clone(&self.fetcher),
            self.store.clone(),
            failures,
            backlog,
            workers,
        )
        .await)
    }
}
