use futures::stream::{self, StreamExt};
use scraper::Html;
use tracing::{info, instrument, warn};

use crate::error::Result;
use crate::fetch::Fetch;
use crate::vlr_scraper::{self, results_index};

/// Walk the paginated results index and return the links published since
/// `last_seen_url`, in page order, newest page first.
///
/// Pages are fetched with bounded parallelism but reconciled strictly in
/// page-index order: truncation at the cursor is defined relative to
/// pagination order, not fetch-completion order. Passing no cursor returns
/// every link on the index.
///
/// Failing to read the page count off page 1 aborts the walk; any later
/// page that fails to fetch just contributes no links for this run.
#[instrument(skip(fetcher))]
pub async fn discover_new_links<F: Fetch>(
    fetcher: &F,
    last_seen_url: Option<&str>,
    concurrency: usize,
) -> Result<Vec<String>> {
    let first = fetcher.fetch(&vlr_scraper::results_page_url(1)).await?;
    let max_page = results_index::parse_max_page(&Html::parse_document(&first))?;
    info!(max_page, "walking results index");

    let mut pages = stream::iter((1..=max_page).map(|page| fetch_page_links(fetcher, page)))
        .buffered(concurrency.max(1));

    let mut links = Vec::new();
    while let Some(page_links) = pages.next().await {
        let (mut new_links, found_cursor) = cut_at_cursor(page_links, last_seen_url);
        links.append(&mut new_links);
        if found_cursor {
            // everything past this page is already recorded; dropping the
            // stream discards the fetches still in flight
            break;
        }
    }
    Ok(links)
}

async fn fetch_page_links<F: Fetch>(fetcher: &F, page: u32) -> Vec<String> {
    match fetcher.fetch(&vlr_scraper::results_page_url(page)).await {
        Ok(body) => results_index::parse_match_links(&Html::parse_document(&body)),
        Err(err) => {
            warn!(page, %err, "results page fetch failed, contributes no links");
            Vec::new()
        }
    }
}

/// Truncate one page's link list at (excluding) the resumption cursor.
/// Returns the kept prefix and whether the cursor was found on this page.
fn cut_at_cursor(links: Vec<String>, cursor: Option<&str>) -> (Vec<String>, bool) {
    match cursor.and_then(|c| links.iter().position(|l| l == c)) {
        Some(position) => {
            let mut kept = links;
            kept.truncate(position);
            (kept, true)
        }
        None => (links, false),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::error::CrawlError;

    /// Serves canned results pages, optionally stalling individual pages so
    /// fetch completions race out of page order.
    struct FakeIndex {
        pages: HashMap<String, String>,
        delays: HashMap<String, Duration>,
    }

    impl FakeIndex {
        fn new(pages: Vec<(u32, String)>) -> Self {
            Self {
                pages: pages
                    .into_iter()
                    .map(|(n, body)| (vlr_scraper::results_page_url(n), body))
                    .collect(),
                delays: HashMap::new(),
            }
        }

        fn delay(mut self, page: u32, delay: Duration) -> Self {
            self.delays.insert(vlr_scraper::results_page_url(page), delay);
            self
        }
    }

    #[async_trait]
    impl Fetch for FakeIndex {
        async fn fetch(&self, url: &str) -> Result<String> {
            if let Some(delay) = self.delays.get(url) {
                tokio::time::sleep(*delay).await;
            }
            self.pages
                .get(url)
                .cloned()
                .ok_or(CrawlError::UnexpectedStatus {
                    url: url.to_string(),
                    status: reqwest::StatusCode::NOT_FOUND,
                })
        }
    }

    fn results_page(max_page: u32, links: &[&str]) -> String {
        let anchors: String = links
            .iter()
            .map(|l| format!(r#"<a href="{l}"></a>"#))
            .collect();
        format!(
            r#"<html><body>
            <div class="wf-card"><a href="/0/upcoming"></a></div>
            <div class="wf-card">{anchors}</div>
            <div class="action-container"><a>1</a><a>{max_page}</a></div>
            </body></html>"#
        )
    }

    #[test]
    fn cursor_truncates_at_its_position() {
        let links = vec!["/3/c".to_string(), "/2/b".to_string(), "/1/a".to_string()];
        let (kept, found) = cut_at_cursor(links.clone(), Some("/1/a"));
        assert!(found);
        assert_eq!(kept, vec!["/3/c", "/2/b"]);

        let (kept, found) = cut_at_cursor(links.clone(), Some("/3/c"));
        assert!(found);
        assert!(kept.is_empty());

        let (kept, found) = cut_at_cursor(links, None);
        assert!(!found);
        assert_eq!(kept.len(), 3);
    }

    #[tokio::test]
    async fn no_cursor_returns_all_links_across_all_pages() {
        let fake = FakeIndex::new(vec![
            (1, results_page(3, &["/9/i", "/8/h"])),
            (2, results_page(3, &["/7/g", "/6/f"])),
            (3, results_page(3, &["/5/e"])),
        ]);
        let links = discover_new_links(&fake, None, 2).await.unwrap();
        assert_eq!(links, vec!["/9/i", "/8/h", "/7/g", "/6/f", "/5/e"]);
    }

    #[tokio::test]
    async fn truncation_follows_page_order_not_completion_order() {
        // page 1 finishes long after pages 2 and 3, and page 2 holds the
        // cursor at its third position
        let fake = FakeIndex::new(vec![
            (1, results_page(3, &["/9/i", "/8/h"])),
            (2, results_page(3, &["/7/g", "/6/f", "/5/e", "/4/d"])),
            (3, results_page(3, &["/3/c"])),
        ])
        .delay(1, Duration::from_millis(100));

        let links = discover_new_links(&fake, Some("/5/e"), 3).await.unwrap();
        assert_eq!(links, vec!["/9/i", "/8/h", "/7/g", "/6/f"]);
    }

    #[tokio::test]
    async fn cursor_at_first_position_of_page_1_yields_nothing() {
        let fake = FakeIndex::new(vec![
            (1, results_page(2, &["/9/i", "/8/h"])),
            (2, results_page(2, &["/7/g"])),
        ]);
        let links = discover_new_links(&fake, Some("/9/i"), 2).await.unwrap();
        assert!(links.is_empty());
    }

    #[tokio::test]
    async fn failed_page_contributes_no_links() {
        // page 2 is missing from the fake, so it 404s mid-walk
        let fake = FakeIndex::new(vec![
            (1, results_page(3, &["/9/i"])),
            (3, results_page(3, &["/5/e"])),
        ]);
        let links = discover_new_links(&fake, None, 2).await.unwrap();
        assert_eq!(links, vec!["/9/i", "/5/e"]);
    }

    #[tokio::test]
    async fn missing_page_count_aborts_the_walk() {
        let fake = FakeIndex::new(vec![(1, "<html><body>no nav here</body></html>".to_string())]);
        assert!(discover_new_links(&fake, None, 2).await.is_err());
    }
}
