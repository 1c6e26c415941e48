use async_trait::async_trait;
use tracing::debug;

use crate::error::{CrawlError, Result};

/// The HTTP boundary of the crawler.
///
/// Both pipeline stages only ever need "give me the body behind this URL",
/// so the transport is reduced to that one call. A non-success status is an
/// error; callers decide whether a failed unit of work is skipped (index
/// pages) or left retryable (match links).
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

#[async_trait]
impl Fetch for reqwest::Client {
    async fn fetch(&self, url: &str) -> Result<String> {
        debug!(url, "fetching page");

        let response = self.get(url).send().await.map_err(|e| CrawlError::Http {
            url: url.to_owned(),
            source: e,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::UnexpectedStatus {
                url: url.to_owned(),
                status,
            });
        }

        response.text().await.map_err(|e| CrawlError::ResponseBody {
            url: url.to_owned(),
            source: e,
        })
    }
}
