use ::scraper::error::SelectorErrorKind;
use std::num::ParseIntError;

/// All errors that can occur while crawling and archiving matches.
#[derive(thiserror::Error, Debug)]
pub enum CrawlError {
    /// HTTP request failed (network, DNS, TLS, timeout, etc.).
    #[error("http request failed for {url}: {source}")]
    Http {
        url: String,
        source: reqwest::Error,
    },

    /// Server returned a non-success HTTP status code.
    #[error("unexpected status {status} for {url}")]
    UnexpectedStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Failed to read the response body as text.
    #[error("failed to read response body from {url}: {source}")]
    ResponseBody {
        url: String,
        source: reqwest::Error,
    },

    /// A CSS selector string could not be parsed.
    #[error("invalid CSS selector: {0}")]
    Selector(String),

    /// Failed to parse an integer from scraped text.
    #[error("failed to parse integer: {0}")]
    IntParse(#[from] ParseIntError),

    /// An expected HTML element was not found on the page.
    #[error("expected element not found: {context}")]
    ElementNotFound { context: &'static str },

    /// A database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Failed to serialize a record for storage.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Failure-log file could not be opened or written.
    #[error("failure log error: {0}")]
    FailureLog(#[from] std::io::Error),
}

impl<'a> From<SelectorErrorKind<'a>> for CrawlError {
    fn from(err: SelectorErrorKind<'a>) -> Self {
        CrawlError::Selector(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CrawlError>;
