pub use crawler::Crawler;
pub use error::{CrawlError, Result};
pub use fetch::Fetch;
pub use scheduler::FailureLog;
pub use store::MatchStore;

pub mod crawler;
pub mod discovery;
pub mod error;
pub mod fetch;
pub mod model;
pub mod scheduler;
pub mod store;
pub(crate) mod vlr_scraper;
