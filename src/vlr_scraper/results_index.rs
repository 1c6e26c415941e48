use itertools::Itertools;
use scraper::{Html, Selector};

use crate::error::{CrawlError, Result};

/// Total page count of the results index, read from page 1's pagination
/// control (the largest numeric page indicator present).
pub(crate) fn parse_max_page(document: &Html) -> Result<u32> {
    let nav_selector = Selector::parse("div.action-container")?;
    let nav = document
        .select(&nav_selector)
        .next()
        .ok_or(CrawlError::ElementNotFound {
            context: "results pagination control (div.action-container)",
        })?;

    nav.text()
        .filter_map(|t| t.trim().parse::<u32>().ok())
        .max()
        .ok_or(CrawlError::ElementNotFound {
            context: "numeric page indicator in pagination control",
        })
}

/// Match-detail links of one results page, in document order.
///
/// Every result-group card contributes its links except the first, which is
/// the upcoming-matches block rather than historical results.
pub(crate) fn parse_match_links(document: &Html) -> Vec<String> {
    let card_selector = Selector::parse("div.wf-card").unwrap();
    let link_selector = Selector::parse("a").unwrap();

    document
        .select(&card_selector)
        .skip(1)
        .flat_map(|card| {
            card.select(&link_selector)
                .filter_map(|a| a.value().attr("href"))
                .map(|href| href.to_string())
                .collect_vec()
        })
        .collect_vec()
}
