pub(crate) mod match_detail;
pub(crate) mod results_index;

use ::scraper::{ElementRef, Selector};

pub(crate) const BASE_URL: &str = "https://www.vlr.gg";
pub(crate) const RESULTS_URL: &str = "https://www.vlr.gg/matches/results/";

/// URL of one page of the paginated match-results index.
pub(crate) fn results_page_url(page: u32) -> String {
    format!("{RESULTS_URL}?page={page}")
}

/// URL of a match detail page from its site-relative link.
pub(crate) fn detail_page_url(link: &str) -> String {
    format!("{BASE_URL}{link}")
}

/// Text of an element whose expected shape is a single text node.
///
/// Historical pages sometimes wrap the text in an extra child element, which
/// makes a direct read ambiguous; in that case the serialized form is split
/// at tag boundaries, whitespace-only fragments are discarded, and the first
/// remaining fragment wins. Returns an empty string when no text is left.
pub(crate) fn fragment_text(element: &ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .find(|t| !t.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// [`fragment_text`] of the first element matching `selector` inside
/// `element`, or an empty string if nothing matches.
pub(crate) fn select_text(element: &ElementRef, selector: &Selector) -> String {
    element
        .select(selector)
        .next()
        .map(|e| fragment_text(&e))
        .unwrap_or_default()
}

/// Strip the punctuation the site mixes into numeric cells (thousands
/// separators, percent signs). The result stays text; some historical rows
/// hold blanks instead of numbers.
pub(crate) fn clean_metric(raw: &str) -> String {
    raw.trim().chars().filter(|c| !matches!(c, ',' | '%')).collect()
}

/// The attack / defense / combined values of one scoreboard stat cell.
///
/// Each cell carries three sibling spans tagged `mod-t`, `mod-ct` and
/// `mod-both`; all three come back cleaned, empty when absent.
pub(crate) fn side_values(cell: &ElementRef) -> (String, String, String) {
    let attack_selector = Selector::parse("span.mod-t").unwrap();
    let defense_selector = Selector::parse("span.mod-ct").unwrap();
    let both_selector = Selector::parse("span.mod-both").unwrap();

    (
        clean_metric(&select_text(cell, &attack_selector)),
        clean_metric(&select_text(cell, &defense_selector)),
        clean_metric(&select_text(cell, &both_selector)),
    )
}
