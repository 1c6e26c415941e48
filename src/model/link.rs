use chrono::{DateTime, Utc};
use serde::Serialize;

/// One discovered match-detail page URL plus its processed state.
///
/// Rows are created unvisited by the discovery walker and flipped to
/// visited exactly once by the scheduler; the flag never reverts.
#[derive(Debug, Clone, Serialize)]
pub struct Link {
    pub id: i64,
    /// Site-relative detail page path, e.g. `/378822/eg-vs-prx-champions-2023`.
    pub url: String,
    pub visited: bool,
    pub visited_at: Option<DateTime<Utc>>,
}
