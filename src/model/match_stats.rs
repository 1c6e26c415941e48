use chrono::NaiveDateTime;
use serde::Serialize;

/// The record graph extracted from one match detail page.
#[derive(Debug, Clone, Serialize)]
pub struct MatchStats {
    /// Match start in UTC, when the page carried a parseable timestamp.
    pub date: Option<NaiveDateTime>,
    /// Game patch the match was played on, empty when not listed.
    pub patch: String,
    pub team_1_name: String,
    pub team_2_name: String,
    pub games: Vec<GameStats>,
}

/// One played game (map) of a best-of series.
///
/// Unplayed placeholders and the aggregate "all maps" pseudo-game are
/// excluded during extraction, never recorded as zero scores.
#[derive(Debug, Clone, Serialize)]
pub struct GameStats {
    pub map: String,
    pub team_1_score: i64,
    pub team_2_score: i64,
    /// Team 1's board first, then team 2's, each in scoreboard row order.
    pub players: Vec<PlayerStats>,
}

/// One player's performance in one game, split by side.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerStats {
    pub player: String,
    /// Agent identifier taken from the agent icon path, e.g. `jett`.
    pub agent: String,
    pub team: u8,
    /// Exactly one entry per side: attack, defense, all.
    pub side: Vec<SideStats>,
}

/// The side context a stat line was recorded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    Attack,
    Defense,
    All,
}

/// The ten scoreboard metrics for one side context.
///
/// Values are cleaned text, not numbers: thousands separators and percent
/// signs are stripped, but historical rows can hold blanks or other
/// non-numeric placeholders, so no numeric parse is attempted.
#[derive(Debug, Clone, Serialize)]
pub struct SideStats {
    pub side: Side,
    pub rating: String,
    #[serde(rename = "ACS")]
    pub acs: String,
    pub kills: String,
    pub deaths: String,
    pub assists: String,
    #[serde(rename = "KAST")]
    pub kast: String,
    #[serde(rename = "ADR")]
    pub adr: String,
    #[serde(rename = "HS%")]
    pub headshot_percent: String,
    #[serde(rename = "FK")]
    pub first_kills: String,
    #[serde(rename = "FD")]
    pub first_deaths: String,
}
