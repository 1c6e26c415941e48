use chrono::NaiveDateTime;
use itertools::Itertools;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use crate::error::{CrawlError, Result};
use crate::model::{GameStats, MatchStats, PlayerStats, Side, SideStats};
use crate::vlr_scraper::{fragment_text, select_text, side_values};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const NO_DATA_MARKER: &str = "No data available for this match";

/// Outcome of parsing one match detail page.
#[derive(Debug)]
pub(crate) enum MatchPage {
    /// The site's explicit "no stats recorded" state. A valid terminal
    /// state for a link, not a failure.
    NoData,
    Stats(MatchStats),
}

/// Build the full record graph for one fetched detail page.
pub(crate) fn parse_match_page(body: &str) -> Result<MatchPage> {
    if body.contains(NO_DATA_MARKER) {
        return Ok(MatchPage::NoData);
    }

    let document = Html::parse_document(body);
    let column_selector = Selector::parse("div.col.mod-3")?;
    let column = document
        .select(&column_selector)
        .next()
        .ok_or(CrawlError::ElementNotFound {
            context: "match page column (div.col.mod-3)",
        })?;
    parse_match(&column).map(MatchPage::Stats)
}

fn parse_match(column: &ElementRef) -> Result<MatchStats> {
    let date_selector = Selector::parse("div.match-header-date div.moment-tz-convert")?;
    let date = column
        .select(&date_selector)
        .next()
        .and_then(|e| e.value().attr("data-utc-ts"))
        .and_then(|ts| NaiveDateTime::parse_from_str(ts.trim(), DATE_FORMAT).ok());

    // the patch renders as a bare "Patch 7.01" text fragment somewhere in
    // the header; only its last token is the number
    let patch = column
        .text()
        .map(str::trim)
        .find(|t| t.contains("Patch"))
        .and_then(|t| t.split_whitespace().last())
        .unwrap_or_default()
        .to_string();

    let name_selector = Selector::parse("div.wf-title-med")?;
    let mut names = column.select(&name_selector).map(|e| fragment_text(&e));
    let (team_1_name, team_2_name) = names
        .next_tuple()
        .ok_or(CrawlError::ElementNotFound {
            context: "team name headers (div.wf-title-med)",
        })?;

    let games = parse_games(column)?;

    Ok(MatchStats {
        date,
        patch,
        team_1_name,
        team_2_name,
        games,
    })
}

fn parse_games(column: &ElementRef) -> Result<Vec<GameStats>> {
    let game_selector = Selector::parse("div.vm-stats-container [data-game-id]")?;

    let mut games = vec![];
    for block in column.select(&game_selector) {
        let game_id = block.value().attr("data-game-id").unwrap_or_default();

        // "all" is the aggregate pseudo-game; a TBD placeholder marks a game
        // that was never played out. Neither is a real game.
        if game_id == "all" || block.text().any(|t| t.contains("TBD")) {
            continue;
        }

        // early pages did not record every field; one unreadable game must
        // not sink its siblings
        match parse_game(&block) {
            Ok(game) => games.push(game),
            Err(err) => warn!(game_id, %err, "skipping game block"),
        }
    }
    Ok(games)
}

fn parse_game(block: &ElementRef) -> Result<GameStats> {
    let header_selector = Selector::parse("div.vm-stats-game-header")?;
    let header = block
        .select(&header_selector)
        .next()
        .ok_or(CrawlError::ElementNotFound {
            context: "game header (div.vm-stats-game-header)",
        })?;

    let map_selector = Selector::parse("div.map")?;
    let map = select_text(&header, &map_selector);

    let team_selector = Selector::parse("div.team")?;
    let team_right_selector = Selector::parse("div.team.mod-right")?;
    let score_selector = Selector::parse("div.score")?;
    let team_1 = header
        .select(&team_selector)
        .next()
        .ok_or(CrawlError::ElementNotFound {
            context: "left team block in game header",
        })?;
    let team_2 = header
        .select(&team_right_selector)
        .next()
        .ok_or(CrawlError::ElementNotFound {
            context: "right team block in game header",
        })?;
    let team_1_score: i64 = select_text(&team_1, &score_selector).parse()?;
    let team_2_score: i64 = select_text(&team_2, &score_selector).parse()?;

    let board_selector = Selector::parse("table")?;
    let boards = block.select(&board_selector).collect_vec();
    let (board_1, board_2) = match boards.as_slice() {
        [first, second, ..] => (first, second),
        _ => {
            return Err(CrawlError::ElementNotFound {
                context: "scoreboard tables in game block",
            })
        }
    };

    let mut players = parse_board(board_1, 1);
    players.extend(parse_board(board_2, 2));

    Ok(GameStats {
        map,
        team_1_score,
        team_2_score,
        players,
    })
}

fn parse_board(board: &ElementRef, team: u8) -> Vec<PlayerStats> {
    let row_selector = Selector::parse("tbody tr:has(td.mod-player)").unwrap();
    board
        .select(&row_selector)
        .map(|row| parse_player(&row, team))
        .collect_vec()
}

fn parse_player(row: &ElementRef, team: u8) -> PlayerStats {
    let name_selector = Selector::parse("td.mod-player a div").unwrap();
    let player = row
        .select(&name_selector)
        .next()
        .map(|e| fragment_text(&e))
        .unwrap_or_default();

    let agent_selector = Selector::parse("td.mod-agents img").unwrap();
    let agent = row
        .select(&agent_selector)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(agent_from_icon_path)
        .unwrap_or_default();

    let stat_selector = Selector::parse("td.mod-stat").unwrap();
    let cells = row.select(&stat_selector).collect_vec();
    let (attack, defense, all) = side_stats(&cells);

    PlayerStats {
        player,
        agent,
        team,
        side: vec![attack, defense, all],
    }
}

/// `…/agents/jett.png` → `jett`
fn agent_from_icon_path(src: &str) -> String {
    let file = src.rsplit('/').next().unwrap_or_default();
    file.rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file)
        .to_string()
}

/// Freshly built per-side records for one scoreboard row.
///
/// Column order on the board: rating, ACS, K, D, A, +/-, KAST, ADR, HS%,
/// FK, FD. The +/- differential (column 5) is derivable and not archived.
fn side_stats(cells: &[ElementRef]) -> (SideStats, SideStats, SideStats) {
    let col = |n: usize| cells.get(n).map(side_values).unwrap_or_default();

    let (rating_atk, rating_def, rating_all) = col(0);
    let (acs_atk, acs_def, acs_all) = col(1);
    let (kills_atk, kills_def, kills_all) = col(2);
    let (deaths_atk, deaths_def, deaths_all) = col(3);
    let (assists_atk, assists_def, assists_all) = col(4);
    let (kast_atk, kast_def, kast_all) = col(6);
    let (adr_atk, adr_def, adr_all) = col(7);
    let (hs_atk, hs_def, hs_all) = col(8);
    let (fk_atk, fk_def, fk_all) = col(9);
    let (fd_atk, fd_def, fd_all) = col(10);

    (
        SideStats {
            side: Side::Attack,
            rating: rating_atk,
            acs: acs_atk,
            kills: kills_atk,
            deaths: deaths_atk,
            assists: assists_atk,
            kast: kast_atk,
            adr: adr_atk,
            headshot_percent: hs_atk,
            first_kills: fk_atk,
            first_deaths: fd_atk,
        },
        SideStats {
            side: Side::Defense,
            rating: rating_def,
            acs: acs_def,
            kills: kills_def,
            deaths: deaths_def,
            assists: assists_def,
            kast: kast_def,
            adr: adr_def,
            headshot_percent: hs_def,
            first_kills: fk_def,
            first_deaths: fd_def,
        },
        SideStats {
            side: Side::All,
            rating: rating_all,
            acs: acs_all,
            kills: kills_all,
            deaths: deaths_all,
            assists: assists_all,
            kast: kast_all,
            adr: adr_all,
            headshot_percent: hs_all,
            first_kills: fk_all,
            first_deaths: fd_all,
        },
    )
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// A detail page with an aggregate pseudo-game, one played game with
    /// both scoreboards, and one TBD placeholder game. Team 2's name cell
    /// carries the nested markup seen on historical pages.
    pub(crate) const DETAIL_PAGE: &str = r#"
        <html><body><div class="col mod-3">
        <div class="match-header">
            <div class="match-header-date">
                <div class="moment-tz-convert" data-utc-ts="2023-08-26 15:00:00">Sat, August 26th</div>
            </div>
            <div class="match-header-date"><div class="wf-tag">Patch 7.01</div></div>
            <div class="match-header-vs">
                <a class="match-header-link"><div class="wf-title-med">Evil Geniuses</div></a>
                <a class="match-header-link"><div class="wf-title-med"><span>Paper Rex</span><span class="flag"></span></div></a>
            </div>
        </div>
        <div class="vm-stats-container">
            <div class="vm-stats-game" data-game-id="all">aggregate stats</div>
            <div class="vm-stats-game" data-game-id="162034">
                <div class="vm-stats-game-header">
                    <div class="team"><div class="score mod-win">13</div></div>
                    <div class="map"><div><span>Ascent</span><span class="picked">PICK</span></div></div>
                    <div class="team mod-right"><div class="score">7</div></div>
                </div>
                <table class="wf-table-inset mod-overview"><tbody>
                    <tr>
                        <td class="mod-player"><a href="/player/9/demon1"><div>Demon1</div><div class="ge-text-light">EG</div></a></td>
                        <td class="mod-agents"><span class="mod-agent"><img src="/img/vlr/game/agents/jett.png"></span></td>
                        <td class="mod-stat"><span class="side mod-side mod-t">1.52</span><span class="side mod-side mod-ct">1.10</span><span class="side mod-both">1.30</span></td>
                        <td class="mod-stat"><span class="side mod-side mod-t">1,204</span><span class="side mod-side mod-ct">210</span><span class="side mod-both">255</span></td>
                        <td class="mod-stat"><span class="side mod-side mod-t">12</span><span class="side mod-side mod-ct">10</span><span class="side mod-both">22</span></td>
                        <td class="mod-stat"><span class="side mod-side mod-t">5</span><span class="side mod-side mod-ct">7</span><span class="side mod-both">12</span></td>
                        <td class="mod-stat"><span class="side mod-side mod-t">3</span><span class="side mod-side mod-ct">1</span><span class="side mod-both">4</span></td>
                        <td class="mod-stat"><span class="side mod-side mod-t">+7</span><span class="side mod-side mod-ct">+3</span><span class="side mod-both">+10</span></td>
                        <td class="mod-stat"><span class="side mod-side mod-t">78%</span><span class="side mod-side mod-ct">70%</span><span class="side mod-both">74%</span></td>
                        <td class="mod-stat"><span class="side mod-side mod-t">180</span><span class="side mod-side mod-ct">141</span><span class="side mod-both">163</span></td>
                        <td class="mod-stat"><span class="side mod-side mod-t">30%</span><span class="side mod-side mod-ct">25%</span><span class="side mod-both">28%</span></td>
                        <td class="mod-stat"><span class="side mod-side mod-t">3</span><span class="side mod-side mod-ct">1</span><span class="side mod-both">4</span></td>
                        <td class="mod-stat"><span class="side mod-side mod-t">1</span><span class="side mod-side mod-ct">0</span><span class="side mod-both">1</span></td>
                    </tr>
                </tbody></table>
                <table class="wf-table-inset mod-overview"><tbody>
                    <tr>
                        <td class="mod-player"><a href="/player/21/something"><div>something</div></a></td>
                        <td class="mod-agents"><span class="mod-agent"><img src="/img/vlr/game/agents/viper.png"></span></td>
                    </tr>
                </tbody></table>
            </div>
            <div class="vm-stats-game" data-game-id="162035">
                <div class="vm-stats-game-header">
                    <div class="team"><div class="score">TBD</div></div>
                    <div class="map"><div><span>Bind</span></div></div>
                    <div class="team mod-right"><div class="score">TBD</div></div>
                </div>
            </div>
        </div>
        </div></body></html>
    "#;

    pub(crate) const NO_DATA_PAGE: &str = r#"
        <html><body><div class="col mod-3">
        <div class="match-header"></div>
        <div class="vm-stats-container">No data available for this match</div>
        </div></body></html>
    "#;
}
