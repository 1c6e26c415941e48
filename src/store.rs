use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use crate::error::Result;
use crate::model::{GameStats, Link, MatchStats, PlayerStats};

/// SQLite-backed storage for links, matches, games and player stats.
///
/// The visited flag on a link is monotonic: it is only ever flipped from
/// unvisited to visited, by [`MatchStore::mark_visited`], and never reverts.
#[derive(Clone)]
pub struct MatchStore {
    pool: SqlitePool,
}

impl MatchStore {
    /// Open (creating if missing) the database at `url`, e.g.
    /// `sqlite://vlr-stats.db`.
    pub async fn connect(url: &str) -> Result<Self> {
        // WAL keeps concurrent worker writes from tripping over readers
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool. Use this to control pooling yourself, e.g. an
    /// in-memory database in tests.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS links (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT NOT NULL UNIQUE,
                visited INTEGER NOT NULL DEFAULT 0,
                visited_at TEXT
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS matches (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT,
                patch TEXT NOT NULL DEFAULT '',
                team_1_name TEXT NOT NULL,
                team_2_name TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS games (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                match_id INTEGER NOT NULL REFERENCES matches(id),
                map TEXT NOT NULL,
                team_1_score INTEGER NOT NULL,
                team_2_score INTEGER NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS players (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                game_id INTEGER NOT NULL REFERENCES games(id),
                player TEXT NOT NULL,
                agent TEXT NOT NULL,
                team INTEGER NOT NULL,
                side TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert unvisited rows for urls not already present. Idempotent on
    /// url; returns how many rows were actually inserted.
    pub async fn record_new_links(&self, urls: &[String]) -> Result<u64> {
        let mut inserted = 0;
        for url in urls {
            inserted += sqlx::query("INSERT OR IGNORE INTO links (url, visited) VALUES (?1, 0)")
                .bind(url)
                .execute(&self.pool)
                .await?
                .rows_affected();
        }
        Ok(inserted)
    }

    /// The resumption cursor: url of the most recently visited link, or
    /// None when nothing has ever been visited.
    pub async fn last_visited_url(&self) -> Result<Option<String>> {
        let row = sqlx::query(
            "SELECT url FROM links WHERE visited = 1 ORDER BY visited_at DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.get("url")))
    }

    /// Unvisited links, oldest first. A negative limit returns the whole
    /// backlog (SQLite treats it as unbounded).
    pub async fn unvisited_links(&self, limit: i64) -> Result<Vec<Link>> {
        let rows = sqlx::query(
            "SELECT id, url, visited, visited_at FROM links WHERE visited = 0 ORDER BY id LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| Link {
                id: r.get("id"),
                url: r.get("url"),
                visited: r.get("visited"),
                visited_at: r.get::<Option<DateTime<Utc>>, _>("visited_at"),
            })
            .collect())
    }

    /// Flip a link to visited, stamping the time. The sole mutation path
    /// for the flag; a second call for the same link is a no-op.
    pub async fn mark_visited(&self, link_id: i64) -> Result<()> {
        sqlx::query("UPDATE links SET visited = 1, visited_at = ?1 WHERE id = ?2 AND visited = 0")
            .bind(Utc::now())
            .bind(link_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Insert the match row and return its generated id.
    pub async fn insert_match(&self, stats: &MatchStats) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO matches (date, patch, team_1_name, team_2_name) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(stats.date)
        .bind(&stats.patch)
        .bind(&stats.team_1_name)
        .bind(&stats.team_2_name)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Insert one game row under `match_id` and return its generated id.
    pub async fn insert_game(&self, match_id: i64, game: &GameStats) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO games (match_id, map, team_1_score, team_2_score) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(match_id)
        .bind(&game.map)
        .bind(game.team_1_score)
        .bind(game.team_2_score)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Insert one player row under `game_id`. The per-side stat records go
    /// into a single JSON document (`side`, `ACS`, `KAST`, ...).
    pub async fn insert_player(&self, game_id: i64, player: &PlayerStats) -> Result<()> {
        let side = serde_json::to_string(&player.side)?;
        sqlx::query(
            "INSERT INTO players (game_id, player, agent, team, side) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(game_id)
        .bind(&player.player)
        .bind(&player.agent)
        .bind(player.team)
        .bind(side)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
