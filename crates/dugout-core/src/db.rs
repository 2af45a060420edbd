// SQLite persistence layer for teams, best-order templates and roster moves.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

/// One line of the roster transaction log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterMoveRecord {
    pub player_name: String,
    /// `promoted`, `demoted`, `released`, `signed`, `transferred`.
    pub kind: String,
    pub detail: String,
}

/// A stored move as read back from the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedMove {
    pub team_name: String,
    pub record: RosterMoveRecord,
    pub recorded_at: String,
}

/// SQLite-backed persistence. Teams and templates are stored as JSON
/// documents keyed by team name; the move log is relational.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS teams (
                name       TEXT PRIMARY KEY,
                data       TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS best_orders (
                team_name  TEXT PRIMARY KEY REFERENCES teams(name) ON DELETE CASCADE,
                data       TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS roster_moves (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                team_name   TEXT NOT NULL REFERENCES teams(name) ON DELETE CASCADE,
                player_name TEXT NOT NULL,
                kind        TEXT NOT NULL,
                detail      TEXT NOT NULL DEFAULT '',
                recorded_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_roster_moves_team ON roster_moves(team_name);

            CREATE TABLE IF NOT EXISTS game_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    fn now() -> String {
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
    }

    // ------------------------------------------------------------------
    // Teams
    // ------------------------------------------------------------------

    /// Insert or replace a team document.
    pub fn save_team(&self, name: &str, team: &serde_json::Value) -> Result<()> {
        self.commit_team(name, team, &[])
    }

    /// Write a team document and its move log in one transaction. Either
    /// both land or neither does.
    pub fn commit_team(
        &self,
        name: &str,
        team: &serde_json::Value,
        moves: &[RosterMoveRecord],
    ) -> Result<()> {
        let mut conn = self.conn();
        let json_str = serde_json::to_string(team).context("failed to serialize team")?;
        let now = Self::now();

        let tx = conn.transaction().context("failed to begin transaction")?;
        tx.execute(
            "INSERT INTO teams (name, data, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET
                data       = excluded.data,
                updated_at = excluded.updated_at",
            params![name, json_str, now],
        )
        .context("failed to upsert team")?;

        for record in moves {
            tx.execute(
                "INSERT INTO roster_moves (team_name, player_name, kind, detail, recorded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![name, record.player_name, record.kind, record.detail, now],
            )
            .context("failed to record roster move")?;
        }

        tx.commit().context("failed to commit team")?;
        debug!("committed team '{}' with {} roster moves", name, moves.len());
        Ok(())
    }

    /// Load a team document. Returns `None` if no team of that name exists.
    pub fn load_team(&self, name: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.conn();
        let json_str: Option<String> = conn
            .query_row(
                "SELECT data FROM teams WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query team")?;

        match json_str {
            Some(s) => {
                let value = serde_json::from_str(&s).context("failed to deserialize team")?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Names of all stored teams, alphabetically.
    pub fn list_teams(&self) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT name FROM teams ORDER BY name")
            .context("failed to prepare list_teams query")?;
        let names = stmt
            .query_map([], |row| row.get(0))
            .context("failed to query teams")?
            .collect::<std::result::Result<Vec<String>, _>>()
            .context("failed to map team rows")?;
        Ok(names)
    }

    // ------------------------------------------------------------------
    // Best-order templates
    // ------------------------------------------------------------------

    /// Store the template for a team, replacing any previous one. The team
    /// must already exist.
    pub fn save_best_order(&self, team_name: &str, order: &serde_json::Value) -> Result<()> {
        let conn = self.conn();
        let json_str = serde_json::to_string(order).context("failed to serialize best order")?;
        conn.execute(
            "INSERT OR REPLACE INTO best_orders (team_name, data, updated_at) VALUES (?1, ?2, ?3)",
            params![team_name, json_str, Self::now()],
        )
        .context("failed to save best order")?;
        Ok(())
    }

    /// Load the raw template document for a team, whatever shape it was
    /// stored in. A row that is not valid JSON counts as no template.
    pub fn load_best_order(&self, team_name: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.conn();
        let json_str: Option<String> = conn
            .query_row(
                "SELECT data FROM best_orders WHERE team_name = ?1",
                params![team_name],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query best order")?;

        let Some(s) = json_str else {
            return Ok(None);
        };
        match serde_json::from_str(&s) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("ignoring unreadable best order for {}: {}", team_name, e);
                Ok(None)
            }
        }
    }

    // ------------------------------------------------------------------
    // Move log
    // ------------------------------------------------------------------

    /// All logged moves for a team, oldest first.
    pub fn load_moves(&self, team_name: &str) -> Result<Vec<LoggedMove>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT team_name, player_name, kind, detail, recorded_at
                 FROM roster_moves WHERE team_name = ?1 ORDER BY id",
            )
            .context("failed to prepare load_moves query")?;

        let moves = stmt
            .query_map(params![team_name], |row| {
                Ok(LoggedMove {
                    team_name: row.get(0)?,
                    record: RosterMoveRecord {
                        player_name: row.get(1)?,
                        kind: row.get(2)?,
                        detail: row.get(3)?,
                    },
                    recorded_at: row.get(4)?,
                })
            })
            .context("failed to query roster moves")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map roster move rows")?;

        Ok(moves)
    }

    // ------------------------------------------------------------------
    // Key-value game state
    // ------------------------------------------------------------------

    /// Persist an arbitrary JSON value under `key`.
    pub fn save_state(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let conn = self.conn();
        let json_str =
            serde_json::to_string(value).context("failed to serialize state value")?;
        conn.execute(
            "INSERT OR REPLACE INTO game_state (key, value) VALUES (?1, ?2)",
            params![key, json_str],
        )
        .context("failed to save state")?;
        Ok(())
    }

    /// Load a previously saved JSON value by `key`.
    pub fn load_state(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.conn();
        let json_str: Option<String> = conn
            .query_row(
                "SELECT value FROM game_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query game state")?;

        match json_str {
            Some(s) => Ok(Some(
                serde_json::from_str(&s).context("failed to deserialize state value")?,
            )),
            None => Ok(None),
        }
    }

    fn game_day_key(team_name: &str) -> String {
        format!("game_day:{team_name}")
    }

    /// Current simulated day of `team_name`'s season (0 before the first
    /// day). Each team keeps its own calendar.
    pub fn game_day(&self, team_name: &str) -> Result<u32> {
        let value = self.load_state(&Self::game_day_key(team_name))?;
        Ok(value
            .and_then(|v| v.as_u64())
            .map(|d| d as u32)
            .unwrap_or(0))
    }

    pub fn set_game_day(&self, team_name: &str, day: u32) -> Result<()> {
        self.save_state(&Self::game_day_key(team_name), &serde_json::Value::from(day))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_db() -> Database {
        Database::open(":memory:").expect("in-memory database should open")
    }

    fn demotion(name: &str) -> RosterMoveRecord {
        RosterMoveRecord {
            player_name: name.to_string(),
            kind: "demoted".to_string(),
            detail: "cooldown 10 days".to_string(),
        }
    }

    #[test]
    fn open_creates_tables() {
        let db = test_db();
        let conn = db.conn();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        for expected in ["teams", "best_orders", "roster_moves", "game_state"] {
            assert!(tables.contains(&expected.to_string()), "missing table {expected}");
        }
    }

    #[test]
    fn save_and_load_team_round_trip() {
        let db = test_db();
        let doc = json!({"name": "Mariners", "order_initialized": false});
        db.save_team("Mariners", &doc).unwrap();

        assert_eq!(db.load_team("Mariners").unwrap(), Some(doc));
        assert!(db.load_team("Gulls").unwrap().is_none());
    }

    #[test]
    fn save_team_overwrites_previous_document() {
        let db = test_db();
        db.save_team("Mariners", &json!({"v": 1})).unwrap();
        db.save_team("Mariners", &json!({"v": 2})).unwrap();

        assert_eq!(db.load_team("Mariners").unwrap(), Some(json!({"v": 2})));
        assert_eq!(db.list_teams().unwrap(), vec!["Mariners".to_string()]);
    }

    #[test]
    fn commit_team_logs_moves_in_order() {
        let db = test_db();
        db.commit_team("Mariners", &json!({}), &[demotion("A"), demotion("B")])
            .unwrap();

        let moves = db.load_moves("Mariners").unwrap();
        assert_eq!(moves.len(), 2);
        assert_eq!(moves[0].record.player_name, "A");
        assert_eq!(moves[1].record.player_name, "B");
        assert!(moves[0].recorded_at.contains('T'));
    }

    #[test]
    fn best_order_requires_existing_team() {
        let db = test_db();
        assert!(db.save_best_order("Nobody", &json!([1, 2, 3])).is_err());

        db.save_team("Mariners", &json!({})).unwrap();
        db.save_best_order("Mariners", &json!([1, 2, 3])).unwrap();
        assert_eq!(
            db.load_best_order("Mariners").unwrap(),
            Some(json!([1, 2, 3]))
        );
    }

    #[test]
    fn corrupt_best_order_row_reads_as_absent() {
        let db = test_db();
        db.save_team("Mariners", &json!({})).unwrap();
        db.conn()
            .execute(
                "INSERT INTO best_orders (team_name, data, updated_at) VALUES ('Mariners', '{not json', 'x')",
                [],
            )
            .unwrap();

        assert_eq!(db.load_best_order("Mariners").unwrap(), None);
    }

    #[test]
    fn game_day_defaults_to_zero_and_is_kept_per_team() {
        let db = test_db();
        assert_eq!(db.game_day("Mariners").unwrap(), 0);
        db.set_game_day("Mariners", 12).unwrap();
        assert_eq!(db.game_day("Mariners").unwrap(), 12);
        assert_eq!(db.game_day("Gulls").unwrap(), 0);
    }

    #[test]
    fn list_teams_sorted() {
        let db = test_db();
        db.save_team("Swallows", &json!({})).unwrap();
        db.save_team("Carp", &json!({})).unwrap();
        assert_eq!(
            db.list_teams().unwrap(),
            vec!["Carp".to_string(), "Swallows".to_string()]
        );
    }
}
