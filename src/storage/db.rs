//! SQLite storage layer for playtrack

use chrono::{DateTime, Local, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

use super::models::{PlaySession, TrackedGame};
use super::stats;

/// Errors surfaced by the session store.
///
/// Kept separate from `anyhow` so the reconciler can treat any storage
/// failure as "transition not yet applied" and retry on the next pass.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("game {0} is not registered")]
    UnknownGame(i64),

    #[error("could not locate home directory")]
    NoHomeDir,

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Get the default database path (`~/.playtrack/playtrack.db`).
pub fn default_db_path() -> Result<PathBuf, StorageError> {
    let config_dir = dirs::home_dir()
        .ok_or(StorageError::NoHomeDir)?
        .join(".playtrack");

    std::fs::create_dir_all(&config_dir)?;
    Ok(config_dir.join("playtrack.db"))
}

/// Database path holder for creating connections within async tasks.
/// rusqlite connections are not thread-safe, so the reconciler opens a
/// fresh connection per pass rather than sharing one across tasks.
#[derive(Clone)]
pub struct DbConfig {
    path: PathBuf,
}

impl DbConfig {
    /// Creates a DbConfig for the default database location.
    pub fn default_config() -> Result<Self, StorageError> {
        Ok(Self {
            path: default_db_path()?,
        })
    }

    /// Creates a DbConfig for an explicit path.
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    /// Opens a new database connection.
    pub fn open(&self) -> Result<Database, StorageError> {
        Database::open(&self.path)
    }
}

/// Filter applied to session history and aggregate queries.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    /// Case-insensitive substring match on the game name
    pub game: Option<String>,
    /// Inclusive lower day bound on the local date of `start_time`
    pub from: Option<NaiveDate>,
    /// Inclusive upper day bound on the local date of `start_time`
    pub to: Option<NaiveDate>,
}

impl HistoryFilter {
    /// True when the session passes every set criterion.
    pub fn matches(&self, session: &PlaySession) -> bool {
        if let Some(ref needle) = self.game {
            if !session
                .game_name
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        let date = session.start_time.date_naive();
        if let Some(from) = self.from {
            if date < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if date > to {
                return false;
            }
        }
        true
    }
}

/// Database connection wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create the database
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open the default database
    pub fn open_default() -> Result<Self, StorageError> {
        let path = default_db_path()?;
        Self::open(&path)
    }

    /// Run migrations
    fn migrate(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS games (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                exe_path TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY,
                game_id INTEGER NOT NULL,
                game_name TEXT NOT NULL,
                exe_path TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT,
                duration INTEGER
            );

            -- Indexes for common queries
            CREATE INDEX IF NOT EXISTS idx_sessions_game_id ON sessions(game_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_start_time ON sessions(start_time);
            "#,
        )?;
        Ok(())
    }

    // ==================== Games ====================

    /// Register a game for tracking.
    ///
    /// A duplicate executable path (compared case-insensitively) is a
    /// logged no-op that returns the already-registered game's id.
    pub fn add_game(&self, name: &str, exe_path: &str) -> Result<i64, StorageError> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM games WHERE LOWER(exe_path) = LOWER(?1)",
                params![exe_path],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            tracing::info!("Game with executable {} is already tracked (id {})", exe_path, id);
            return Ok(id);
        }

        self.conn.execute(
            "INSERT INTO games (name, exe_path) VALUES (?1, ?2)",
            params![name, exe_path],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// List all tracked games.
    pub fn list_games(&self) -> Result<Vec<TrackedGame>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, exe_path FROM games ORDER BY id")?;
        let rows = stmt.query_map([], Self::row_to_game)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Get a tracked game by id.
    pub fn get_game(&self, id: i64) -> Result<Option<TrackedGame>, StorageError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, exe_path FROM games WHERE id = ?1",
                params![id],
                Self::row_to_game,
            )
            .optional()?)
    }

    fn row_to_game(row: &rusqlite::Row) -> rusqlite::Result<TrackedGame> {
        Ok(TrackedGame {
            id: row.get(0)?,
            name: row.get(1)?,
            exe_path: row.get(2)?,
        })
    }

    // ==================== Sessions ====================

    /// Open a play session for a game.
    ///
    /// If an open session already exists the call is a no-op (the
    /// reconciler double-detecting a running game must not create a
    /// second row) and the existing session's start time is returned.
    pub fn open_session(&self, game_id: i64) -> Result<DateTime<Local>, StorageError> {
        let game = self
            .get_game(game_id)?
            .ok_or(StorageError::UnknownGame(game_id))?;

        if let Some(open) = self.open_session_for(game_id)? {
            tracing::debug!("Session for game {} is already open", game_id);
            return Ok(open.start_time);
        }

        let now = Local::now();
        self.conn.execute(
            r#"
            INSERT INTO sessions (game_id, game_name, exe_path, start_time)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![game.id, game.name, game.exe_path, now.to_rfc3339()],
        )?;
        tracing::info!("Opened session for {} at {}", game.name, now.to_rfc3339());
        Ok(now)
    }

    /// Close the open session for a game, storing the end time and the
    /// derived duration in whole minutes.
    ///
    /// Returns the stored duration, or `None` (no-op) when the game has
    /// no open session.
    pub fn close_session(&self, game_id: i64) -> Result<Option<i64>, StorageError> {
        let Some(open) = self.open_session_for(game_id)? else {
            tracing::debug!("No open session for game {}, nothing to close", game_id);
            return Ok(None);
        };

        let end = Local::now();
        let duration = (end - open.start_time).num_minutes();
        self.conn.execute(
            "UPDATE sessions SET end_time = ?1, duration = ?2 WHERE id = ?3",
            params![end.to_rfc3339(), duration, open.id],
        )?;
        tracing::info!(
            "Closed session for {} after {} minutes",
            open.game_name,
            duration
        );
        Ok(Some(duration))
    }

    /// The open session for a game, if any. The open/close contract
    /// guarantees at most one.
    pub fn open_session_for(&self, game_id: i64) -> Result<Option<PlaySession>, StorageError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, game_id, game_name, exe_path, start_time, end_time, duration
                 FROM sessions WHERE game_id = ?1 AND end_time IS NULL",
                params![game_id],
                Self::row_to_session,
            )
            .optional()?)
    }

    /// Session history matching a filter, newest first.
    pub fn query_history(&self, filter: &HistoryFilter) -> Result<Vec<PlaySession>, StorageError> {
        // Day-bound filtering uses the local date of start_time, so rows
        // are filtered in Rust rather than with SQLite date(), which
        // normalizes to UTC.
        let mut sessions = self.all_sessions_desc()?;
        sessions.retain(|s| filter.matches(s));
        Ok(sessions)
    }

    /// Closed sessions matching a filter, in chronological order.
    ///
    /// This is the insights feed: open rows are excluded and the
    /// ascending order keeps the duration-trend metric meaningful.
    pub fn closed_sessions(&self, filter: &HistoryFilter) -> Result<Vec<PlaySession>, StorageError> {
        let mut sessions = self.all_sessions_desc()?;
        sessions.retain(|s| s.is_closed() && filter.matches(s));
        sessions.reverse();
        Ok(sessions)
    }

    fn all_sessions_desc(&self) -> Result<Vec<PlaySession>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, game_id, game_name, exe_path, start_time, end_time, duration
             FROM sessions
             ORDER BY start_time DESC",
        )?;
        let rows = stmt.query_map([], Self::row_to_session)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Duration of the most recently closed session for a game, or 0.
    pub fn last_session_duration(&self, game_id: i64) -> Result<i64, StorageError> {
        let duration: Option<i64> = self
            .conn
            .query_row(
                "SELECT duration FROM sessions
                 WHERE game_id = ?1 AND end_time IS NOT NULL
                 ORDER BY end_time DESC LIMIT 1",
                params![game_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(duration.unwrap_or(0))
    }

    fn row_to_session(row: &rusqlite::Row) -> rusqlite::Result<PlaySession> {
        Ok(PlaySession {
            id: row.get(0)?,
            game_id: row.get(1)?,
            game_name: row.get(2)?,
            exe_path: row.get(3)?,
            start_time: chrono::DateTime::parse_from_rfc3339(&row.get::<_, String>(4)?)
                .unwrap()
                .with_timezone(&Local),
            end_time: row.get::<_, Option<String>>(5)?.map(|s| {
                chrono::DateTime::parse_from_rfc3339(&s)
                    .unwrap()
                    .with_timezone(&Local)
            }),
            duration_minutes: row.get(6)?,
        })
    }

    // ==================== Aggregates ====================

    /// Per-game totals (total/average/max duration, session count) over
    /// closed sessions matching the filter.
    pub fn playtime_by_game(
        &self,
        filter: &HistoryFilter,
    ) -> Result<Vec<stats::GameTotals>, StorageError> {
        Ok(stats::playtime_by_game(&self.closed_sessions(filter)?))
    }

    /// Total minutes per local calendar date.
    pub fn playtime_by_day(
        &self,
        filter: &HistoryFilter,
    ) -> Result<Vec<(NaiveDate, i64)>, StorageError> {
        Ok(stats::playtime_by_day(&self.closed_sessions(filter)?))
    }

    /// Total minutes per weekday.
    pub fn playtime_by_weekday(
        &self,
        filter: &HistoryFilter,
    ) -> Result<Vec<(chrono::Weekday, i64)>, StorageError> {
        Ok(stats::playtime_by_weekday(&self.closed_sessions(filter)?))
    }

    /// Total minutes per day period (night/morning/afternoon/evening).
    pub fn playtime_by_period(
        &self,
        filter: &HistoryFilter,
    ) -> Result<Vec<(stats::DayPeriod, i64)>, StorageError> {
        Ok(stats::playtime_by_period(&self.closed_sessions(filter)?))
    }

    // ==================== Counts ====================

    /// Total tracked game count
    pub fn game_count(&self) -> Result<i64, StorageError> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM games", [], |row| row.get(0))?)
    }

    /// Total session count
    pub fn session_count(&self) -> Result<i64, StorageError> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?)
    }
}
