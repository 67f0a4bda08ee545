//! Storage layer: SQLite persistence for games and play sessions.

pub mod db;
pub mod models;
pub mod stats;

pub use db::{Database, DbConfig, HistoryFilter, StorageError};
pub use models::{GameStatus, PlaySession, TrackedGame};
pub use stats::{DayPeriod, GameTotals};
