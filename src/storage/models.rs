//! Core data models for playtrack
//!
//! A TrackedGame is a user-registered executable the daemon watches for.
//! A PlaySession is one contiguous interval during which that executable
//! was observed running.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// A game registered for tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedGame {
    /// Row id assigned by the store at creation
    pub id: i64,

    /// Display name (e.g., "Chess")
    pub name: String,

    /// Path to the executable; the basename is matched case-insensitively
    /// against running process image names
    pub exe_path: String,
}

impl TrackedGame {
    /// Lowercased basename of the executable path, the key used for
    /// process matching.
    pub fn image_name(&self) -> String {
        std::path::Path::new(&self.exe_path)
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| self.exe_path.to_lowercase())
    }
}

/// One observed run of a tracked game.
///
/// `game_name` and `exe_path` are copied from the game at open time so
/// history stays meaningful if the game is later renamed or removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaySession {
    /// Row id assigned by the store at creation
    pub id: i64,

    /// Game this session belongs to (not enforced to still exist)
    pub game_id: i64,

    /// Game name at the time the session opened
    pub game_name: String,

    /// Executable path at the time the session opened
    pub exe_path: String,

    /// When the game process was first observed
    pub start_time: DateTime<Local>,

    /// When the process disappeared (None while the session is open)
    pub end_time: Option<DateTime<Local>>,

    /// Whole minutes between start and end, derived at close time
    pub duration_minutes: Option<i64>,
}

impl PlaySession {
    /// True once the session has been closed.
    pub fn is_closed(&self) -> bool {
        self.end_time.is_some()
    }
}

/// Running/stopped state of a tracked game as seen by the reconciler.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Running,
    Stopped,
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameStatus::Running => write!(f, "running"),
            GameStatus::Stopped => write!(f, "stopped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_name_lowercases_basename() {
        let game = TrackedGame {
            id: 1,
            name: "Chess".to_string(),
            exe_path: "/apps/Games/Chess.EXE".to_string(),
        };
        assert_eq!(game.image_name(), "chess.exe");
    }

    #[test]
    fn test_image_name_bare_filename() {
        let game = TrackedGame {
            id: 1,
            name: "Rocket".to_string(),
            exe_path: "Rocket.exe".to_string(),
        };
        assert_eq!(game.image_name(), "rocket.exe");
    }

    #[test]
    fn test_game_status_display() {
        assert_eq!(GameStatus::Running.to_string(), "running");
        assert_eq!(GameStatus::Stopped.to_string(), "stopped");
    }

    #[test]
    fn test_is_closed() {
        let mut session = PlaySession {
            id: 1,
            game_id: 1,
            game_name: "Chess".to_string(),
            exe_path: "/apps/chess.exe".to_string(),
            start_time: Local::now(),
            end_time: None,
            duration_minutes: None,
        };
        assert!(!session.is_closed());
        session.end_time = Some(Local::now());
        assert!(session.is_closed());
    }
}
