//! Daemon runtime state.
//!
//! Coordination between the running daemon and CLI commands happens
//! through files in `~/.playtrack/`: a PID file for liveness checks, a
//! Unix socket for IPC, and a log file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;

use crate::storage::GameStatus;

/// Paths for the PID file, IPC socket, and log file.
pub struct DaemonState {
    /// `~/.playtrack/daemon.pid`
    pub pid_file: PathBuf,
    /// `~/.playtrack/daemon.sock`
    pub socket_path: PathBuf,
    /// `~/.playtrack/daemon.log`
    pub log_file: PathBuf,
}

impl DaemonState {
    /// Creates the state paths, making `~/.playtrack/` if needed.
    pub fn new() -> Result<Self> {
        let dir = dirs::home_dir()
            .context("Could not find home directory")?
            .join(".playtrack");

        fs::create_dir_all(&dir).context("Failed to create ~/.playtrack directory")?;

        Ok(Self {
            pid_file: dir.join("daemon.pid"),
            socket_path: dir.join("daemon.sock"),
            log_file: dir.join("daemon.log"),
        })
    }

    /// True when a PID file exists and that process is still alive.
    pub fn is_running(&self) -> bool {
        match self.get_pid() {
            Some(pid) => Self::process_exists(pid),
            None => false,
        }
    }

    /// PID from the PID file, or `None` if absent or unparseable.
    pub fn get_pid(&self) -> Option<u32> {
        if !self.pid_file.exists() {
            return None;
        }

        let mut file = fs::File::open(&self.pid_file).ok()?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).ok()?;

        contents.trim().parse().ok()
    }

    /// Writes the given PID to the PID file.
    pub fn write_pid(&self, pid: u32) -> Result<()> {
        let mut file = fs::File::create(&self.pid_file).context("Failed to create PID file")?;
        write!(file, "{pid}").context("Failed to write PID")?;
        Ok(())
    }

    /// Removes the PID file if present.
    pub fn remove_pid(&self) -> Result<()> {
        if self.pid_file.exists() {
            fs::remove_file(&self.pid_file).context("Failed to remove PID file")?;
        }
        Ok(())
    }

    /// Removes the socket file if present.
    pub fn remove_socket(&self) -> Result<()> {
        if self.socket_path.exists() {
            fs::remove_file(&self.socket_path).context("Failed to remove socket file")?;
        }
        Ok(())
    }

    /// Removes all coordination files; called on graceful shutdown.
    pub fn cleanup(&self) -> Result<()> {
        self.remove_pid()?;
        self.remove_socket()?;
        Ok(())
    }

    /// Liveness probe via `kill(pid, 0)`, which checks existence
    /// without delivering a signal.
    fn process_exists(pid: u32) -> bool {
        #[cfg(unix)]
        {
            // SAFETY: signal 0 performs only an existence check.
            unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
        }

        #[cfg(not(unix))]
        {
            let _ = pid;
            true
        }
    }
}

/// Counters accumulated while the daemon runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonStats {
    /// Number of games registered for tracking
    pub games_tracked: usize,
    /// Sessions opened since the daemon started
    pub sessions_opened: u64,
    /// Sessions closed since the daemon started
    pub sessions_closed: u64,
    /// Errors encountered
    pub errors: u64,
    /// When the daemon started
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl Default for DaemonStats {
    fn default() -> Self {
        Self {
            games_tracked: 0,
            sessions_opened: 0,
            sessions_closed: 0,
            errors: 0,
            started_at: chrono::Utc::now(),
        }
    }
}

/// Last known status of one game, as reported over IPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameLiveStatus {
    pub game_id: i64,
    pub game_name: String,
    pub status: GameStatus,
    /// Formatted elapsed time for a running game (`"12m 4s"`)
    pub live_time: Option<String>,
    /// Duration in minutes of the most recently closed session
    pub last_session_duration: i64,
}

/// Everything the IPC server reads: counters plus per-game status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeState {
    pub stats: DaemonStats,
    pub games: HashMap<i64, GameLiveStatus>,
}
