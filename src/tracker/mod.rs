//! Process reconciler: drives session open/close from OS process polls.
//!
//! On a fixed interval the reconciler snapshots the running process
//! list, compares each tracked game's executable basename against it
//! (case-insensitively), and opens or closes play sessions on state
//! transitions. Passes are strictly serialized: a pass runs to
//! completion before the next tick fires, so the at-most-one-open-
//! session invariant cannot be violated by overlapping polls.

pub mod procs;
pub mod timer;

pub use procs::{FixedProcesses, ProcessSnapshotProvider, SystemProcesses};
pub use timer::TimerSet;

use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;

use crate::storage::{DbConfig, GameStatus};

/// Events pushed from the tracker to the consuming layer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TrackerEvent {
    /// A game transitioned between running and stopped.
    Status(StatusChange),
    /// Elapsed-time tick for a running game.
    LiveTime { game_id: i64, time: String },
    /// A reconciliation failure; the affected pass or game is retried
    /// on the next tick.
    Error { message: String },
}

/// Outcome of one reconciliation pass: the transitions applied plus
/// any failures encountered along the way.
#[derive(Debug, Default)]
pub struct PollReport {
    pub changes: Vec<StatusChange>,
    pub errors: Vec<String>,
}

/// A single game state transition observed by a reconciliation pass.
#[derive(Debug, Clone, Serialize)]
pub struct StatusChange {
    pub game_id: i64,
    pub game_name: String,
    pub status: GameStatus,
    /// Duration of the most recently closed session (for a stop event,
    /// that is the session that just closed)
    pub last_session_duration: i64,
    /// Start of the now-open session, present on running transitions
    pub session_start: Option<DateTime<Local>>,
}

/// Polls the process list and reconciles per-game running state.
///
/// State starts as stopped for every game; no attempt is made to
/// recover true live state from the OS at startup. A transition is only
/// recorded in memory after the store call succeeds, so a storage
/// failure is retried on the next pass instead of silently diverging.
pub struct Reconciler {
    db: DbConfig,
    provider: Arc<dyn ProcessSnapshotProvider>,
    running: HashMap<i64, bool>,
}

impl Reconciler {
    pub fn new(db: DbConfig, provider: Arc<dyn ProcessSnapshotProvider>) -> Self {
        Self {
            db,
            provider,
            running: HashMap::new(),
        }
    }

    /// Runs one reconciliation pass and reports the transitions applied
    /// and the failures hit.
    ///
    /// A failed process snapshot or database open skips the whole pass
    /// without touching any state; the next scheduled pass retries.
    pub fn poll_once(&mut self) -> PollReport {
        let mut report = PollReport::default();

        let snapshot = match self.provider.running_image_names() {
            Ok(names) => names,
            Err(e) => {
                let message = format!("Skipping reconciliation pass, process snapshot failed: {e}");
                tracing::warn!("{}", message);
                report.errors.push(message);
                return report;
            }
        };

        let db = match self.db.open() {
            Ok(db) => db,
            Err(e) => {
                let message = format!("Skipping reconciliation pass, database unavailable: {e}");
                tracing::warn!("{}", message);
                report.errors.push(message);
                return report;
            }
        };

        let games = match db.list_games() {
            Ok(games) => games,
            Err(e) => {
                let message = format!("Skipping reconciliation pass, could not list games: {e}");
                tracing::warn!("{}", message);
                report.errors.push(message);
                return report;
            }
        };

        for game in games {
            let is_running = snapshot.contains(&game.image_name());
            let was_running = self.running.get(&game.id).copied().unwrap_or(false);

            if is_running && !was_running {
                // Games sharing an executable basename flip together;
                // that mirrors the matching rule rather than fixing it.
                match db.open_session(game.id) {
                    Ok(start) => {
                        self.running.insert(game.id, true);
                        let last_session_duration = match db.last_session_duration(game.id) {
                            Ok(duration) => duration,
                            Err(e) => {
                                tracing::warn!(
                                    "Failed to read last session duration for {}: {}",
                                    game.name,
                                    e
                                );
                                0
                            }
                        };
                        report.changes.push(StatusChange {
                            game_id: game.id,
                            game_name: game.name.clone(),
                            status: GameStatus::Running,
                            last_session_duration,
                            session_start: Some(start),
                        });
                    }
                    Err(e) => {
                        // State not flipped: retried on the next pass
                        let message = format!("Failed to open session for {}: {e}", game.name);
                        tracing::warn!("{}", message);
                        report.errors.push(message);
                    }
                }
            } else if !is_running && was_running {
                match db.close_session(game.id) {
                    Ok(duration) => {
                        self.running.insert(game.id, false);
                        report.changes.push(StatusChange {
                            game_id: game.id,
                            game_name: game.name.clone(),
                            status: GameStatus::Stopped,
                            last_session_duration: duration.unwrap_or(0),
                            session_start: None,
                        });
                    }
                    Err(e) => {
                        let message = format!("Failed to close session for {}: {e}", game.name);
                        tracing::warn!("{}", message);
                        report.errors.push(message);
                    }
                }
            }
        }

        report
    }

    /// Game ids currently believed to be running.
    pub fn running_game_ids(&self) -> Vec<i64> {
        self.running
            .iter()
            .filter(|(_, &running)| running)
            .map(|(&id, _)| id)
            .collect()
    }

    /// Drives reconciliation on a fixed interval until shutdown.
    ///
    /// Ticks are skipped rather than queued when a pass overruns the
    /// interval, keeping passes serialized. Transitions are forwarded to
    /// the event channel and live timers are started/stopped to match.
    pub async fn run(
        mut self,
        interval: Duration,
        events: mpsc::Sender<TrackerEvent>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        let mut timers = TimerSet::new(events.clone());
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.poll_once();
                    for message in report.errors {
                        if events.send(TrackerEvent::Error { message }).await.is_err() {
                            tracing::debug!("Event channel closed, stopping reconciler");
                            timers.stop_all();
                            return;
                        }
                    }
                    for change in report.changes {
                        match change.status {
                            GameStatus::Running => {
                                if let Some(start) = change.session_start {
                                    timers.start(change.game_id, start);
                                }
                            }
                            GameStatus::Stopped => timers.stop(change.game_id),
                        }
                        if events.send(TrackerEvent::Status(change)).await.is_err() {
                            tracing::debug!("Event channel closed, stopping reconciler");
                            timers.stop_all();
                            return;
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Reconciler shutting down");
                    timers.stop_all();
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use anyhow::Result;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Provider whose process set can be swapped between polls.
    struct ScriptedProcesses {
        names: Mutex<HashSet<String>>,
    }

    impl ScriptedProcesses {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                names: Mutex::new(HashSet::new()),
            })
        }

        fn set<const N: usize>(&self, names: [&str; N]) {
            *self.names.lock().unwrap() =
                names.iter().map(|n| n.to_lowercase()).collect();
        }
    }

    impl ProcessSnapshotProvider for ScriptedProcesses {
        fn running_image_names(&self) -> Result<HashSet<String>> {
            Ok(self.names.lock().unwrap().clone())
        }
    }

    /// Provider that always fails, as if the OS query were denied.
    struct BrokenProcesses;

    impl ProcessSnapshotProvider for BrokenProcesses {
        fn running_image_names(&self) -> Result<HashSet<String>> {
            anyhow::bail!("permission denied")
        }
    }

    fn setup() -> (DbConfig, i64, tempfile::TempDir) {
        let dir = tempdir().expect("Failed to create temp directory");
        let db_path = dir.path().join("test.db");
        let db = Database::open(&db_path).expect("Failed to open test database");
        let game_id = db.add_game("Chess", "/apps/Chess.EXE").expect("add");
        (DbConfig::at(db_path), game_id, dir)
    }

    #[test]
    fn test_case_insensitive_match_opens_once() {
        let (config, game_id, _dir) = setup();
        let procs = ScriptedProcesses::new();
        procs.set(["game.exe", "chess.exe"]);

        let mut reconciler = Reconciler::new(config.clone(), procs.clone());

        let report = reconciler.poll_once();
        assert_eq!(report.changes.len(), 1);
        assert_eq!(report.changes[0].game_id, game_id);
        assert_eq!(report.changes[0].status, GameStatus::Running);
        assert!(report.changes[0].session_start.is_some());

        // Still running on subsequent polls: no further transitions, and
        // still exactly one session row
        assert!(reconciler.poll_once().changes.is_empty());
        assert!(reconciler.poll_once().changes.is_empty());

        let db = config.open().expect("open");
        assert_eq!(db.session_count().expect("count"), 1);
        assert!(db.open_session_for(game_id).expect("query").is_some());
    }

    #[test]
    fn test_disappearing_process_closes_session() {
        let (config, game_id, _dir) = setup();
        let procs = ScriptedProcesses::new();
        let mut reconciler = Reconciler::new(config.clone(), procs.clone());

        procs.set(["chess.exe"]);
        reconciler.poll_once();

        procs.set([]);
        let report = reconciler.poll_once();
        assert_eq!(report.changes.len(), 1);
        assert_eq!(report.changes[0].status, GameStatus::Stopped);

        let db = config.open().expect("open");
        assert!(db.open_session_for(game_id).expect("query").is_none());
        let history = db
            .query_history(&crate::storage::HistoryFilter::default())
            .expect("history");
        assert_eq!(history.len(), 1);
        assert!(history[0].end_time.is_some());
        assert_eq!(history[0].duration_minutes, Some(0));
    }

    #[test]
    fn test_no_transition_when_nothing_changes() {
        let (config, _game_id, _dir) = setup();
        let procs = ScriptedProcesses::new();
        let mut reconciler = Reconciler::new(config, procs.clone());

        // Game never appears: no transitions and nothing failed
        let report = reconciler.poll_once();
        assert!(report.changes.is_empty());
        assert!(report.errors.is_empty());
        assert!(reconciler.poll_once().changes.is_empty());
    }

    #[test]
    fn test_snapshot_failure_skips_pass_without_state_change() {
        let (config, game_id, _dir) = setup();
        let procs = ScriptedProcesses::new();
        procs.set(["chess.exe"]);

        let mut reconciler = Reconciler::new(config.clone(), procs.clone());
        reconciler.poll_once();
        assert_eq!(reconciler.running_game_ids(), vec![game_id]);

        // Swap in a broken provider: the pass is skipped entirely, the
        // failure is reported, and the in-memory state is untouched
        reconciler.provider = Arc::new(BrokenProcesses);
        let report = reconciler.poll_once();
        assert!(report.changes.is_empty());
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("process snapshot failed"));
        assert_eq!(reconciler.running_game_ids(), vec![game_id]);

        // Provider recovers; game still running means still no event
        reconciler.provider = procs.clone();
        assert!(reconciler.poll_once().changes.is_empty());

        let db = config.open().expect("open");
        assert_eq!(db.session_count().expect("count"), 1);
    }

    #[test]
    fn test_storage_failure_retried_on_next_pass() {
        let (config, game_id, dir) = setup();
        let db_path = dir.path().join("test.db");
        let parked = dir.path().join("parked.db");

        let procs = ScriptedProcesses::new();
        procs.set(["chess.exe"]);
        let mut reconciler = Reconciler::new(config.clone(), procs.clone());

        // Replace the database file with a directory so opening fails
        std::fs::rename(&db_path, &parked).expect("park db");
        std::fs::create_dir(&db_path).expect("block path");

        let report = reconciler.poll_once();
        assert!(report.changes.is_empty(), "Pass skipped");
        assert_eq!(report.errors.len(), 1, "Failure reported");
        assert!(reconciler.running_game_ids().is_empty(), "State untouched");

        // Restore the database: the very next pass applies the transition
        std::fs::remove_dir(&db_path).expect("unblock path");
        std::fs::rename(&parked, &db_path).expect("restore db");

        let report = reconciler.poll_once();
        assert_eq!(report.changes.len(), 1);
        assert_eq!(report.changes[0].status, GameStatus::Running);
        assert_eq!(reconciler.running_game_ids(), vec![game_id]);
    }

    #[test]
    fn test_games_sharing_basename_flip_together() {
        let dir = tempdir().expect("Failed to create temp directory");
        let db_path = dir.path().join("test.db");
        let db = Database::open(&db_path).expect("open");
        let a = db.add_game("Chess", "/apps/chess.exe").expect("add");
        let b = db.add_game("Chess Mirror", "/backup/chess.exe").expect("add");
        drop(db);

        let procs = ScriptedProcesses::new();
        procs.set(["chess.exe"]);
        let mut reconciler = Reconciler::new(DbConfig::at(db_path), procs);

        let report = reconciler.poll_once();
        let ids: Vec<i64> = report.changes.iter().map(|c| c.game_id).collect();
        assert!(ids.contains(&a) && ids.contains(&b), "Both games transition");
    }

    #[test]
    fn test_running_event_carries_last_session_duration() {
        let (config, game_id, _dir) = setup();
        let procs = ScriptedProcesses::new();
        let mut reconciler = Reconciler::new(config, procs.clone());

        // First run: no history yet
        procs.set(["chess.exe"]);
        let changes = reconciler.poll_once().changes;
        assert_eq!(changes[0].last_session_duration, 0);

        // Stop, then start again: the stop event reports the closed
        // duration, and the next start reports it too
        procs.set([]);
        let changes = reconciler.poll_once().changes;
        assert_eq!(changes[0].status, GameStatus::Stopped);
        assert_eq!(changes[0].last_session_duration, 0);

        procs.set(["chess.exe"]);
        let changes = reconciler.poll_once().changes;
        assert_eq!(changes[0].status, GameStatus::Running);
        assert_eq!(changes[0].game_id, game_id);
        assert_eq!(changes[0].last_session_duration, 0);
    }
}
