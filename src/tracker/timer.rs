//! Per-game live elapsed-time tickers.
//!
//! Each running game gets one tokio task that, once per second, formats
//! the wall-clock time since the session opened and pushes it to the
//! event channel for display. Timers hold no shared state with the
//! store; they only read the clock.

use chrono::{DateTime, Local};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::TrackerEvent;

/// Formats elapsed whole seconds as `"{minutes}m {seconds}s"`.
pub fn format_elapsed(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{}m {}s", seconds / 60, seconds % 60)
}

/// Owns the live timer task for each running game.
pub struct TimerSet {
    timers: HashMap<i64, JoinHandle<()>>,
    events: mpsc::Sender<TrackerEvent>,
}

impl TimerSet {
    pub fn new(events: mpsc::Sender<TrackerEvent>) -> Self {
        Self {
            timers: HashMap::new(),
            events,
        }
    }

    /// Starts the ticker for a game. Starting a game that already has a
    /// timer replaces it, so there is never more than one per game.
    pub fn start(&mut self, game_id: i64, session_start: DateTime<Local>) {
        self.stop(game_id);

        let events = self.events.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
            loop {
                interval.tick().await;
                let elapsed = (Local::now() - session_start).num_seconds();
                let event = TrackerEvent::LiveTime {
                    game_id,
                    time: format_elapsed(elapsed),
                };
                if events.send(event).await.is_err() {
                    // Receiver gone, the daemon is shutting down
                    break;
                }
            }
        });
        self.timers.insert(game_id, handle);
    }

    /// Cancels the ticker for a game. Stopping a game with no timer is
    /// a no-op.
    pub fn stop(&mut self, game_id: i64) {
        if let Some(handle) = self.timers.remove(&game_id) {
            handle.abort();
        }
    }

    /// Cancels every ticker.
    pub fn stop_all(&mut self) {
        for (_, handle) in self.timers.drain() {
            handle.abort();
        }
    }

    /// Number of games with a live timer.
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

impl Drop for TimerSet {
    fn drop(&mut self) {
        self.stop_all();
    }
}
