//! Background daemon for automatic play session tracking.
//!
//! The daemon polls the OS process list on a fixed interval, opens and
//! closes play sessions when tracked games start or stop, and keeps a
//! live elapsed-time reading for every running game. It provides:
//!
//! - Process-list reconciliation on a configurable interval
//! - Per-game live timers for running games
//! - Unix socket IPC for CLI communication
//! - Graceful shutdown handling
//!
//! # Architecture
//!
//! Three components cooperate:
//!
//! - **Reconciler**: Polls processes and records session transitions
//! - **Server**: Handles IPC commands from the CLI (status, games, stats)
//! - **State**: Manages the PID file, socket path, and runtime state
//!
//! The daemon is typically started via `playtrack daemon start` and
//! stopped via `playtrack daemon stop`.

pub mod server;
pub mod state;

use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing_appender::non_blocking::WorkerGuard;

use crate::config::Config;
use crate::storage::{DbConfig, GameStatus};
use crate::tracker::{Reconciler, SystemProcesses, TrackerEvent};

pub use server::{send_command_sync, DaemonCommand, DaemonResponse};
pub use state::{DaemonState, DaemonStats, GameLiveStatus, RuntimeState};

/// Runs the daemon in the foreground.
///
/// This is the main entry point for the daemon. It:
/// 1. Checks if another instance is already running
/// 2. Sets up logging to a file
/// 3. Writes the PID file
/// 4. Starts the reconciler and IPC server
/// 5. Waits for a shutdown signal (SIGTERM/SIGINT or stop command)
/// 6. Cleans up state files on exit
///
/// # Errors
///
/// Returns an error if another daemon instance is already running or
/// the database cannot be opened.
pub async fn run_daemon() -> Result<()> {
    let state = DaemonState::new()?;

    if state.is_running() {
        anyhow::bail!(
            "Daemon is already running (PID {})",
            state.get_pid().unwrap_or(0)
        );
    }

    let _guard = setup_logging(&state)?;

    tracing::info!("Starting playtrack daemon...");

    let config = Config::load()?;
    let db_config = match &config.db_path {
        Some(path) => DbConfig::at(path.clone()),
        None => DbConfig::default_config()?,
    };

    // Open once up front so a bad database path fails fast
    let db = db_config.open()?;
    let games_tracked = db.game_count()? as usize;
    drop(db);

    let pid = std::process::id();
    state.write_pid(pid)?;
    tracing::info!(
        "Daemon started with PID {}, tracking {} game(s), polling every {}s",
        pid,
        games_tracked,
        config.poll_interval_secs
    );

    let mut runtime = RuntimeState::default();
    runtime.stats.games_tracked = games_tracked;
    let runtime = Arc::new(RwLock::new(runtime));

    // Create shutdown channels
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let (broadcast_tx, _) = tokio::sync::broadcast::channel::<()>(1);
    let (events_tx, events_rx) = mpsc::channel::<TrackerEvent>(64);

    // Start the IPC server
    let server_state = runtime.clone();
    let socket_path = state.socket_path.clone();
    let server_broadcast_rx = broadcast_tx.subscribe();
    let server_handle = tokio::spawn(async move {
        if let Err(e) =
            server::run_server(&socket_path, server_state, Some(stop_tx), server_broadcast_rx)
                .await
        {
            tracing::error!("IPC server error: {}", e);
        }
    });

    // Start the reconciler
    let reconciler = Reconciler::new(db_config, Arc::new(SystemProcesses));
    let reconciler_broadcast_rx = broadcast_tx.subscribe();
    let interval = std::time::Duration::from_secs(config.poll_interval_secs);
    let reconciler_handle = tokio::spawn(async move {
        reconciler.run(interval, events_tx, reconciler_broadcast_rx).await;
    });

    // Fold tracker events into the shared runtime state
    let consumer_state = runtime.clone();
    let consumer_handle = tokio::spawn(async move {
        consume_events(events_rx, consumer_state).await;
    });

    // Wait for shutdown signal
    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = stop_rx => {
            tracing::info!("Received stop command, shutting down...");
        }
    }

    // Signal all components to shut down
    let _ = broadcast_tx.send(());

    // Give components time to clean up
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

    server_handle.abort();
    reconciler_handle.abort();
    consumer_handle.abort();

    state.cleanup()?;

    tracing::info!("Daemon stopped");

    Ok(())
}

/// Applies tracker events to the shared runtime state until the
/// reconciler side of the channel closes.
async fn consume_events(
    mut events: mpsc::Receiver<TrackerEvent>,
    state: Arc<RwLock<RuntimeState>>,
) {
    while let Some(event) = events.recv().await {
        match event {
            TrackerEvent::Status(change) => {
                tracing::info!(
                    "{} is now {} (last session: {}m)",
                    change.game_name,
                    change.status,
                    change.last_session_duration
                );

                let mut guard = state.write().await;
                match change.status {
                    GameStatus::Running => guard.stats.sessions_opened += 1,
                    GameStatus::Stopped => guard.stats.sessions_closed += 1,
                }
                guard.games.insert(
                    change.game_id,
                    GameLiveStatus {
                        game_id: change.game_id,
                        game_name: change.game_name,
                        status: change.status,
                        live_time: None,
                        last_session_duration: change.last_session_duration,
                    },
                );
            }
            TrackerEvent::LiveTime { game_id, time } => {
                let mut guard = state.write().await;
                if let Some(game) = guard.games.get_mut(&game_id) {
                    game.live_time = Some(time);
                }
            }
            TrackerEvent::Error { message } => {
                tracing::warn!("Tracker error: {}", message);
                let mut guard = state.write().await;
                guard.stats.errors += 1;
            }
        }
    }
}

/// Sets up file logging for the daemon.
///
/// Configures tracing to write logs to `~/.playtrack/daemon.log`.
/// Returns a guard that must be kept alive for the duration of the
/// daemon. If a global subscriber is already set (e.g., from main.rs
/// when running in foreground mode), this logs to the existing one.
fn setup_logging(state: &DaemonState) -> Result<WorkerGuard> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let file_appender = tracing_appender::rolling::never(
        state.log_file.parent().unwrap_or(std::path::Path::new(".")),
        state.log_file.file_name().unwrap_or_default(),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);

    // try_init so foreground mode (subscriber already set in main)
    // does not panic
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "playtrack=info".into()),
        )
        .with(file_layer)
        .try_init();

    Ok(guard)
}
