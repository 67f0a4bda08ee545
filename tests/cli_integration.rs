//! Integration tests for playtrack CLI commands
//!
//! These tests exercise the CLI commands through their underlying
//! library functions using temporary databases to ensure test isolation.

use std::sync::Arc;

use playtrack_cli::insights::{compute_insights, create_feedback};
use playtrack_cli::storage::{Database, DbConfig, GameStatus, HistoryFilter};
use playtrack_cli::tracker::{FixedProcesses, Reconciler};
use tempfile::tempdir;

// =============================================================================
// Test Helpers
// =============================================================================

/// Creates a test database in a temporary directory.
/// Returns the Database instance and the temp directory (which must be kept alive).
fn create_test_db() -> (Database, tempfile::TempDir) {
    let dir = tempdir().expect("Failed to create temp directory");
    let db_path = dir.path().join("test.db");
    let db = Database::open(&db_path).expect("Failed to open test database");
    (db, dir)
}

// =============================================================================
// End-to-end tracking scenario
// =============================================================================

#[test]
fn test_game_appears_then_disappears_records_one_session() {
    let dir = tempdir().expect("Failed to create temp directory");
    let db_path = dir.path().join("test.db");

    let db = Database::open(&db_path).expect("Failed to open test database");
    let game_id = db.add_game("Chess", "/apps/chess.exe").expect("add game");
    drop(db);

    let config = DbConfig::at(db_path.clone());

    // The game shows up in the process list
    let mut reconciler = Reconciler::new(
        config.clone(),
        Arc::new(FixedProcesses::new(["chess.exe", "systemd"])),
    );
    let report = reconciler.poll_once();
    assert!(report.errors.is_empty());
    assert_eq!(report.changes.len(), 1);
    assert_eq!(report.changes[0].game_id, game_id);
    assert_eq!(report.changes[0].status, GameStatus::Running);

    // Still running: no further transitions
    assert!(reconciler.poll_once().changes.is_empty());

    // The game exits; the process list no longer contains it
    let db = config.open().expect("reopen");
    let duration = db
        .close_session(game_id)
        .expect("close")
        .expect("session was open");
    assert_eq!(duration, 0, "Opened and closed within the test run");

    let history = db
        .query_history(&HistoryFilter::default())
        .expect("history");
    assert_eq!(history.len(), 1);
    let session = &history[0];
    assert_eq!(session.game_name, "Chess");
    assert!(session.end_time.is_some(), "Closed session has an end time");
    assert_eq!(session.duration_minutes, Some(0));

    // The closed session feeds straight into insights
    let closed = db.closed_sessions(&HistoryFilter::default()).expect("closed");
    let report = compute_insights(&closed).expect("non-empty input");
    assert_eq!(report.total_playtime, 0);
    assert_eq!(report.longest_streak, 1);
    assert_eq!(report.next_game_prediction, "Chess");

    let feedback = create_feedback(&report);
    assert!(feedback.next_game_prediction.contains("Chess"));
}

#[test]
fn test_unregistered_processes_are_ignored() {
    let dir = tempdir().expect("Failed to create temp directory");
    let db_path = dir.path().join("test.db");

    let db = Database::open(&db_path).expect("open");
    db.add_game("Chess", "/apps/chess.exe").expect("add");
    drop(db);

    let config = DbConfig::at(db_path);
    let mut reconciler = Reconciler::new(
        config.clone(),
        Arc::new(FixedProcesses::new(["firefox", "systemd", "bash"])),
    );

    assert!(reconciler.poll_once().changes.is_empty());
    let db = config.open().expect("reopen");
    assert_eq!(db.session_count().expect("count"), 0);
}

// =============================================================================
// History filters through the public API
// =============================================================================

#[test]
fn test_history_filter_by_game_and_limit_behavior() {
    let (db, _dir) = create_test_db();

    let chess = db.add_game("Chess Ultra", "/apps/chess.exe").expect("add");
    let doom = db.add_game("Doom", "/apps/doom.exe").expect("add");

    for id in [chess, doom, chess] {
        db.open_session(id).expect("open");
        db.close_session(id).expect("close");
    }

    let all = db
        .query_history(&HistoryFilter::default())
        .expect("history");
    assert_eq!(all.len(), 3);

    let filter = HistoryFilter {
        game: Some("CHESS".to_string()),
        ..Default::default()
    };
    let chess_only = db.query_history(&filter).expect("history");
    assert_eq!(chess_only.len(), 2);
    assert!(chess_only.iter().all(|s| s.game_name == "Chess Ultra"));
}

#[test]
fn test_stats_aggregations_over_recorded_history() {
    let (db, _dir) = create_test_db();

    let chess = db.add_game("Chess", "/apps/chess.exe").expect("add");
    db.open_session(chess).expect("open");
    db.close_session(chess).expect("close");

    let totals = db
        .playtime_by_game(&HistoryFilter::default())
        .expect("by game");
    assert_eq!(totals.len(), 1);
    assert_eq!(totals[0].game_name, "Chess");
    assert_eq!(totals[0].session_count, 1);

    let days = db
        .playtime_by_day(&HistoryFilter::default())
        .expect("by day");
    assert_eq!(days.len(), 1);
    assert_eq!(days[0].0, chrono::Local::now().date_naive());

    let weekdays = db
        .playtime_by_weekday(&HistoryFilter::default())
        .expect("by weekday");
    assert_eq!(weekdays.len(), 7, "Every weekday present, zeros included");

    let periods = db
        .playtime_by_period(&HistoryFilter::default())
        .expect("by period");
    assert_eq!(periods.len(), 4, "Every day period present, zeros included");
}

// =============================================================================
// Binary smoke tests
// =============================================================================

#[test]
fn test_cli_help_lists_commands() {
    use assert_cmd::Command;
    use predicates::prelude::*;

    let mut cmd = Command::cargo_bin("playtrack").expect("binary built");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("sessions"))
        .stdout(predicate::str::contains("insights"))
        .stdout(predicate::str::contains("daemon"));
}

#[test]
fn test_cli_rejects_unknown_command() {
    use assert_cmd::Command;

    let mut cmd = Command::cargo_bin("playtrack").expect("binary built");
    cmd.arg("definitely-not-a-command").assert().failure();
}
