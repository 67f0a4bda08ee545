//! Sessions command - list and filter play history.
//!
//! Displays recorded play sessions, newest first. Sessions can be
//! filtered by game name and date range and output as text or JSON.

use anyhow::Result;
use chrono::NaiveDate;
use colored::Colorize;

use crate::cli::OutputFormat;
use crate::storage::{Database, HistoryFilter};

/// Arguments for the sessions command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    playtrack sessions                      List recent sessions (default 20)\n    \
    playtrack sessions --limit 50           Show up to 50 sessions\n    \
    playtrack sessions --game chess         Filter by game name substring\n    \
    playtrack sessions --from 2026-08-01    Sessions starting on/after a date\n    \
    playtrack sessions --format json        Output as JSON")]
pub struct Args {
    /// Filter to games whose name contains this text (case-insensitive)
    #[arg(short, long, value_name = "NAME")]
    pub game: Option<String>,

    /// Only sessions started on or after this local date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub from: Option<NaiveDate>,

    /// Only sessions started on or before this local date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub to: Option<NaiveDate>,

    /// Maximum number of sessions to display
    #[arg(short, long, default_value = "20", value_name = "N")]
    pub limit: usize,

    /// Output format: text (default), json
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Executes the sessions command.
pub fn run(args: Args) -> Result<()> {
    let db = Database::open_default()?;

    let filter = HistoryFilter {
        game: args.game,
        from: args.from,
        to: args.to,
    };

    let mut sessions = db.query_history(&filter)?;
    sessions.truncate(args.limit);

    if sessions.is_empty() {
        println!("{}", "No sessions found.".dimmed());
        println!();
        println!("Sessions are recorded by the daemon while tracked games run.");
        return Ok(());
    }

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&sessions)?;
            println!("{json}");
        }
        OutputFormat::Text => {
            const ID_WIDTH: usize = 6;
            const GAME_WIDTH: usize = 24;
            const STARTED_WIDTH: usize = 16;
            const ENDED_WIDTH: usize = 16;

            println!(
                "{}",
                format!(
                    "{:<ID_WIDTH$}  {:<GAME_WIDTH$}  {:<STARTED_WIDTH$}  {:<ENDED_WIDTH$}  {}",
                    "ID", "GAME", "STARTED", "ENDED", "DURATION"
                )
                .bold()
            );

            for session in &sessions {
                let started = session.start_time.format("%Y-%m-%d %H:%M").to_string();
                let (ended, duration) = match (&session.end_time, session.duration_minutes) {
                    (Some(end), Some(minutes)) => (
                        end.format("%Y-%m-%d %H:%M").to_string(),
                        format!("{minutes}m"),
                    ),
                    _ => ("-".to_string(), "running".green().to_string()),
                };

                println!(
                    "{:<ID_WIDTH$}  {:<GAME_WIDTH$}  {:<STARTED_WIDTH$}  {:<ENDED_WIDTH$}  {}",
                    session.id.to_string().cyan(),
                    session.game_name,
                    started.dimmed(),
                    ended.dimmed(),
                    duration
                );
            }
        }
    }

    Ok(())
}
