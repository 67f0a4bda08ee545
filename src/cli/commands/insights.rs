//! Insights command - derived statistics and feedback messages.
//!
//! Feeds closed sessions (in chronological order) through the insights
//! engine and prints either the friendly feedback messages or the raw
//! report as JSON.

use anyhow::Result;
use chrono::NaiveDate;
use colored::Colorize;

use crate::cli::OutputFormat;
use crate::insights::{compute_insights, create_feedback, InsightsError};
use crate::storage::{Database, HistoryFilter};

/// Arguments for the insights command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    playtrack insights                    Feedback over all history\n    \
    playtrack insights --game chess       Only games matching 'chess'\n    \
    playtrack insights --from 2026-08-01  Only sessions on/after a date\n    \
    playtrack insights --format json      Raw report as JSON")]
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

    /// Output format: text (default), json
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Executes the insights command.
pub fn run(args: Args) -> Result<()> {
    let db = Database::open_default()?;

    let filter = HistoryFilter {
        game: args.game,
        from: args.from,
        to: args.to,
    };

    let sessions = db.closed_sessions(&filter)?;

    let report = match compute_insights(&sessions) {
        Ok(report) => report,
        Err(InsightsError::EmptySessionList) => {
            println!("{}", "No completed sessions to analyze yet.".dimmed());
            println!();
            println!("Insights appear after the daemon records your first play session.");
            return Ok(());
        }
    };

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            let feedback = create_feedback(&report);

            println!("{}", "Your Gaming Insights".green().bold());
            println!();
            println!("  {}", feedback.total_playtime);
            println!("  {}", feedback.longest_session);
            println!("  {}", feedback.avg_playtime);
            println!("  {}", feedback.peak_play_hour);
            println!("  {}", feedback.weekend_playtime);
            println!("  {}", feedback.weekday_playtime);
            println!("  {}", feedback.longest_streak);
            println!("  {}", feedback.session_trend);
            println!("  {}", feedback.next_game_prediction.cyan());
        }
    }

    Ok(())
}
