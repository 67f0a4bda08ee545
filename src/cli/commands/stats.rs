//! Stats command - aggregate playtime views.
//!
//! Groups closed-session playtime by game, calendar day, weekday, or
//! day period. All groupings honor the same game/date filters as the
//! sessions command.

use anyhow::Result;
use chrono::NaiveDate;
use clap::ValueEnum;
use colored::Colorize;

use crate::cli::OutputFormat;
use crate::storage::{Database, HistoryFilter};

/// Grouping axis for aggregate playtime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum GroupBy {
    /// Totals per game (default).
    #[default]
    Game,
    /// Totals per local calendar date.
    Day,
    /// Totals per weekday, Monday through Sunday.
    Weekday,
    /// Totals per day quadrant (night/morning/afternoon/evening).
    Period,
}

/// Arguments for the stats command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    playtrack stats                       Playtime per game\n    \
    playtrack stats --by day              Playtime per calendar day\n    \
    playtrack stats --by weekday          Playtime per weekday\n    \
    playtrack stats --by period           Playtime per part of day\n    \
    playtrack stats --game chess          Only games matching 'chess'\n    \
    playtrack stats --from 2026-08-01     Only sessions on/after a date")]
pub struct Args {
    /// Grouping axis
    #[arg(short, long, value_enum, default_value = "game")]
    pub by: GroupBy,

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

/// Executes the stats command.
pub fn run(args: Args) -> Result<()> {
    let db = Database::open_default()?;

    let filter = HistoryFilter {
        game: args.game,
        from: args.from,
        to: args.to,
    };

    match args.by {
        GroupBy::Game => run_by_game(&db, &filter, args.format),
        GroupBy::Day => run_by_day(&db, &filter, args.format),
        GroupBy::Weekday => run_by_weekday(&db, &filter, args.format),
        GroupBy::Period => run_by_period(&db, &filter, args.format),
    }
}

fn run_by_game(db: &Database, filter: &HistoryFilter, format: OutputFormat) -> Result<()> {
    let totals = db.playtime_by_game(filter)?;

    if totals.is_empty() {
        println!("{}", "No closed sessions to aggregate.".dimmed());
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&totals)?),
        OutputFormat::Text => {
            const NAME_WIDTH: usize = 24;
            const NUM_WIDTH: usize = 9;

            println!(
                "{}",
                format!(
                    "{:<NAME_WIDTH$}  {:>NUM_WIDTH$}  {:>NUM_WIDTH$}  {:>NUM_WIDTH$}  {:>NUM_WIDTH$}",
                    "GAME", "TOTAL", "AVG", "MAX", "SESSIONS"
                )
                .bold()
            );
            for row in &totals {
                println!(
                    "{:<NAME_WIDTH$}  {:>NUM_WIDTH$}  {:>NUM_WIDTH$}  {:>NUM_WIDTH$}  {:>NUM_WIDTH$}",
                    row.game_name.cyan(),
                    format_minutes(row.total_minutes),
                    format!("{:.0}m", row.average_minutes),
                    format_minutes(row.max_minutes),
                    row.session_count
                );
            }
        }
    }

    Ok(())
}

fn run_by_day(db: &Database, filter: &HistoryFilter, format: OutputFormat) -> Result<()> {
    let days = db.playtime_by_day(filter)?;

    if days.is_empty() {
        println!("{}", "No closed sessions to aggregate.".dimmed());
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&days)?),
        OutputFormat::Text => {
            println!("{}", format!("{:<12}  {}", "DATE", "PLAYTIME").bold());
            for (date, minutes) in &days {
                println!(
                    "{:<12}  {}",
                    date.to_string().dimmed(),
                    format_minutes(*minutes)
                );
            }
        }
    }

    Ok(())
}

fn run_by_weekday(db: &Database, filter: &HistoryFilter, format: OutputFormat) -> Result<()> {
    let weekdays = db.playtime_by_weekday(filter)?;

    match format {
        OutputFormat::Json => {
            let rows: Vec<(String, i64)> = weekdays
                .into_iter()
                .map(|(day, minutes)| (day.to_string(), minutes))
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Text => {
            println!("{}", format!("{:<10}  {}", "WEEKDAY", "PLAYTIME").bold());
            for (day, minutes) in &weekdays {
                println!("{:<10}  {}", day.to_string(), format_minutes(*minutes));
            }
        }
    }

    Ok(())
}

fn run_by_period(db: &Database, filter: &HistoryFilter, format: OutputFormat) -> Result<()> {
    let periods = db.playtime_by_period(filter)?;

    match format {
        OutputFormat::Json => {
            let rows: Vec<(String, i64)> = periods
                .into_iter()
                .map(|(period, minutes)| (period.to_string(), minutes))
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Text => {
            println!("{}", format!("{:<10}  {}", "PERIOD", "PLAYTIME").bold());
            for (period, minutes) in &periods {
                println!("{:<10}  {}", period.to_string(), format_minutes(*minutes));
            }
        }
    }

    Ok(())
}

/// Formats minutes as "Xh Ym" above an hour, "Ym" below.
fn format_minutes(minutes: i64) -> String {
    if minutes >= 60 {
        format!("{}h {}m", minutes / 60, minutes % 60)
    } else {
        format!("{minutes}m")
    }
}
