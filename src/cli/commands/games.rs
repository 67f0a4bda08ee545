//! Games command - list tracked games.

use anyhow::Result;
use colored::Colorize;

use crate::cli::OutputFormat;
use crate::storage::Database;

/// Arguments for the games command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    playtrack games                List tracked games\n    \
    playtrack games --format json  Output as JSON")]
pub struct Args {
    /// Output format: text (default), json
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Executes the games command.
pub fn run(args: Args) -> Result<()> {
    let db = Database::open_default()?;
    let games = db.list_games()?;

    if games.is_empty() {
        println!("{}", "No games tracked yet.".dimmed());
        println!();
        println!("Run 'playtrack add <name> <exe_path>' to start tracking a game.");
        return Ok(());
    }

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&games)?;
            println!("{json}");
        }
        OutputFormat::Text => {
            const ID_WIDTH: usize = 6;
            const NAME_WIDTH: usize = 24;

            println!(
                "{}",
                format!(
                    "{:<ID_WIDTH$}  {:<NAME_WIDTH$}  {}",
                    "ID", "NAME", "EXECUTABLE"
                )
                .bold()
            );

            for game in &games {
                let last = db.last_session_duration(game.id)?;
                let last_display = if last > 0 {
                    format!("  (last session: {last}m)").dimmed().to_string()
                } else {
                    String::new()
                };
                println!(
                    "{:<ID_WIDTH$}  {:<NAME_WIDTH$}  {}{}",
                    game.id.to_string().cyan(),
                    game.name,
                    game.exe_path.dimmed(),
                    last_display
                );
            }
        }
    }

    Ok(())
}
