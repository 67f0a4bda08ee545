//! Add command - register a game for tracking.

use anyhow::Result;
use colored::Colorize;

use crate::storage::Database;

/// Arguments for the add command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    playtrack add Chess /usr/games/chess\n    \
    playtrack add \"Rocket League\" \"C:\\\\Games\\\\RocketLeague.exe\"")]
pub struct Args {
    /// Display name for the game
    pub name: String,

    /// Path to the game executable. The file name is matched
    /// case-insensitively against running processes.
    pub exe_path: String,
}

/// Executes the add command.
pub fn run(args: Args) -> Result<()> {
    let db = Database::open_default()?;

    let before = db.game_count()?;
    let id = db.add_game(&args.name, &args.exe_path)?;
    let after = db.game_count()?;

    if after == before {
        println!(
            "{} A game with executable {} is already tracked (id {})",
            "Note:".yellow(),
            args.exe_path.cyan(),
            id
        );
    } else {
        println!(
            "{} Added {} (id {})",
            "Success:".green(),
            args.name.cyan().bold(),
            id
        );
        println!(
            "{}",
            "The daemon will start recording sessions next time the game runs.".dimmed()
        );
    }

    Ok(())
}
