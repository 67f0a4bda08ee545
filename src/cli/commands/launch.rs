//! Launch command - start a tracked game's executable.
//!
//! The game is spawned detached; actual session recording still comes
//! from the daemon observing the process, so a game launched outside
//! playtrack is tracked exactly the same way.

use anyhow::{Context, Result};
use colored::Colorize;
use std::process::{Command, Stdio};

use crate::storage::Database;

/// Arguments for the launch command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    playtrack launch 1    Launch the game with id 1\n    \
    playtrack games       Look up game ids")]
pub struct Args {
    /// Id of the game to launch (see 'playtrack games')
    pub id: i64,
}

/// Executes the launch command.
pub fn run(args: Args) -> Result<()> {
    let db = Database::open_default()?;

    let Some(game) = db.get_game(args.id)? else {
        anyhow::bail!("No tracked game with id {}. Run 'playtrack games' to list ids.", args.id);
    };

    let child = Command::new(&game.exe_path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("Failed to launch {}", game.exe_path))?;

    println!(
        "{} Launched {} (PID {})",
        "Success:".green(),
        game.name.cyan().bold(),
        child.id()
    );

    let state = crate::daemon::DaemonState::new()?;
    if !state.is_running() {
        println!(
            "{}",
            "Note: the daemon is not running, so this session will not be recorded.".yellow()
        );
        println!("{}", "Start it with 'playtrack daemon start'.".dimmed());
    }

    Ok(())
}
