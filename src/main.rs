use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use playtrack_cli::cli::commands;

/// The main CLI command line interface.
#[derive(Parser)]
#[command(name = "playtrack")]
#[command(version)]
#[command(about = "Track how long you actually play your games")]
#[command(long_about = "Playtrack records play sessions automatically by watching the OS\n\
    process list for the executables of games you register. A background\n\
    daemon opens a session when a game starts and closes it when the game\n\
    exits; the CLI browses the recorded history, statistics, and insights.")]
#[command(after_help = "EXAMPLES:\n    \
    playtrack add Chess /usr/games/chess   Register a game\n    \
    playtrack games                        List tracked games\n    \
    playtrack daemon start                 Start the background tracker\n    \
    playtrack sessions                     List recent play sessions\n    \
    playtrack stats --by day               Playtime per calendar day\n    \
    playtrack insights                     Habit feedback and trends\n\n    \
    For more information about a command, run 'playtrack <command> --help'.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Register a game for tracking
    #[command(long_about = "Registers a game by name and executable path. The executable's\n\
        file name is matched case-insensitively against running processes,\n\
        so the same entry works whether the game is launched through\n\
        playtrack or any other way.")]
    Add(commands::add::Args),

    /// List tracked games
    Games(commands::games::Args),

    /// Launch a tracked game
    #[command(long_about = "Spawns the game's executable detached from the CLI. Session\n\
        recording is unaffected by how the game is launched; the daemon\n\
        observes the process either way.")]
    Launch(commands::launch::Args),

    /// List and filter play sessions
    #[command(long_about = "Displays recorded play sessions, newest first, with start and end\n\
        times and duration. Sessions can be filtered by game name and by\n\
        a local date range.")]
    Sessions(commands::sessions::Args),

    /// Aggregate playtime statistics
    #[command(long_about = "Aggregates playtime over completed sessions, grouped by game,\n\
        calendar day, weekday, or part of day. Honors the same filters\n\
        as the sessions command.")]
    Stats(commands::stats::Args),

    /// Derived statistics and habit feedback
    #[command(long_about = "Computes derived statistics over your completed sessions: totals,\n\
        averages, peak play hour, weekend and weekday split, play streaks,\n\
        session duration trend, and a next-game suggestion. Text output\n\
        renders friendly feedback; JSON output is the raw report.")]
    Insights(commands::insights::Args),

    /// Manage the background tracking daemon
    #[command(long_about = "Controls the background daemon that polls the process list and\n\
        records play sessions for tracked games.")]
    Daemon(commands::daemon::Args),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "playtrack=debug"
    } else {
        "playtrack=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    match cli.command {
        Commands::Add(args) => commands::add::run(args),
        Commands::Games(args) => commands::games::run(args),
        Commands::Launch(args) => commands::launch::run(args),
        Commands::Sessions(args) => commands::sessions::run(args),
        Commands::Stats(args) => commands::stats::run(args),
        Commands::Insights(args) => commands::insights::run(args),
        Commands::Daemon(args) => commands::daemon::run(args),
    }
}
