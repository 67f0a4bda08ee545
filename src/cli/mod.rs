//! Command-line interface for playtrack.
//!
//! Provides the CLI commands for registering games, browsing play
//! history, viewing statistics and insights, and managing the
//! background tracking daemon.

/// Individual CLI command implementations.
pub mod commands;

/// Output formatting utilities.
pub mod format;

pub use format::OutputFormat;
