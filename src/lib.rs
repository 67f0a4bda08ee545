//! Playtrack - automatic play session tracking
//!
//! Playtrack watches the OS process list for registered game
//! executables, records how long each game runs as play sessions in a
//! local SQLite database, and derives statistics and habit feedback
//! from the accumulated history.

pub mod cli;
pub mod config;
pub mod daemon;
pub mod insights;
pub mod storage;
pub mod tracker;
