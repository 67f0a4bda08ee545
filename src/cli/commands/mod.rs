//! CLI command implementations.

pub mod add;
pub mod daemon;
pub mod games;
pub mod insights;
pub mod launch;
pub mod sessions;
pub mod stats;
