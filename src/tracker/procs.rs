//! Process snapshot providers.
//!
//! The reconciler only needs the set of running process image names, so
//! the OS query sits behind a small trait. Production reads `/proc` on
//! Linux and falls back to `ps` elsewhere; tests inject a fixed set.

use anyhow::{Context, Result};
use std::collections::HashSet;

/// Supplies the set of currently running process image names,
/// lowercased for case-insensitive matching.
pub trait ProcessSnapshotProvider: Send + Sync {
    fn running_image_names(&self) -> Result<HashSet<String>>;
}

/// Queries the operating system for the live process list.
pub struct SystemProcesses;

impl ProcessSnapshotProvider for SystemProcesses {
    fn running_image_names(&self) -> Result<HashSet<String>> {
        if std::path::Path::new("/proc").is_dir() {
            scan_proc()
        } else {
            scan_ps()
        }
    }
}

/// Reads the command name of every numeric `/proc` entry.
///
/// Entries that vanish mid-scan (the process exited) are skipped; only
/// failing to read the `/proc` directory itself aborts the snapshot.
///
/// The kernel caps `comm` at 15 bytes, so a comm entry of exactly that
/// length may be a truncated executable name; the full basename is
/// recovered from the `exe` symlink when readable.
fn scan_proc() -> Result<HashSet<String>> {
    const COMM_MAX: usize = 15;

    let entries = std::fs::read_dir("/proc").context("Failed to read /proc")?;

    let mut names = HashSet::new();
    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let Some(pid) = file_name.to_str().filter(|n| n.chars().all(|c| c.is_ascii_digit()))
        else {
            continue;
        };

        let comm_path = format!("/proc/{pid}/comm");
        if let Ok(comm) = std::fs::read_to_string(&comm_path) {
            let name = comm.trim();
            if name.is_empty() {
                continue;
            }
            if name.len() == COMM_MAX {
                if let Ok(exe) = std::fs::read_link(format!("/proc/{pid}/exe")) {
                    if let Some(full) = exe.file_name() {
                        names.insert(full.to_string_lossy().to_lowercase());
                    }
                }
            }
            names.insert(name.to_lowercase());
        }
    }
    Ok(names)
}

/// Shells out to `ps` on platforms without procfs (e.g. macOS).
fn scan_ps() -> Result<HashSet<String>> {
    let output = std::process::Command::new("ps")
        .args(["-axco", "comm"])
        .output()
        .context("Failed to run ps")?;

    if !output.status.success() {
        anyhow::bail!("ps exited with status {}", output.status);
    }

    let names = String::from_utf8_lossy(&output.stdout)
        .lines()
        .skip(1) // header row
        .map(|line| line.trim().to_lowercase())
        .filter(|name| !name.is_empty())
        .collect();
    Ok(names)
}

/// Fixed-set provider for tests and dry runs.
#[derive(Default, Clone)]
pub struct FixedProcesses {
    names: HashSet<String>,
}

impl FixedProcesses {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(|n| n.into().to_lowercase()).collect(),
        }
    }
}

impl ProcessSnapshotProvider for FixedProcesses {
    fn running_image_names(&self) -> Result<HashSet<String>> {
        Ok(self.names.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_provider_lowercases_names() {
        let provider = FixedProcesses::new(["Chess.EXE", "doom.exe"]);
        let names = provider.running_image_names().unwrap();
        assert!(names.contains("chess.exe"));
        assert!(names.contains("doom.exe"));
        assert!(!names.contains("Chess.EXE"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_system_provider_sees_current_process() {
        let names = SystemProcesses.running_image_names().unwrap();
        assert!(!names.is_empty(), "A live system has running processes");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_long_executable_basenames_survive_comm_truncation() {
        // comm holds at most 15 bytes, so a longer basename only shows
        // up if the exe symlink fallback kicks in
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let exe = dir.path().join("RocketLeague0.exe");
        assert!(exe.file_name().unwrap().len() > 15);

        std::fs::copy("/bin/sleep", &exe).expect("copy sleep");
        let mut child = std::process::Command::new(&exe)
            .arg("10")
            .spawn()
            .expect("spawn renamed sleep");
        std::thread::sleep(std::time::Duration::from_millis(200));

        let names = SystemProcesses.running_image_names().unwrap();

        let _ = child.kill();
        let _ = child.wait();

        assert!(
            names.contains("rocketleague0.exe"),
            "Full basename should be present, got truncated entries only"
        );
    }
}
