//! Run Log
//!
//! Append-only log of keeper actions, kept next to the bot's data so an
//! operator can reconstruct what happened across restarts. Every line is
//! prefixed with a local timestamp. Write failures are returned to the
//! caller, who downgrades them to warnings: losing a log line must never
//! break a restart.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Timestamped append-only log file
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped line, creating the file and its parent
    /// directory on first use.
    pub fn append(&self, message: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(file, "{} | {}", stamp, message)
    }
}
