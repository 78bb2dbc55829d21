//! Presentation-side view of the activity log.
//!
//! The reader owns no state beyond the two paths. It tails the last line of
//! the log, strips the record prefix, and checks the completion sentinel;
//! that is the entire contract with the engine.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

pub struct StatusReader {
    log_path: PathBuf,
    done_flag: PathBuf,
}

impl StatusReader {
    /// Shown while the log is missing, empty, or unreadable. A read failure
    /// is never fatal here; polling just continues.
    pub const PLACEHOLDER: &'static str = "Starting...";

    pub fn new(log_path: &Path, done_flag: &Path) -> Self {
        StatusReader {
            log_path: log_path.to_path_buf(),
            done_flag: done_flag.to_path_buf(),
        }
    }

    /// Message portion of the most recent record.
    pub fn latest(&self) -> String {
        match fs::read_to_string(&self.log_path) {
            Ok(content) => content
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .map(strip_record_prefix)
                .unwrap_or_else(|| Self::PLACEHOLDER.to_string()),
            Err(_) => Self::PLACEHOLDER.to_string(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.done_flag.exists()
    }

    /// Poll the log, surfacing each new status line through `show`, until
    /// the completion sentinel appears.
    pub fn follow(&self, interval: Duration, mut show: impl FnMut(&str)) {
        let mut last = String::new();
        loop {
            let message = self.latest();
            if message != last {
                show(&message);
                last = message;
            }
            if self.is_complete() {
                break;
            }
            thread::sleep(interval);
        }
    }
}

/// Drop the `[timestamp] [LEVEL] ` prefix, keeping any brackets that belong
/// to the message itself.
fn strip_record_prefix(line: &str) -> String {
    line.splitn(3, "] ")
        .last()
        .unwrap_or(line)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_log_yields_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let reader = StatusReader::new(
            &dir.path().join("absent.log"),
            &dir.path().join(".launch_done"),
        );
        assert_eq!(reader.latest(), StatusReader::PLACEHOLDER);
        assert!(!reader.is_complete());
    }

    #[test]
    fn test_strip_record_prefix() {
        assert_eq!(
            strip_record_prefix("[2025-01-01 10:00:00.000] [INFO] Checking Ollama..."),
            "Checking Ollama..."
        );
        assert_eq!(
            strip_record_prefix("[ts] [ERROR] restart failed [exit 125] aborting"),
            "restart failed [exit 125] aborting"
        );
        // Lines without the record shape pass through untouched.
        assert_eq!(strip_record_prefix("bare line"), "bare line");
    }

    #[test]
    fn test_latest_skips_trailing_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("assistant.log");
        fs::write(&log, "[ts] [INFO] first\n[ts] [INFO] second\n\n").unwrap();
        let reader = StatusReader::new(&log, &dir.path().join(".launch_done"));
        assert_eq!(reader.latest(), "second");
    }
}
