//! Append-only activity log, the engine's side of the status channel.
//!
//! Every step writes a timestamped line here and the presentation process
//! reads the last line back as the current status, so each append must hit
//! disk before the call returns. A completion flag file next to the log is
//! the terminal-success sentinel.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

pub struct ActivityLog {
    file: Mutex<File>,
    path: PathBuf,
    done_flag: PathBuf,
    max_bytes: u64,
}

impl ActivityLog {
    pub fn open(path: &Path, done_flag: &Path, max_bytes: u64) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(ActivityLog {
            file: Mutex::new(file),
            path: path.to_path_buf(),
            done_flag: done_flag.to_path_buf(),
            max_bytes,
        })
    }

    /// Start a fresh session: truncate the log and clear any sentinel left
    /// over from a previous run.
    pub fn reset(&self) -> std::io::Result<()> {
        if self.done_flag.exists() {
            fs::remove_file(&self.done_flag)?;
        }
        let mut guard = self.file.lock().unwrap_or_else(|e| e.into_inner());
        *guard = File::create(&self.path)?;
        Ok(())
    }

    /// Append one record and flush it. Errors are swallowed: a full disk
    /// must not take the launch down with it.
    pub fn append(&self, severity: Severity, message: &str) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let line = format!("[{timestamp}] [{}] {message}\n", severity.as_str());

        let mut guard = self.file.lock().unwrap_or_else(|e| e.into_inner());
        self.rotate_if_needed(&mut guard);
        let _ = guard.write_all(line.as_bytes());
        let _ = guard.flush();
    }

    pub fn info(&self, message: &str) {
        self.append(Severity::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.append(Severity::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.append(Severity::Error, message);
    }

    /// Set the completion sentinel: touch the flag file and record the
    /// terminal line. Only ever called after a fully successful launch.
    pub fn mark_complete(&self) -> std::io::Result<()> {
        File::create(&self.done_flag)?;
        self.info("All systems ready.");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size-bounded single-backup rotation: once the file passes the cap it
    /// becomes `<name>.1` (replacing any older backup) and a fresh file
    /// takes over. The reader only ever tails the live file.
    fn rotate_if_needed(&self, guard: &mut File) {
        let len = match guard.metadata() {
            Ok(meta) => meta.len(),
            Err(_) => return,
        };
        if len < self.max_bytes {
            return;
        }

        let backup = backup_path(&self.path);
        if fs::rename(&self.path, &backup).is_ok() {
            if let Ok(fresh) = OpenOptions::new().create(true).append(true).open(&self.path) {
                *guard = fresh;
            }
        }
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".1");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launch::status::StatusReader;

    fn temp_log(max_bytes: u64) -> (tempfile::TempDir, ActivityLog) {
        let dir = tempfile::tempdir().unwrap();
        let log = ActivityLog::open(
            &dir.path().join("assistant.log"),
            &dir.path().join(".launch_done"),
            max_bytes,
        )
        .unwrap();
        (dir, log)
    }

    #[test]
    fn test_latest_matches_last_append() {
        let (dir, log) = temp_log(1024 * 1024);
        let reader = StatusReader::new(
            &dir.path().join("assistant.log"),
            &dir.path().join(".launch_done"),
        );

        for i in 1..=20 {
            log.append(Severity::Info, &format!("step {i}"));
            assert_eq!(reader.latest(), format!("step {i}"));
        }
    }

    #[test]
    fn test_severity_prefix_is_stripped_by_reader() {
        let (dir, log) = temp_log(1024 * 1024);
        let reader = StatusReader::new(
            &dir.path().join("assistant.log"),
            &dir.path().join(".launch_done"),
        );

        log.append(Severity::Error, "pull failed [exit 1] see log");
        // Only the two leading bracketed fields go; brackets inside the
        // message survive.
        assert_eq!(reader.latest(), "pull failed [exit 1] see log");
    }

    #[test]
    fn test_sentinel_lifecycle() {
        let (dir, log) = temp_log(1024 * 1024);
        let reader = StatusReader::new(
            &dir.path().join("assistant.log"),
            &dir.path().join(".launch_done"),
        );

        assert!(!reader.is_complete());
        log.mark_complete().unwrap();
        assert!(reader.is_complete());

        // A new session clears the stale sentinel.
        log.reset().unwrap();
        assert!(!reader.is_complete());
        assert_eq!(reader.latest(), StatusReader::PLACEHOLDER);
    }

    #[test]
    fn test_rotation_keeps_appends_working() {
        let (dir, log) = temp_log(256);
        let reader = StatusReader::new(
            &dir.path().join("assistant.log"),
            &dir.path().join(".launch_done"),
        );

        for i in 0..50 {
            log.append(Severity::Info, &format!("message number {i}"));
        }
        assert_eq!(reader.latest(), "message number 49");
        assert!(dir.path().join("assistant.log.1").exists());
        let live = fs::metadata(dir.path().join("assistant.log")).unwrap().len();
        assert!(live < 256 + 128, "live file should restart near empty");
    }
}
