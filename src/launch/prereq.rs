//! Prerequisite checks: required tools on the path, container engine live.
//!
//! Nothing here installs software. A missing prerequisite is reported and
//! the session ends; starting the container runtime's desktop app is the
//! one bounded recovery attempted.

use std::path::Path;
use std::process::Command;

use sysinfo::System;

use crate::launch::activity_log::ActivityLog;
use crate::launch::command;
use crate::launch::config::LaunchConfig;
use crate::launch::retry::poll_until;

/// Resolve an executable by probing `<name> --version`. Logs the outcome
/// and returns success/failure without panicking.
pub fn ensure_tool(log: &ActivityLog, name: &str) -> bool {
    log.info(&format!("Checking {name}..."));
    if version_probe(name) {
        log.info(&format!("{name} is installed."));
        true
    } else {
        log.error(&format!("{name} is not installed or not in PATH."));
        false
    }
}

fn version_probe(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/// Check the container engine is answering; if not, try to start its
/// desktop application and re-check on the configured attempt schedule.
pub fn ensure_container_runtime(log: &ActivityLog, config: &LaunchConfig) -> bool {
    log.info("Checking Docker status...");
    if runtime_live(&config.container_tool) {
        log.info("Docker is running.");
        return true;
    }

    log.info("Docker not running. Attempting to launch Docker Desktop...");
    if !launch_runtime_app(log) {
        return false;
    }

    let mut attempt = 0u32;
    let total = config.runtime_start_attempts;
    let ok = poll_until(total, config.runtime_start_interval(), || {
        attempt += 1;
        if runtime_live(&config.container_tool) {
            return true;
        }
        log.info(&format!("Retry {attempt}/{total}: Docker still starting..."));
        false
    });

    if ok {
        log.info("Docker is now running.");
    } else {
        let waited = u64::from(total) * config.runtime_start_interval_secs;
        log.error(&format!("Docker failed to start within {waited} seconds."));
    }
    ok
}

/// The daemon answers `docker system info` with a `Server Version` line
/// only when it is actually serving, so grep for that rather than trusting
/// the exit status of a client that may just print a warning.
fn runtime_live(tool: &str) -> bool {
    command::try_output(tool, &["system", "info"])
        .map(|out| out.contains("Server Version"))
        .unwrap_or(false)
}

/// Start the desktop application from its well-known install location.
/// Skipped when a process with its name is already coming up.
fn launch_runtime_app(log: &ActivityLog) -> bool {
    if desktop_app_running() {
        log.info("Docker Desktop is already starting.");
        return true;
    }

    if cfg!(windows) {
        let program_files =
            std::env::var("ProgramFiles").unwrap_or_else(|_| "C:\\Program Files".to_string());
        let exe = Path::new(&program_files)
            .join("Docker")
            .join("Docker")
            .join("Docker Desktop.exe");
        if !exe.exists() {
            log.error("Docker Desktop not found at its expected location.");
            return false;
        }
        let no_args: [&str; 0] = [];
        command::spawn_detached(&exe.to_string_lossy(), &no_args, &[]).is_ok()
    } else if cfg!(target_os = "macos") {
        if !Path::new("/Applications/Docker.app").exists() {
            log.error("Docker.app not found in /Applications.");
            return false;
        }
        command::spawn_detached("open", &["-a", "Docker"], &[]).is_ok()
    } else {
        log.error("Docker daemon is not running. Start it manually (systemctl start docker).");
        false
    }
}

fn desktop_app_running() -> bool {
    let mut sys = System::new();
    sys.refresh_processes(sysinfo::ProcessesToUpdate::All, true);
    sys.processes()
        .values()
        .any(|proc_| proc_.name().to_string_lossy().contains("Docker Desktop"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_log(dir: &Path) -> ActivityLog {
        ActivityLog::open(
            &dir.join("assistant.log"),
            &dir.join(".launch_done"),
            1024 * 1024,
        )
        .unwrap()
    }

    #[test]
    fn test_missing_tool_reports_false() {
        let dir = tempdir().unwrap();
        let log = test_log(dir.path());
        assert!(!ensure_tool(&log, "definitely-not-a-real-binary-xyz"));
    }

    #[cfg(unix)]
    #[test]
    fn test_present_tool_reports_true() {
        let dir = tempdir().unwrap();
        let log = test_log(dir.path());
        // `sh --version` succeeds on any GNU-ish system; fall back to `env`.
        assert!(ensure_tool(&log, "env") || ensure_tool(&log, "sh"));
    }
}
