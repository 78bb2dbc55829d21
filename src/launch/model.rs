//! Model selection and acquisition.
//!
//! The capability tier maps to exactly one model tag. Small models download
//! quietly in the background and we poll the installed list; large ones run
//! in the foreground with their progress lines forwarded to the activity
//! log so the status display keeps moving during a long pull.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;

use lazy_static::lazy_static;
use regex::Regex;

use crate::launch::activity_log::ActivityLog;
use crate::launch::command;
use crate::launch::config::LaunchConfig;
use crate::launch::error::LaunchError;
use crate::launch::gpu::CapabilityTier;
use crate::launch::retry::poll_until;

/// Tag the runtime applies when the default model is pulled untagged;
/// treated as equivalent to [`SMALL_MODEL`] when checking what is installed.
pub const LATEST_ALIAS: &str = "deepseek-r1:latest";
pub const SMALL_MODEL: &str = "deepseek-r1:8b";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcquireStrategy {
    /// Pull detached, poll the installed list until the tag shows up.
    BackgroundPoll,
    /// Pull in the foreground, stream cleaned progress lines to the log.
    StreamProgress,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: &'static str,
    pub strategy: AcquireStrategy,
}

/// Deterministic tier-to-model mapping.
pub fn select_model(tier: CapabilityTier) -> ModelSpec {
    match tier {
        CapabilityTier::None | CapabilityTier::Low => ModelSpec {
            name: SMALL_MODEL,
            strategy: AcquireStrategy::BackgroundPoll,
        },
        CapabilityTier::Mid => ModelSpec {
            name: "deepseek-r1:14b",
            strategy: AcquireStrategy::StreamProgress,
        },
        CapabilityTier::High => ModelSpec {
            name: "deepseek-r1:32b",
            strategy: AcquireStrategy::StreamProgress,
        },
        CapabilityTier::VeryHigh => ModelSpec {
            name: "deepseek-r1:70b",
            strategy: AcquireStrategy::StreamProgress,
        },
    }
}

/// First column of every `ollama list` data row (header and blanks skipped).
pub fn parse_model_list(raw: &str) -> Vec<String> {
    raw.lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

pub fn installed_models(tool: &str) -> Vec<String> {
    command::try_output(tool, &["list"])
        .map(|out| parse_model_list(&out))
        .unwrap_or_default()
}

/// Membership check that honors the latest-tag alias in both directions.
pub fn is_listed(installed: &[String], name: &str) -> bool {
    if installed.iter().any(|m| m == name) {
        return true;
    }
    (name == SMALL_MODEL && installed.iter().any(|m| m == LATEST_ALIAS))
        || (name == LATEST_ALIAS && installed.iter().any(|m| m == SMALL_MODEL))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcquirePlan {
    AlreadyInstalled,
    Download,
}

/// Pure decision: given what is installed, does this spec need a pull?
pub fn acquire_plan(spec: &ModelSpec, installed: &[String]) -> AcquirePlan {
    if is_listed(installed, spec.name) {
        AcquirePlan::AlreadyInstalled
    } else {
        AcquirePlan::Download
    }
}

pub fn acquire(
    log: &ActivityLog,
    config: &LaunchConfig,
    spec: &ModelSpec,
) -> Result<(), LaunchError> {
    if acquire_plan(spec, &installed_models(&config.runtime_tool)) == AcquirePlan::AlreadyInstalled
    {
        log.info(&format!("Model {} is already installed.", spec.name));
        return Ok(());
    }

    log.info(&format!("Pulling {} model...", spec.name));
    match spec.strategy {
        AcquireStrategy::BackgroundPoll => pull_background(log, config, spec.name),
        AcquireStrategy::StreamProgress => pull_streaming(log, &config.runtime_tool, spec.name),
    }
}

/// Detached pull plus installed-list polling. The pull process is never
/// waited on directly; the installed set appearing is the success signal.
fn pull_background(
    log: &ActivityLog,
    config: &LaunchConfig,
    name: &str,
) -> Result<(), LaunchError> {
    command::spawn_detached(&config.runtime_tool, &["pull", name], &[])?;

    let done = poll_until(config.pull_poll_attempts, config.pull_poll_interval(), || {
        is_listed(&installed_models(&config.runtime_tool), name)
    });

    if done {
        log.info(&format!("Model {name} downloaded."));
        Ok(())
    } else {
        log.error(&format!("Model {name} did not finish downloading in time."));
        Err(LaunchError::Timeout {
            what: format!("model download ({name})"),
        })
    }
}

/// Foreground pull with both output streams forwarded line-by-line.
fn pull_streaming(log: &ActivityLog, tool: &str, name: &str) -> Result<(), LaunchError> {
    let rendered = format!("{tool} pull {name}");
    let mut child = Command::new(tool)
        .args(["pull", name])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| LaunchError::Spawn {
            command: rendered.clone(),
            source,
        })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    thread::scope(|scope| {
        if let Some(out) = stdout {
            scope.spawn(move || forward_stream(out, log));
        }
        if let Some(err) = stderr {
            scope.spawn(move || forward_stream(err, log));
        }
    });

    let status = child.wait().map_err(|source| LaunchError::Spawn {
        command: rendered.clone(),
        source,
    })?;
    if status.success() {
        log.info(&format!("Model {name} downloaded."));
        Ok(())
    } else {
        Err(LaunchError::CommandFailed {
            command: rendered,
            code: status.code(),
        })
    }
}

/// Incrementally read a pull stream, splitting on both newlines and the
/// carriage returns progress bars use, and forward each cleaned non-empty
/// line.
fn forward_stream(mut stream: impl Read, log: &ActivityLog) {
    let mut pending = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = match stream.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        pending.extend_from_slice(&buf[..n]);

        while let Some(pos) = pending.iter().position(|&b| b == b'\n' || b == b'\r') {
            let line: Vec<u8> = pending.drain(..=pos).collect();
            emit_line(&line, log);
        }
    }
    emit_line(&pending, log);
}

fn emit_line(raw: &[u8], log: &ActivityLog) {
    let cleaned = clean_progress_line(&String::from_utf8_lossy(raw));
    if !cleaned.is_empty() {
        log.info(&cleaned);
    }
}

lazy_static! {
    /// CSI/OSC escape sequences plus stray C0 control bytes.
    static ref CONTROL_SEQUENCES: Regex =
        Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]|\x1b\][^\x07]*\x07|[\x00-\x1f\x7f]").unwrap();
}

pub fn clean_progress_line(line: &str) -> String {
    CONTROL_SEQUENCES.replace_all(line, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_model_is_deterministic() {
        for tier in [
            CapabilityTier::None,
            CapabilityTier::Low,
            CapabilityTier::Mid,
            CapabilityTier::High,
            CapabilityTier::VeryHigh,
        ] {
            assert_eq!(select_model(tier), select_model(tier));
        }
    }

    #[test]
    fn test_tier_to_model_table() {
        assert_eq!(select_model(CapabilityTier::None).name, "deepseek-r1:8b");
        assert_eq!(select_model(CapabilityTier::Low).name, "deepseek-r1:8b");
        assert_eq!(select_model(CapabilityTier::Mid).name, "deepseek-r1:14b");
        assert_eq!(select_model(CapabilityTier::High).name, "deepseek-r1:32b");
        assert_eq!(select_model(CapabilityTier::VeryHigh).name, "deepseek-r1:70b");

        // Only the small model polls quietly; the rest stream progress.
        assert_eq!(
            select_model(CapabilityTier::None).strategy,
            AcquireStrategy::BackgroundPoll
        );
        assert_eq!(
            select_model(CapabilityTier::VeryHigh).strategy,
            AcquireStrategy::StreamProgress
        );
    }

    #[test]
    fn test_parse_model_list_skips_header_and_blanks() {
        let raw = "NAME                ID        SIZE    MODIFIED\n\
                   deepseek-r1:8b      abc123    5.2 GB  2 days ago\n\
                   \n\
                   llama3.2:latest     def456    2.0 GB  5 weeks ago\n";
        assert_eq!(
            parse_model_list(raw),
            vec!["deepseek-r1:8b".to_string(), "llama3.2:latest".to_string()]
        );
    }

    #[test]
    fn test_alias_counts_as_installed() {
        let installed = vec![LATEST_ALIAS.to_string()];
        assert!(is_listed(&installed, SMALL_MODEL));
        assert!(is_listed(&installed, LATEST_ALIAS));

        let installed = vec![SMALL_MODEL.to_string()];
        assert!(is_listed(&installed, LATEST_ALIAS));

        // The alias shortcut applies to the small tag only.
        let installed = vec![LATEST_ALIAS.to_string()];
        assert!(!is_listed(&installed, "deepseek-r1:70b"));
    }

    #[test]
    fn test_installed_spec_skips_download() {
        let spec = select_model(CapabilityTier::None);
        let installed = vec![LATEST_ALIAS.to_string()];
        assert_eq!(acquire_plan(&spec, &installed), AcquirePlan::AlreadyInstalled);

        let empty: Vec<String> = Vec::new();
        assert_eq!(acquire_plan(&spec, &empty), AcquirePlan::Download);
    }

    #[test]
    fn test_clean_progress_line() {
        assert_eq!(
            clean_progress_line("\x1b[2K\x1b[1Gpulling manifest \x1b[32m100%\x1b[0m"),
            "pulling manifest 100%"
        );
        assert_eq!(clean_progress_line("\x1b[?25l\x1b[?25h"), "");
        assert_eq!(
            clean_progress_line("pulling 6e4c38e1172f...  45% | 2.1 GB/4.7 GB"),
            "pulling 6e4c38e1172f...  45% | 2.1 GB/4.7 GB"
        );
    }
}
