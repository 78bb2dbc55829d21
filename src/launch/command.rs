//! Subprocess helpers shared by every step that shells out.

use std::ffi::OsStr;
use std::process::{Child, Command, Stdio};

use crate::launch::error::LaunchError;

fn render<S: AsRef<OsStr>>(program: &str, args: &[S]) -> String {
    let mut parts = vec![program.to_string()];
    parts.extend(args.iter().map(|a| a.as_ref().to_string_lossy().into_owned()));
    parts.join(" ")
}

/// Run to completion with stdio suppressed; non-zero exit is an error
/// carrying the rendered command line and exit code.
pub fn run<S: AsRef<OsStr>>(program: &str, args: &[S]) -> Result<(), LaunchError> {
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|source| LaunchError::Spawn {
            command: render(program, args),
            source,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(LaunchError::CommandFailed {
            command: render(program, args),
            code: status.code(),
        })
    }
}

/// Run and capture stdout. Non-zero exit is an error.
pub fn output<S: AsRef<OsStr>>(program: &str, args: &[S]) -> Result<String, LaunchError> {
    let out = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| LaunchError::Spawn {
            command: render(program, args),
            source,
        })?;

    if out.status.success() {
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    } else {
        Err(LaunchError::CommandFailed {
            command: render(program, args),
            code: out.status.code(),
        })
    }
}

/// Probe variant of [`output`]: any failure (missing binary, non-zero exit)
/// collapses to `None`.
pub fn try_output<S: AsRef<OsStr>>(program: &str, args: &[S]) -> Option<String> {
    let out = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .ok()?;
    if out.status.success() {
        Some(String::from_utf8_lossy(&out.stdout).into_owned())
    } else {
        None
    }
}

/// Spawn without waiting, stdio detached, with environment overrides. The
/// child outlives the caller; nobody reaps or supervises it.
pub fn spawn_detached<S: AsRef<OsStr>>(
    program: &str,
    args: &[S],
    envs: &[(&str, &str)],
) -> Result<Child, LaunchError> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    for (key, value) in envs {
        cmd.env(key, value);
    }
    cmd.spawn().map_err(|source| LaunchError::Spawn {
        command: render(program, args),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_error_names_the_command() {
        let err = run("definitely-not-a-real-binary-xyz", &["--version"]).unwrap_err();
        match err {
            LaunchError::Spawn { command, .. } => {
                assert!(command.starts_with("definitely-not-a-real-binary-xyz"));
            }
            other => panic!("expected Spawn, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_carries_code() {
        let err = run("sh", &["-c", "exit 7"]).unwrap_err();
        match err {
            LaunchError::CommandFailed { code, .. } => assert_eq!(code, Some(7)),
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_output_captures_stdout() {
        let out = output("sh", &["-c", "echo hello"]).unwrap();
        assert_eq!(out.trim(), "hello");
    }
}
