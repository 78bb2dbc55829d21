use std::env;
use std::process::{self, Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::Context;

use webui_assistant::launch::{LaunchConfig, LaunchEngine, StatusReader};

/// How often the status follower re-reads the log tail.
const FOLLOW_INTERVAL: Duration = Duration::from_millis(500);

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return;
    }

    let config = LaunchConfig::load();

    // Engine mode: run the orchestration inline. This is what the detached
    // child executes; it must be dispatched before anything else.
    if args.iter().any(|a| a == "--engine") {
        if let Err(e) = run_engine(config) {
            eprintln!("{e:#}");
            process::exit(1);
        }
        return;
    }

    // Follow mode: act only as the status sibling for an engine that some
    // other invocation started.
    if args.iter().any(|a| a == "--follow") {
        let reader = StatusReader::new(&config.log_path, &config.done_flag_path);
        reader.follow(FOLLOW_INTERVAL, |message| println!("{message}"));
        return;
    }

    // Default: detach the engine as a child of this launcher, then follow
    // its activity log until the sentinel appears or the child dies.
    match spawn_engine_child() {
        Ok(child) => {
            let code = follow_child(&config, child);
            process::exit(code);
        }
        Err(e) => {
            eprintln!("{e:#}");
            process::exit(1);
        }
    }
}

fn run_engine(config: LaunchConfig) -> anyhow::Result<()> {
    let mut engine = LaunchEngine::new(config).context("could not open the activity log")?;
    engine.run().context("launch failed")?;
    Ok(())
}

/// Re-exec this binary with `--engine`, fully detached from our stdio.
/// Closing the follower leaves the engine running; there is no mid-step
/// cancellation.
fn spawn_engine_child() -> anyhow::Result<Child> {
    let exe = env::current_exe().context("cannot locate own executable")?;
    Command::new(&exe)
        .arg("--engine")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to spawn {}", exe.display()))
}

/// Tail the log like the splash process does, watching the child on the
/// side so a crashed engine does not leave us polling forever. Returns the
/// launcher's exit code.
fn follow_child(config: &LaunchConfig, mut child: Child) -> i32 {
    let reader = StatusReader::new(&config.log_path, &config.done_flag_path);
    let mut last = String::new();

    loop {
        let message = reader.latest();
        if message != last {
            println!("{message}");
            last = message;
        }

        if reader.is_complete() {
            return 0;
        }

        if let Ok(Some(status)) = child.try_wait() {
            // Drain the final status line before deciding.
            let message = reader.latest();
            if message != last {
                println!("{message}");
            }
            if reader.is_complete() {
                return 0;
            }
            eprintln!("Launch did not complete (engine exit code {:?}).", status.code());
            return match status.code() {
                Some(code) if code != 0 => code,
                _ => 1,
            };
        }

        thread::sleep(FOLLOW_INTERVAL);
    }
}

fn print_help() {
    println!("webui_assistant: bring up Ollama + Open WebUI and open a browser");
    println!();
    println!("Usage: webui_assistant [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --engine    Run the launch orchestration in this process");
    println!("  --follow    Only follow the activity log of a running launch");
    println!("  -h, --help  Show this help");
    println!();
    println!("With no options, the launcher starts the engine detached and");
    println!("follows its activity log until the launch completes.");
}
