//! Front-end container lifecycle.
//!
//! One reserved name, two paths: a container that already exists is
//! restarted in place, otherwise a new one is created from the full run
//! specification. The GPU passthrough flag and the image variant are
//! decided together; a CPU image never gets the flag.

use crate::launch::activity_log::ActivityLog;
use crate::launch::command;
use crate::launch::config::LaunchConfig;
use crate::launch::error::LaunchError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrontendAction {
    Restart,
    Create,
}

/// Restart when the reserved name matches an existing container exactly,
/// create otherwise.
pub fn plan_action(existing: &[String], reserved_name: &str) -> FrontendAction {
    if existing.iter().any(|n| n == reserved_name) {
        FrontendAction::Restart
    } else {
        FrontendAction::Create
    }
}

/// Full `docker run` argument vector for a new front-end container.
pub fn create_args(config: &LaunchConfig, gpu_available: bool) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "run".into(),
        "-d".into(),
        "--name".into(),
        config.container_name.clone(),
        "-p".into(),
        format!("{}:{}", config.webui_port, config.container_port),
        "-v".into(),
        config.volume.clone(),
        "--add-host".into(),
        "host.docker.internal:host-gateway".into(),
        "-e".into(),
        format!("PORT={}", config.container_port),
        "-e".into(),
        "HOST=0.0.0.0".into(),
        "-e".into(),
        "WEBUI_AUTH=False".into(),
        "-e".into(),
        format!("OLLAMA_BASE_URL={}", config.runtime_gateway_url),
    ];
    if gpu_available {
        args.push("--gpus=all".into());
        args.push(config.gpu_image.clone());
    } else {
        args.push(config.cpu_image.clone());
    }
    args
}

pub fn ensure_frontend(
    log: &ActivityLog,
    config: &LaunchConfig,
    gpu_available: bool,
) -> Result<(), LaunchError> {
    log.info("Checking for an existing Open WebUI container...");
    let existing = existing_containers(config)?;

    match plan_action(&existing, &config.container_name) {
        FrontendAction::Restart => {
            log.info("Restarting existing Open WebUI container...");
            command::run(
                &config.container_tool,
                &["restart", config.container_name.as_str()],
            )?;
            log.info("Open WebUI container restarted.");
        }
        FrontendAction::Create => {
            let variant = if gpu_available { "GPU" } else { "CPU" };
            log.info(&format!("Starting new Open WebUI container ({variant} image)..."));
            command::run(&config.container_tool, &create_args(config, gpu_available))?;
            log.info("Open WebUI container started.");
        }
    }
    Ok(())
}

/// Names of all containers (running or stopped) matching the reserved name
/// filter. The filter is a substring match, so callers still compare
/// exactly.
fn existing_containers(config: &LaunchConfig) -> Result<Vec<String>, LaunchError> {
    let filter = format!("name={}", config.container_name);
    let out = command::output(
        &config.container_tool,
        &[
            "ps",
            "-a",
            "--filter",
            filter.as_str(),
            "--format",
            "{{.Names}}",
        ],
    )?;
    Ok(out
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}
