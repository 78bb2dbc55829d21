//! Model runtime startup.

use crate::launch::activity_log::ActivityLog;
use crate::launch::command;
use crate::launch::config::LaunchConfig;
use crate::launch::error::LaunchError;

/// Launch `ollama serve` detached, bound to the configured local address
/// via its environment override. No readiness wait happens here: the later
/// HTTP poll against the front-end covers the runtime transitively. The
/// process is not supervised after launch.
pub fn start_runtime(log: &ActivityLog, config: &LaunchConfig) -> Result<(), LaunchError> {
    log.info(&format!(
        "Starting model runtime on {}...",
        config.runtime_bind
    ));
    command::spawn_detached(
        &config.runtime_tool,
        &["serve"],
        &[("OLLAMA_HOST", config.runtime_bind.as_str())],
    )?;
    log.info("Model runtime started.");
    Ok(())
}
