//! Launch configuration.
//!
//! Every process-wide constant (ports, reserved names, image tags, retry
//! budgets, log locations) lives in one immutable struct handed to the
//! engine at construction. A `launcher.json` next to the log directory can
//! override individual fields.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Directory name under the per-user state root.
const APP_DIR_NAME: &str = "OpenWebUIAssistant";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    /// Host port the front-end is published on.
    pub webui_port: u16,
    /// Port the front-end listens on inside the container.
    pub container_port: u16,
    /// Reserved container identity. At most one container with this name
    /// exists at a time.
    pub container_name: String,
    /// Model runtime executable.
    pub runtime_tool: String,
    /// Container engine executable.
    pub container_tool: String,
    pub cpu_image: String,
    pub gpu_image: String,
    /// Named volume binding, `volume:mount-point`.
    pub volume: String,
    /// Bind address handed to the model runtime via its environment.
    pub runtime_bind: String,
    /// Runtime base URL as seen from inside the container, through the
    /// host-gateway alias.
    pub runtime_gateway_url: String,

    pub runtime_start_attempts: u32,
    pub runtime_start_interval_secs: u64,
    pub pull_poll_attempts: u32,
    pub pull_poll_interval_secs: u64,
    pub ready_attempts: u32,
    pub ready_interval_secs: u64,
    pub ready_request_timeout_secs: u64,
    /// A 200 with a body shorter than this is still "not ready" (placeholder
    /// pages from a half-started proxy).
    pub ready_min_body_bytes: usize,

    pub log_path: PathBuf,
    pub done_flag_path: PathBuf,
    pub max_log_bytes: u64,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        let logs = state_dir().join("logs");
        Self {
            webui_port: 3000,
            container_port: 3000,
            container_name: "open-webui".to_string(),
            runtime_tool: "ollama".to_string(),
            container_tool: "docker".to_string(),
            cpu_image: "ghcr.io/open-webui/open-webui:main".to_string(),
            gpu_image: "ghcr.io/open-webui/open-webui:cuda".to_string(),
            volume: "open-webui:/app/backend/data".to_string(),
            runtime_bind: "127.0.0.1:11434".to_string(),
            runtime_gateway_url: "http://host.docker.internal:11434".to_string(),
            runtime_start_attempts: 30,
            runtime_start_interval_secs: 3,
            pull_poll_attempts: 150,
            pull_poll_interval_secs: 10,
            ready_attempts: 30,
            ready_interval_secs: 2,
            ready_request_timeout_secs: 1,
            ready_min_body_bytes: 64,
            log_path: logs.join("assistant.log"),
            done_flag_path: logs.join(".launch_done"),
            max_log_bytes: 512 * 1024,
        }
    }
}

impl LaunchConfig {
    /// Load the default config, applying `launcher.json` overrides if the
    /// file exists and parses. A malformed file is reported and ignored.
    pub fn load() -> Self {
        let path = state_dir().join("launcher.json");
        match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Ignoring malformed {}: {e}", path.display());
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Root URL opened in the browser once the front-end is up.
    pub fn webui_url(&self) -> String {
        format!("http://localhost:{}", self.webui_port)
    }

    /// URL polled for readiness. The auth page renders without a session,
    /// so a 200 here means the app booted.
    pub fn ready_probe_url(&self) -> String {
        format!("http://localhost:{}/auth", self.webui_port)
    }

    pub fn runtime_start_interval(&self) -> Duration {
        Duration::from_secs(self.runtime_start_interval_secs)
    }

    pub fn pull_poll_interval(&self) -> Duration {
        Duration::from_secs(self.pull_poll_interval_secs)
    }

    pub fn ready_interval(&self) -> Duration {
        Duration::from_secs(self.ready_interval_secs)
    }

    pub fn ready_request_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_request_timeout_secs)
    }
}

/// Per-user state directory: `%LOCALAPPDATA%` on Windows, the home
/// directory elsewhere, falling back to the current directory.
fn state_dir() -> PathBuf {
    let base = env::var_os("LOCALAPPDATA")
        .or_else(|| env::var_os("HOME"))
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    base.join(APP_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths_share_a_directory() {
        let config = LaunchConfig::default();
        assert_eq!(
            config.log_path.parent(),
            config.done_flag_path.parent(),
            "sentinel must live next to the log"
        );
    }

    #[test]
    fn test_urls_use_configured_port() {
        let mut config = LaunchConfig::default();
        config.webui_port = 8080;
        assert_eq!(config.webui_url(), "http://localhost:8080");
        assert_eq!(config.ready_probe_url(), "http://localhost:8080/auth");
    }

    #[test]
    fn test_partial_json_override_keeps_defaults() {
        let config: LaunchConfig =
            serde_json::from_str(r#"{"webui_port": 4000}"#).unwrap();
        assert_eq!(config.webui_port, 4000);
        assert_eq!(config.container_name, "open-webui");
        assert_eq!(config.pull_poll_attempts, 150);
    }
}
