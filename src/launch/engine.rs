//! The orchestration engine: one sequential pass over the launch steps,
//! narrating every move through the activity log.

use crate::launch::activity_log::ActivityLog;
use crate::launch::config::LaunchConfig;
use crate::launch::container;
use crate::launch::error::LaunchError;
use crate::launch::gpu::{self, CapabilityTier};
use crate::launch::model;
use crate::launch::prereq;
use crate::launch::readiness;
use crate::launch::runtime;
use crate::launch::session::{LaunchSession, LaunchStep};

pub struct LaunchEngine {
    config: LaunchConfig,
    log: ActivityLog,
    session: LaunchSession,
}

impl LaunchEngine {
    pub fn new(config: LaunchConfig) -> Result<Self, LaunchError> {
        let log = ActivityLog::open(
            &config.log_path,
            &config.done_flag_path,
            config.max_log_bytes,
        )?;
        Ok(LaunchEngine {
            config,
            log,
            session: LaunchSession::new(),
        })
    }

    pub fn session(&self) -> &LaunchSession {
        &self.session
    }

    /// Run the whole launch. On success the completion sentinel is set; on
    /// failure the last log line names the failing step and the sentinel
    /// never appears.
    pub fn run(&mut self) -> Result<(), LaunchError> {
        self.log.reset()?;
        self.log.info("Launching Open WebUI Assistant...");

        let result = self.run_steps();
        match &result {
            Ok(()) => {
                self.session.succeed();
                self.log.mark_complete()?;
            }
            Err(e) => {
                self.session.fail();
                self.log
                    .error(&format!("Launch failed while {}: {e}", self.session.step().label()));
            }
        }
        result
    }

    fn run_steps(&mut self) -> Result<(), LaunchError> {
        self.session.advance(LaunchStep::CheckingPrereqs);
        for tool in [&self.config.runtime_tool, &self.config.container_tool] {
            if !prereq::ensure_tool(&self.log, tool) {
                return Err(LaunchError::MissingTool(tool.clone()));
            }
        }
        if !prereq::ensure_container_runtime(&self.log, &self.config) {
            return Err(LaunchError::RuntimeUnavailable(
                "docker daemon never became ready".to_string(),
            ));
        }

        self.session.advance(LaunchStep::DetectingCapability);
        let memory_gb = gpu::detect_gpu_memory_gb(&self.log);
        let tier = CapabilityTier::from_memory_gb(memory_gb);
        let gpu_available = tier != CapabilityTier::None;
        self.log
            .info(&format!("GPU capability tier: {}.", tier.label()));

        self.session.advance(LaunchStep::AcquiringModel);
        let spec = model::select_model(tier);
        model::acquire(&self.log, &self.config, &spec)?;

        self.session.advance(LaunchStep::StartingRuntime);
        runtime::start_runtime(&self.log, &self.config)?;

        self.session.advance(LaunchStep::ManagingContainer);
        container::ensure_frontend(&self.log, &self.config, gpu_available)?;

        self.session.advance(LaunchStep::PollingReadiness);
        if !readiness::wait_ready(&self.log, &self.config) {
            return Err(LaunchError::Timeout {
                what: "web interface".to_string(),
            });
        }

        Ok(())
    }
}
