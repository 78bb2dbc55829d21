// Launch orchestration modules for the Open WebUI assistant

pub mod activity_log;
pub mod command;
pub mod config;
pub mod container;
pub mod engine;
pub mod error;
pub mod gpu;
pub mod model;
pub mod prereq;
pub mod readiness;
pub mod retry;
pub mod runtime;
pub mod session;
pub mod status;

// Re-export the surface the binary works with
pub use activity_log::{ActivityLog, Severity};
pub use config::LaunchConfig;
pub use engine::LaunchEngine;
pub use error::LaunchError;
pub use gpu::CapabilityTier;
pub use model::{AcquireStrategy, ModelSpec};
pub use session::{LaunchSession, LaunchStep, SessionState};
pub use status::StatusReader;
