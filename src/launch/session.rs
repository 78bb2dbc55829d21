//! Launch session state machine.
//!
//! Steps advance strictly forward; any failure jumps straight to the
//! failed terminal state and nothing moves after that.

use chrono::{DateTime, Local};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaunchStep {
    Pending,
    CheckingPrereqs,
    DetectingCapability,
    AcquiringModel,
    StartingRuntime,
    ManagingContainer,
    PollingReadiness,
}

impl LaunchStep {
    fn ordinal(self) -> u8 {
        match self {
            LaunchStep::Pending => 0,
            LaunchStep::CheckingPrereqs => 1,
            LaunchStep::DetectingCapability => 2,
            LaunchStep::AcquiringModel => 3,
            LaunchStep::StartingRuntime => 4,
            LaunchStep::ManagingContainer => 5,
            LaunchStep::PollingReadiness => 6,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LaunchStep::Pending => "pending",
            LaunchStep::CheckingPrereqs => "checking prerequisites",
            LaunchStep::DetectingCapability => "detecting GPU capability",
            LaunchStep::AcquiringModel => "acquiring model",
            LaunchStep::StartingRuntime => "starting model runtime",
            LaunchStep::ManagingContainer => "managing front-end container",
            LaunchStep::PollingReadiness => "waiting for readiness",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Pending,
    Success,
    Failed,
}

#[derive(Debug)]
pub struct LaunchSession {
    started_at: DateTime<Local>,
    step: LaunchStep,
    state: SessionState,
}

impl LaunchSession {
    pub fn new() -> Self {
        LaunchSession {
            started_at: Local::now(),
            step: LaunchStep::Pending,
            state: SessionState::Pending,
        }
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn step(&self) -> LaunchStep {
        self.step
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Move to the next step. Backward moves and moves after a terminal
    /// state are ignored.
    pub fn advance(&mut self, step: LaunchStep) {
        if self.state != SessionState::Pending {
            return;
        }
        if step.ordinal() > self.step.ordinal() {
            self.step = step;
        }
    }

    pub fn succeed(&mut self) {
        if self.state == SessionState::Pending {
            self.state = SessionState::Success;
        }
    }

    pub fn fail(&mut self) {
        if self.state == SessionState::Pending {
            self.state = SessionState::Failed;
        }
    }
}

impl Default for LaunchSession {
    fn default() -> Self {
        Self::new()
    }
}
