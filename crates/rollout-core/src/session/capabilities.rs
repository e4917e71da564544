//! Host capability contracts consumed by the session engine.
//!
//! The engine never touches the OS directly for these concerns; frontends
//! supply implementations and tests supply fakes.

use std::time::Duration;

use crate::types::{ActionResult, DeploymentType};

/// Per-pid result of a termination attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminationOutcome {
    pub pid: u32,
    pub terminated: bool,
}

/// Forcibly close blocking processes.
pub trait ProcessTerminator {
    fn terminate(&mut self, pids: &[u32]) -> Vec<TerminationOutcome>;
}

/// Execute the actual install/uninstall/repair payload.
///
/// Invoked synchronously; the engine blocks on completion. An `Err` is an
/// action-execution failure and resolves the session as failed.
pub trait ActionRunner {
    fn execute(&mut self, deployment_type: DeploymentType) -> anyhow::Result<ActionResult>;
}

/// Probe and schedule machine reboots.
pub trait RebootScheduler {
    /// Whether the machine already has a reboot pending for unrelated
    /// reasons (external marker, not produced by this engine).
    fn pending_reboot(&self) -> bool;

    /// Schedule an OS reboot after `delay`.
    fn schedule(&mut self, delay: Duration) -> anyhow::Result<()>;
}
