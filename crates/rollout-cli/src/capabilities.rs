//! Concrete host capabilities backing the session engine.

use std::process::Command;
use std::time::Duration;

use anyhow::Context;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

use rollout_core::config::{ActionConfig, RebootConfig};
use rollout_core::session::{
    ActionRunner, ProcessTerminator, RebootScheduler, TerminationOutcome,
};
use rollout_core::types::{ActionResult, DeploymentType};

/// Runs the configured action command line and classifies its exit status
/// against the configured code lists.
pub struct CommandActionRunner {
    action: ActionConfig,
}

impl CommandActionRunner {
    pub fn new(action: ActionConfig) -> Self {
        Self { action }
    }

    fn command_for(&self, deployment_type: DeploymentType) -> &[String] {
        match deployment_type {
            DeploymentType::Install => &self.action.install,
            DeploymentType::Uninstall => &self.action.uninstall,
            DeploymentType::Repair => &self.action.repair,
        }
    }

    fn classify(&self, exit_code: i32) -> ActionResult {
        if self.action.success_codes.contains(&exit_code) {
            ActionResult {
                exit_code,
                disposition: rollout_core::types::ActionDisposition::Success,
            }
        } else if self.action.reboot_codes.contains(&exit_code) {
            ActionResult::success_with_reboot(exit_code)
        } else if self.action.cancel_codes.contains(&exit_code) {
            ActionResult::cancelled(exit_code)
        } else {
            ActionResult::failure(exit_code)
        }
    }
}

impl ActionRunner for CommandActionRunner {
    fn execute(&mut self, deployment_type: DeploymentType) -> anyhow::Result<ActionResult> {
        let command_line = self.command_for(deployment_type);
        let (program, args) = command_line
            .split_first()
            .with_context(|| format!("No {} command configured", deployment_type.as_str()))?;

        tracing::info!(command = %command_line.join(" "), "executing action");
        let status = Command::new(program)
            .args(args)
            .status()
            .with_context(|| format!("Failed to launch action command: {program}"))?;

        // A signal-terminated action has no code; treat it as a plain failure.
        let exit_code = status.code().unwrap_or(rollout_core::exitcode::FAILURE);
        Ok(self.classify(exit_code))
    }
}

/// Terminates blocking processes through the OS process table.
pub struct SystemTerminator {
    system: System,
}

impl SystemTerminator {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SystemTerminator {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTerminator for SystemTerminator {
    fn terminate(&mut self, pids: &[u32]) -> Vec<TerminationOutcome> {
        let targets: Vec<Pid> = pids.iter().map(|p| Pid::from_u32(*p)).collect();
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&targets),
            true,
            ProcessRefreshKind::nothing(),
        );

        pids.iter()
            .map(|&pid| {
                let terminated = match self.system.process(Pid::from_u32(pid)) {
                    Some(process) => process.kill(),
                    // Already gone is as good as terminated.
                    None => true,
                };
                if !terminated {
                    tracing::warn!(pid, "could not terminate process");
                }
                TerminationOutcome { pid, terminated }
            })
            .collect()
    }
}

/// Probes configured marker files and schedules reboots via the configured
/// command (log-only when none is set).
pub struct MarkerRebootScheduler {
    config: RebootConfig,
}

impl MarkerRebootScheduler {
    pub fn new(config: RebootConfig) -> Self {
        Self { config }
    }
}

impl RebootScheduler for MarkerRebootScheduler {
    fn pending_reboot(&self) -> bool {
        self.config
            .pending_marker_paths
            .iter()
            .any(|path| path.exists())
    }

    fn schedule(&mut self, delay: Duration) -> anyhow::Result<()> {
        if self.config.command.is_empty() {
            tracing::warn!(
                delay_secs = delay.as_secs(),
                "no reboot command configured; reboot must be scheduled externally"
            );
            return Ok(());
        }

        let rendered: Vec<String> = self
            .config
            .command
            .iter()
            .map(|arg| arg.replace("{delay_secs}", &delay.as_secs().to_string()))
            .collect();
        let (program, args) = rendered
            .split_first()
            .context("Reboot command is empty after rendering")?;

        tracing::info!(command = %rendered.join(" "), "scheduling reboot");
        let status = Command::new(program)
            .args(args)
            .status()
            .with_context(|| format!("Failed to launch reboot command: {program}"))?;
        if !status.success() {
            anyhow::bail!("Reboot command exited with {status}");
        }
        Ok(())
    }
}
