//! Configuration schema for rollout.toml.
//!
//! One file describes a deployment: the package identity, the action command
//! lines, the blocking-process list, and the negotiation/reboot policies.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::deferral::DeferralPolicy;
use crate::process::ProcessDescriptor;
use crate::types::DeploymentMode;

/// Root configuration structure for rollout.toml.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RolloutConfig {
    #[serde(default)]
    pub deployment: DeploymentConfig,

    #[serde(default)]
    pub countdown: CountdownConfig,

    #[serde(default)]
    pub deferral: DeferralConfig,

    #[serde(default)]
    pub reboot: RebootConfig,

    #[serde(default)]
    pub silent: SilentConfig,

    #[serde(default)]
    pub action: ActionConfig,

    /// Applications that block the deployment while running.
    #[serde(default, rename = "process")]
    pub processes: Vec<ProcessDescriptor>,
}

impl RolloutConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.countdown.tick_secs == 0 {
            anyhow::bail!("countdown.tick_secs must be at least 1");
        }
        if self.countdown.duration_secs < self.countdown.tick_secs {
            anyhow::bail!("countdown.duration_secs must be at least one tick");
        }
        if self.deferral.deadline.is_some() && self.deferral.deadline_days.is_some() {
            anyhow::bail!(
                "Cannot specify both deferral.deadline and deferral.deadline_days; pick one policy"
            );
        }
        for descriptor in &self.processes {
            if descriptor.pattern.trim().is_empty() {
                anyhow::bail!("process.pattern must not be empty");
            }
        }
        Ok(())
    }
}

/// Package identity and default mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Identity used to key persisted deferral state.
    #[serde(default = "default_package")]
    pub package: String,

    /// Default mode when the frontend does not override it.
    #[serde(default)]
    pub mode: Option<DeploymentMode>,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            package: default_package(),
            mode: None,
        }
    }
}

fn default_package() -> String {
    "default".to_string()
}

/// Countdown prompt policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownConfig {
    #[serde(default = "default_countdown_duration")]
    pub duration_secs: u64,

    /// Re-render granularity of the remaining-time display.
    #[serde(default = "default_tick")]
    pub tick_secs: u64,

    #[serde(default = "default_true")]
    pub allow_defer: bool,

    #[serde(default = "default_true")]
    pub allow_close_now: bool,

    #[serde(default)]
    pub allow_cancel: bool,

    /// When true (the default) a timer expiry is routed like an explicit
    /// "close now"; when false an expiry consumes a deferral while one is
    /// still available.
    #[serde(default = "default_true")]
    pub timeout_forces_close: bool,

    /// Wait between negotiation rounds after a deferral.
    #[serde(default = "default_recheck_wait")]
    pub recheck_wait_secs: u64,
}

impl CountdownConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_secs(self.tick_secs)
    }

    pub fn recheck_wait(&self) -> Duration {
        Duration::from_secs(self.recheck_wait_secs)
    }
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_countdown_duration(),
            tick_secs: default_tick(),
            allow_defer: true,
            allow_close_now: true,
            allow_cancel: false,
            timeout_forces_close: true,
            recheck_wait_secs: default_recheck_wait(),
        }
    }
}

fn default_countdown_duration() -> u64 {
    300
}

fn default_tick() -> u64 {
    1
}

fn default_recheck_wait() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

/// Deferral allowance and deadline policy.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeferralConfig {
    /// How many deferrals a user may exercise. Zero disables deferral.
    #[serde(default)]
    pub allowance: u32,

    /// Absolute instant after which no deferral is grantable.
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,

    /// Days from first run after which no deferral is grantable.
    #[serde(default)]
    pub deadline_days: Option<u32>,
}

impl DeferralConfig {
    pub fn policy(&self) -> DeferralPolicy {
        DeferralPolicy {
            allowance: self.allowance,
            deadline: self.deadline,
            deadline_days: self.deadline_days,
        }
    }
}

/// Reboot policy and pending-marker probes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebootConfig {
    /// Force an immediate reboot when the action reports one is needed.
    #[serde(default)]
    pub force: bool,

    /// Grace delay before a forced reboot.
    #[serde(default = "default_reboot_delay")]
    pub delay_secs: u64,

    /// Files whose existence marks an already-pending reboot.
    #[serde(default)]
    pub pending_marker_paths: Vec<PathBuf>,

    /// Command the host runs to schedule the reboot; empty means log only.
    #[serde(default)]
    pub command: Vec<String>,
}

impl RebootConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

impl Default for RebootConfig {
    fn default() -> Self {
        Self {
            force: false,
            delay_secs: default_reboot_delay(),
            pending_marker_paths: Vec::new(),
            command: Vec::new(),
        }
    }
}

fn default_reboot_delay() -> u64 {
    60
}

/// Unattended-mode handling of blocking processes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SilentConfig {
    /// Terminate blocking processes without a prompt (default). When false
    /// the session fails fast so the orchestrator can retry shortly.
    #[serde(default = "default_true")]
    pub terminate_blocking: bool,
}

impl Default for SilentConfig {
    fn default() -> Self {
        Self {
            terminate_blocking: true,
        }
    }
}

/// Action command lines and exit-code classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionConfig {
    #[serde(default)]
    pub install: Vec<String>,

    #[serde(default)]
    pub uninstall: Vec<String>,

    #[serde(default)]
    pub repair: Vec<String>,

    #[serde(default = "default_success_codes")]
    pub success_codes: Vec<i32>,

    #[serde(default = "default_reboot_codes")]
    pub reboot_codes: Vec<i32>,

    #[serde(default = "default_cancel_codes")]
    pub cancel_codes: Vec<i32>,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            install: Vec::new(),
            uninstall: Vec::new(),
            repair: Vec::new(),
            success_codes: default_success_codes(),
            reboot_codes: default_reboot_codes(),
            cancel_codes: default_cancel_codes(),
        }
    }
}

fn default_success_codes() -> Vec<i32> {
    vec![0]
}

fn default_reboot_codes() -> Vec<i32> {
    vec![1641, 3010]
}

fn default_cancel_codes() -> Vec<i32> {
    vec![1602]
}

/// Parse-time validation entry point used by the parser module.
pub(crate) fn validate(config: &RolloutConfig) -> anyhow::Result<()> {
    config
        .validate()
        .context("Invalid rollout configuration")
}
