//! Shared core types used across the session engine.

use serde::{Deserialize, Serialize};

/// What a deployment session does to the target package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentType {
    Install,
    Uninstall,
    Repair,
}

impl DeploymentType {
    pub fn as_str(self) -> &'static str {
        match self {
            DeploymentType::Install => "install",
            DeploymentType::Uninstall => "uninstall",
            DeploymentType::Repair => "repair",
        }
    }
}

/// Whether a user is present to respond to prompts.
///
/// Silent and NonInteractive both skip negotiation; Silent additionally
/// suppresses every notice the host UI would otherwise show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentMode {
    Interactive,
    Silent,
    NonInteractive,
}

impl DeploymentMode {
    /// True when a user can be asked to make a choice.
    pub fn is_attended(self) -> bool {
        matches!(self, DeploymentMode::Interactive)
    }
}

/// Classification of an action capability's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionDisposition {
    Success,
    SuccessWithReboot,
    Failure,
    Cancelled,
}

/// Exit code and classification returned by the external action capability.
///
/// Consumed, never mutated, by the reboot coordinator and exit code resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub exit_code: i32,
    pub disposition: ActionDisposition,
}

impl ActionResult {
    pub fn success() -> Self {
        Self {
            exit_code: 0,
            disposition: ActionDisposition::Success,
        }
    }

    pub fn success_with_reboot(exit_code: i32) -> Self {
        Self {
            exit_code,
            disposition: ActionDisposition::SuccessWithReboot,
        }
    }

    pub fn failure(exit_code: i32) -> Self {
        Self {
            exit_code,
            disposition: ActionDisposition::Failure,
        }
    }

    pub fn cancelled(exit_code: i32) -> Self {
        Self {
            exit_code,
            disposition: ActionDisposition::Cancelled,
        }
    }
}

/// Single decision produced by one countdown negotiation.
///
/// `TimedOut` is deliberately kept distinct from `CloseProcessesNow` even
/// though the session currently routes both the same way; the routing is a
/// configuration policy, not a property of the decision itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownDecision {
    Continue,
    Defer,
    CloseProcessesNow,
    TimedOut,
    UserCancelled,
}

/// Final classification of a deployment session.
///
/// Set exactly once by the session state machine, immediately before the
/// process exit code is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionOutcome {
    DeploymentSuccess,
    DeploymentSuccessRebootRequired,
    DeploymentFailed,
    DeploymentFastRetryNeeded,
    DeploymentCancelledByUser,
    DeploymentBlockedByDeferralExpiry,
}
