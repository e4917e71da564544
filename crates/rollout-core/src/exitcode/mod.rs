//! Stable exit-code contract consumed by external orchestrators.
//!
//! Orchestrators branch on these exact values; changing one is a breaking
//! change to every management agent that invokes rollout. The codes follow
//! Windows-installer conventions where those exist, because fleet tooling
//! already understands them.

use crate::types::{ActionDisposition, ActionResult, SessionOutcome};

/// Deployment completed successfully.
pub const SUCCESS: i32 = 0;
/// Deployment succeeded but the machine needs a reboot.
pub const SUCCESS_REBOOT_REQUIRED: i32 = 3010;
/// Deployment failed; used when the action produced no code of its own.
pub const FAILURE: i32 = 1603;
/// Deployment could not start and should be retried shortly.
pub const FAST_RETRY: i32 = 1618;
/// The user cancelled the deployment.
pub const USER_CANCELLED: i32 = 1602;
/// The deployment was blocked after the deferral window expired.
pub const DEFERRAL_EXPIRED: i32 = 60012;

/// Map a session outcome (plus the action result, when one exists) to the
/// process exit code.
///
/// Total by construction: the match is exhaustive over `SessionOutcome`, so
/// an outcome added without a mapping fails to compile instead of silently
/// defaulting to success.
pub fn resolve(outcome: SessionOutcome, action: Option<&ActionResult>) -> i32 {
    match outcome {
        SessionOutcome::DeploymentSuccess => SUCCESS,
        SessionOutcome::DeploymentSuccessRebootRequired => SUCCESS_REBOOT_REQUIRED,
        SessionOutcome::DeploymentFailed => action
            .filter(|a| a.disposition == ActionDisposition::Failure && a.exit_code != 0)
            .map(|a| a.exit_code)
            .unwrap_or(FAILURE),
        SessionOutcome::DeploymentFastRetryNeeded => FAST_RETRY,
        SessionOutcome::DeploymentCancelledByUser => USER_CANCELLED,
        SessionOutcome::DeploymentBlockedByDeferralExpiry => DEFERRAL_EXPIRED,
    }
}
