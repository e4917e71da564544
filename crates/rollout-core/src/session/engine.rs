//! The deployment session state machine.
//!
//! Owns the authoritative outcome of one run. Phases:
//! `Initializing → PreCheck → Negotiating(0..N) → Executing → PostCheck →
//! Resolved`. Silent and non-interactive modes skip `Negotiating` entirely:
//! blocking processes are force-closed, or the run fails fast for a quick
//! orchestrator retry, per configuration.

use chrono::{DateTime, Utc};

use crate::config::RolloutConfig;
use crate::countdown::{Clock, CountdownPrompt, Negotiator};
use crate::deferral::{DeferralLedger, DeferralState};
use crate::error::EngineError;
use crate::exitcode;
use crate::process::{ProcessObserver, blocking_processes};
use crate::reboot::{self, RebootDecision};
use crate::types::{
    ActionDisposition, ActionResult, CountdownDecision, DeploymentMode, DeploymentType,
    SessionOutcome,
};

use super::capabilities::{ActionRunner, ProcessTerminator, RebootScheduler};

/// Where the session currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Initializing,
    PreCheck,
    Negotiating,
    Executing,
    PostCheck,
    Resolved,
}

/// One deployment run. Created at process start, owned exclusively by the
/// engine, destroyed when the process exits.
#[derive(Debug, Clone)]
pub struct DeploymentSession {
    pub deployment_type: DeploymentType,
    pub mode: DeploymentMode,
    pub started_at: DateTime<Utc>,
    pub phase: SessionPhase,
    pub outcome: Option<SessionOutcome>,
}

/// Capability bundle supplied by the host for one run.
pub struct SessionServices<'a> {
    pub observer: &'a mut dyn ProcessObserver,
    pub prompt: &'a mut dyn CountdownPrompt,
    pub terminator: &'a mut dyn ProcessTerminator,
    pub runner: &'a mut dyn ActionRunner,
    pub reboot: &'a mut dyn RebootScheduler,
    pub clock: &'a dyn Clock,
}

/// Resolved result of a session, ready for the process boundary.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub outcome: SessionOutcome,
    pub exit_code: i32,
    pub reboot: RebootDecision,
    pub action: Option<ActionResult>,
    pub deferrals_used: u32,
}

enum NegotiationExit {
    Proceed,
    Cancelled,
}

/// Drives one deployment session to a resolved report.
pub struct SessionEngine<'a> {
    config: &'a RolloutConfig,
    ledger: DeferralLedger,
    session: DeploymentSession,
    deferrals_used: u32,
}

impl<'a> SessionEngine<'a> {
    pub fn new(
        config: &'a RolloutConfig,
        ledger: DeferralLedger,
        deployment_type: DeploymentType,
        mode: DeploymentMode,
    ) -> Self {
        Self {
            config,
            ledger,
            session: DeploymentSession {
                deployment_type,
                mode,
                started_at: Utc::now(),
                phase: SessionPhase::Initializing,
                outcome: None,
            },
            deferrals_used: 0,
        }
    }

    pub fn session(&self) -> &DeploymentSession {
        &self.session
    }

    /// Run the session to completion.
    ///
    /// Never fails across the boundary: any internal error is resolved into
    /// the `DeploymentFailed` outcome, so the host only ever sees a report.
    pub fn run(&mut self, services: &mut SessionServices<'_>) -> SessionReport {
        match self.try_run(services) {
            Ok(report) => report,
            Err(err) => {
                tracing::error!(error = %format!("{err:#}"), "session failed on internal error");
                self.resolve(SessionOutcome::DeploymentFailed, None, RebootDecision::NoReboot)
            }
        }
    }

    fn try_run(&mut self, services: &mut SessionServices<'_>) -> anyhow::Result<SessionReport> {
        tracing::info!(
            deployment_type = self.session.deployment_type.as_str(),
            mode = ?self.session.mode,
            package = self.ledger.package(),
            "deployment session starting"
        );

        let policy = self.config.deferral.policy();
        let mut state = self
            .ledger
            .load_or_init(&policy, services.clock.wall_now())?;
        self.deferrals_used = state.used;

        self.session.phase = SessionPhase::PreCheck;
        let snapshot = services.observer.observe(&self.config.processes);
        let blocking = blocking_processes(&self.config.processes, &snapshot);

        if !blocking.is_empty() {
            if self.session.mode.is_attended() {
                match self.negotiate_until_clear(services, &mut state)? {
                    NegotiationExit::Proceed => {}
                    NegotiationExit::Cancelled => {
                        let outcome = if state.deadline_reached(services.clock.wall_now()) {
                            SessionOutcome::DeploymentBlockedByDeferralExpiry
                        } else {
                            SessionOutcome::DeploymentCancelledByUser
                        };
                        return Ok(self.resolve(outcome, None, RebootDecision::NoReboot));
                    }
                }
            } else if self.config.silent.terminate_blocking {
                tracing::info!(
                    count = blocking.len(),
                    "unattended mode: closing blocking processes without prompt"
                );
                let pids: Vec<u32> = blocking.iter().map(|p| p.pid).collect();
                self.terminate(services, &pids);
            } else {
                tracing::warn!(
                    count = blocking.len(),
                    "unattended mode with blocking processes; failing fast for retry"
                );
                return Ok(self.resolve(
                    SessionOutcome::DeploymentFastRetryNeeded,
                    None,
                    RebootDecision::NoReboot,
                ));
            }
        }

        self.session.phase = SessionPhase::Executing;
        let action = match services.runner.execute(self.session.deployment_type) {
            Ok(result) => result,
            Err(err) => {
                let err = EngineError::ActionExecution(format!("{err:#}"));
                tracing::error!(%err, "action capability failed");
                return Ok(self.resolve(
                    SessionOutcome::DeploymentFailed,
                    None,
                    RebootDecision::NoReboot,
                ));
            }
        };
        tracing::info!(
            exit_code = action.exit_code,
            disposition = ?action.disposition,
            "action completed"
        );

        self.session.phase = SessionPhase::PostCheck;
        let pending = services.reboot.pending_reboot();
        let reboot = reboot::decide(&action, pending, &self.config.reboot);
        if reboot == RebootDecision::RebootForcedNow {
            // Scheduling failures must not undo a successful deployment.
            if let Err(err) = services.reboot.schedule(self.config.reboot.delay()) {
                tracing::warn!(
                    error = %format!("{err:#}"),
                    "failed to schedule forced reboot"
                );
            }
        }

        let outcome = match action.disposition {
            ActionDisposition::Failure => SessionOutcome::DeploymentFailed,
            ActionDisposition::Cancelled => SessionOutcome::DeploymentCancelledByUser,
            ActionDisposition::Success | ActionDisposition::SuccessWithReboot => {
                if reboot == RebootDecision::NoReboot {
                    SessionOutcome::DeploymentSuccess
                } else {
                    SessionOutcome::DeploymentSuccessRebootRequired
                }
            }
        };
        Ok(self.resolve(outcome, Some(action), reboot))
    }

    /// Loop negotiations until the deployment may proceed or the user
    /// cancels. Each `Defer` waits the configured recheck interval and then
    /// re-observes; the negotiator itself short-circuits when the blocking
    /// set has emptied.
    fn negotiate_until_clear(
        &mut self,
        services: &mut SessionServices<'_>,
        state: &mut DeferralState,
    ) -> anyhow::Result<NegotiationExit> {
        let negotiator = Negotiator::new(&self.config.countdown, &self.ledger);
        loop {
            self.session.phase = SessionPhase::Negotiating;
            let outcome = negotiator.negotiate(
                &self.config.processes,
                state.clone(),
                services.observer,
                services.prompt,
                services.clock,
            )?;
            *state = outcome.state;
            self.deferrals_used = state.used;

            match outcome.decision {
                CountdownDecision::Continue => return Ok(NegotiationExit::Proceed),
                CountdownDecision::CloseProcessesNow | CountdownDecision::TimedOut => {
                    let snapshot = services.observer.observe(&self.config.processes);
                    let pids: Vec<u32> =
                        blocking_processes(&self.config.processes, &snapshot)
                            .iter()
                            .map(|p| p.pid)
                            .collect();
                    self.terminate(services, &pids);
                    return Ok(NegotiationExit::Proceed);
                }
                CountdownDecision::Defer => {
                    tracing::info!(
                        remaining = state.remaining(),
                        "deployment deferred; waiting before re-check"
                    );
                    services.clock.sleep(self.config.countdown.recheck_wait());
                }
                CountdownDecision::UserCancelled => return Ok(NegotiationExit::Cancelled),
            }
        }
    }

    /// Close blocking processes; failures are logged and the run proceeds,
    /// because an unattended deployment must not hang on a stuck process.
    fn terminate(&self, services: &mut SessionServices<'_>, pids: &[u32]) {
        if pids.is_empty() {
            return;
        }
        let results = services.terminator.terminate(pids);
        let failed = results.iter().filter(|r| !r.terminated).count();
        if failed > 0 {
            let err = EngineError::ProcessTermination {
                attempted: results.len(),
                failed,
            };
            tracing::warn!(%err, "continuing despite termination failures");
        }
    }

    fn resolve(
        &mut self,
        outcome: SessionOutcome,
        action: Option<ActionResult>,
        reboot: RebootDecision,
    ) -> SessionReport {
        debug_assert!(
            self.session.outcome.is_none(),
            "session outcome must be set exactly once"
        );
        self.session.outcome = Some(outcome);
        self.session.phase = SessionPhase::Resolved;

        let exit_code = exitcode::resolve(outcome, action.as_ref());
        tracing::info!(?outcome, exit_code, "deployment session resolved");

        SessionReport {
            outcome,
            exit_code,
            reboot,
            action,
            deferrals_used: self.deferrals_used,
        }
    }
}
