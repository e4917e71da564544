//! Countdown negotiation with the interactive user.
//!
//! One negotiation is a small state machine (`Waiting` until a user response
//! or timer expiry) driven as a non-blocking poll loop: every tick the
//! blocking-process set is re-observed, the prompt is re-rendered with the
//! remaining time, and a pending user action is collected if there is one.
//! No thread blocks waiting for input, so a manual app closure is detected
//! before the timer runs out.

pub mod clock;

use std::time::Duration;

use crate::config::CountdownConfig;
use crate::deferral::{DeferralLedger, DeferralState};
use crate::process::{ProcessDescriptor, ProcessObserver, RunningProcess, blocking_processes};
use crate::types::CountdownDecision;

pub use clock::{Clock, SystemClock};

/// Action the user picked in the countdown dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAction {
    Defer,
    CloseNow,
    Cancel,
}

/// Everything the UI needs to render one countdown tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownView {
    /// Display labels of the applications still blocking the deployment.
    pub blocking: Vec<String>,
    pub remaining: Duration,
    pub deferrals_remaining: u32,
    pub allow_defer: bool,
    pub allow_close_now: bool,
    pub allow_cancel: bool,
}

/// UI capability contract for the countdown dialog.
///
/// `poll` must not block: it renders the view and returns a pending user
/// action if one arrived since the last tick.
pub trait CountdownPrompt {
    fn poll(&mut self, view: &CountdownView) -> Option<PromptAction>;

    /// Tell the user their apps are about to be closed without further
    /// choice (deferral exhausted or expired).
    fn notify_forced_close(&mut self, blocking: &[String]);
}

/// Result of one negotiation, carrying the (possibly updated) ledger state.
#[derive(Debug, Clone)]
pub struct NegotiationOutcome {
    pub decision: CountdownDecision,
    pub state: DeferralState,
}

/// Drives one timed prompt loop to a single [`CountdownDecision`].
pub struct Negotiator<'a> {
    config: &'a CountdownConfig,
    ledger: &'a DeferralLedger,
}

impl<'a> Negotiator<'a> {
    pub fn new(config: &'a CountdownConfig, ledger: &'a DeferralLedger) -> Self {
        Self { config, ledger }
    }

    /// Run the countdown until a decision is produced.
    ///
    /// Short-circuits to `Continue` the moment the blocking-process set
    /// empties; converts a defer request into `CloseProcessesNow` when no
    /// deferral remains, after notifying the user.
    pub fn negotiate(
        &self,
        descriptors: &[ProcessDescriptor],
        state: DeferralState,
        observer: &mut dyn ProcessObserver,
        prompt: &mut dyn CountdownPrompt,
        clock: &dyn Clock,
    ) -> anyhow::Result<NegotiationOutcome> {
        let started = clock.now();
        let duration = self.config.duration();

        loop {
            let snapshot = observer.observe(descriptors);
            let blocking = blocking_processes(descriptors, &snapshot);
            if blocking.is_empty() {
                tracing::info!("blocking processes exited during countdown");
                return Ok(NegotiationOutcome {
                    decision: CountdownDecision::Continue,
                    state,
                });
            }

            let elapsed = clock.now().saturating_duration_since(started);
            let Some(remaining) = duration.checked_sub(elapsed) else {
                return self.expire(state, prompt, descriptors, &blocking, clock);
            };
            if remaining.is_zero() {
                return self.expire(state, prompt, descriptors, &blocking, clock);
            }

            let view = CountdownView {
                blocking: blocking_labels(descriptors, &blocking),
                remaining,
                deferrals_remaining: state.remaining(),
                allow_defer: self.config.allow_defer,
                allow_close_now: self.config.allow_close_now,
                allow_cancel: self.config.allow_cancel,
            };

            match prompt.poll(&view) {
                Some(PromptAction::Defer) if self.config.allow_defer => {
                    let now = clock.wall_now();
                    if state.is_available(now) {
                        let next = self.ledger.record_deferral(&state, now)?;
                        return Ok(NegotiationOutcome {
                            decision: CountdownDecision::Defer,
                            state: next,
                        });
                    }
                    // No silent continue: the user asked to defer and
                    // cannot, so they are told their apps will be closed.
                    prompt.notify_forced_close(&view.blocking);
                    return Ok(NegotiationOutcome {
                        decision: CountdownDecision::CloseProcessesNow,
                        state,
                    });
                }
                Some(PromptAction::CloseNow) if self.config.allow_close_now => {
                    return Ok(NegotiationOutcome {
                        decision: CountdownDecision::CloseProcessesNow,
                        state,
                    });
                }
                Some(PromptAction::Cancel) if self.config.allow_cancel => {
                    return Ok(NegotiationOutcome {
                        decision: CountdownDecision::UserCancelled,
                        state,
                    });
                }
                Some(action) => {
                    tracing::debug!(?action, "prompt action ignored; option disabled");
                }
                None => {}
            }

            clock.sleep(self.config.tick());
        }
    }

    /// Timer reached zero with no user response.
    fn expire(
        &self,
        state: DeferralState,
        prompt: &mut dyn CountdownPrompt,
        descriptors: &[ProcessDescriptor],
        blocking: &[&RunningProcess],
        clock: &dyn Clock,
    ) -> anyhow::Result<NegotiationOutcome> {
        let now = clock.wall_now();
        if !self.config.timeout_forces_close && state.is_available(now) {
            // Expiry consumes a deferral instead of closing apps; only the
            // negotiator may mutate deferral state, so record it here.
            let next = self.ledger.record_deferral(&state, now)?;
            tracing::info!("countdown expired; deferral consumed automatically");
            return Ok(NegotiationOutcome {
                decision: CountdownDecision::Defer,
                state: next,
            });
        }

        prompt.notify_forced_close(&blocking_labels(descriptors, blocking));
        tracing::info!("countdown expired with no user response");
        Ok(NegotiationOutcome {
            decision: CountdownDecision::TimedOut,
            state,
        })
    }
}

/// Display labels for the blocking apps, deduplicated in descriptor order.
fn blocking_labels(descriptors: &[ProcessDescriptor], blocking: &[&RunningProcess]) -> Vec<String> {
    let mut labels = Vec::new();
    for descriptor in descriptors.iter().filter(|d| d.close_required) {
        if blocking.iter().any(|p| descriptor.matches(&p.name, None)) {
            let label = descriptor.label().to_string();
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
    }
    labels
}
