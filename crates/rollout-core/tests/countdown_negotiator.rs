mod support;

use tempfile::TempDir;

use rollout_core::config::CountdownConfig;
use rollout_core::countdown::{Clock, Negotiator, PromptAction};
use rollout_core::deferral::{DeferralLedger, DeferralPolicy, DeferralState};
use rollout_core::process::ProcessDescriptor;
use rollout_core::types::CountdownDecision;

use support::{ManualClock, ScriptedObserver, ScriptedPrompt, descriptor, proc};

struct Fixture {
    _tmp: TempDir,
    ledger: DeferralLedger,
    config: CountdownConfig,
}

impl Fixture {
    fn new(allowance: u32, config: CountdownConfig) -> (Self, DeferralState) {
        let tmp = TempDir::new().unwrap();
        let ledger = DeferralLedger::new(tmp.path().to_path_buf(), "app");
        let clock = ManualClock::new();
        let state = ledger
            .load_or_init(
                &DeferralPolicy {
                    allowance,
                    deadline: None,
                    deadline_days: None,
                },
                clock.wall_now(),
            )
            .unwrap();
        (
            Self {
                _tmp: tmp,
                ledger,
                config,
            },
            state,
        )
    }
}

fn short_countdown() -> CountdownConfig {
    CountdownConfig {
        duration_secs: 5,
        tick_secs: 1,
        ..CountdownConfig::default()
    }
}

fn editor() -> Vec<ProcessDescriptor> {
    vec![descriptor("editor").with_display_name("The Editor")]
}

#[test]
fn continues_immediately_when_nothing_blocks() {
    let (fx, state) = Fixture::new(2, short_countdown());
    let mut observer = ScriptedObserver::never_blocking();
    let mut prompt = ScriptedPrompt::silent();
    let clock = ManualClock::new();

    let outcome = Negotiator::new(&fx.config, &fx.ledger)
        .negotiate(&editor(), state, &mut observer, &mut prompt, &clock)
        .unwrap();

    assert_eq!(outcome.decision, CountdownDecision::Continue);
    assert!(prompt.views.is_empty(), "no dialog should be rendered");
}

#[test]
fn short_circuits_when_apps_close_mid_countdown() {
    let (fx, state) = Fixture::new(2, short_countdown());
    // Blocking for two ticks, then the user closes the app manually.
    let mut observer = ScriptedObserver::new(vec![
        vec![proc(7, "editor")],
        vec![proc(7, "editor")],
        Vec::new(),
    ]);
    let mut prompt = ScriptedPrompt::silent();
    let clock = ManualClock::new();

    let outcome = Negotiator::new(&fx.config, &fx.ledger)
        .negotiate(&editor(), state, &mut observer, &mut prompt, &clock)
        .unwrap();

    assert_eq!(outcome.decision, CountdownDecision::Continue);
    assert!(
        clock.elapsed() < fx.config.duration(),
        "must not wait out the timer"
    );
    assert_eq!(prompt.views.len(), 2);
}

#[test]
fn defer_records_and_returns() {
    let (fx, state) = Fixture::new(2, short_countdown());
    let mut observer = ScriptedObserver::always(vec![proc(7, "editor")]);
    let mut prompt = ScriptedPrompt::new(vec![Some(PromptAction::Defer)]);
    let clock = ManualClock::new();

    let outcome = Negotiator::new(&fx.config, &fx.ledger)
        .negotiate(&editor(), state, &mut observer, &mut prompt, &clock)
        .unwrap();

    assert_eq!(outcome.decision, CountdownDecision::Defer);
    assert_eq!(outcome.state.used, 1);

    // The increment was persisted, not just returned.
    let reloaded = fx
        .ledger
        .load_or_init(&DeferralPolicy::default(), clock.wall_now())
        .unwrap();
    assert_eq!(reloaded.used, 1);
}

#[test]
fn defer_without_allowance_forces_close_now() {
    // Scenario: zero deferrals allowed from the start.
    let (fx, state) = Fixture::new(0, short_countdown());
    let mut observer = ScriptedObserver::always(vec![proc(7, "editor")]);
    let mut prompt = ScriptedPrompt::new(vec![Some(PromptAction::Defer)]);
    let clock = ManualClock::new();

    let outcome = Negotiator::new(&fx.config, &fx.ledger)
        .negotiate(&editor(), state, &mut observer, &mut prompt, &clock)
        .unwrap();

    assert_eq!(outcome.decision, CountdownDecision::CloseProcessesNow);
    assert_eq!(outcome.state.used, 0);
    // The user is told, not silently overridden.
    assert_eq!(prompt.forced_close_notices.len(), 1);
    assert_eq!(prompt.forced_close_notices[0], vec!["The Editor".to_string()]);
}

#[test]
fn close_now_returns_without_touching_deferrals() {
    let (fx, state) = Fixture::new(2, short_countdown());
    let mut observer = ScriptedObserver::always(vec![proc(7, "editor")]);
    let mut prompt = ScriptedPrompt::new(vec![None, Some(PromptAction::CloseNow)]);
    let clock = ManualClock::new();

    let outcome = Negotiator::new(&fx.config, &fx.ledger)
        .negotiate(&editor(), state, &mut observer, &mut prompt, &clock)
        .unwrap();

    assert_eq!(outcome.decision, CountdownDecision::CloseProcessesNow);
    assert_eq!(outcome.state.used, 0);
}

#[test]
fn expiry_times_out_when_no_response_arrives() {
    let (fx, state) = Fixture::new(0, short_countdown());
    let mut observer = ScriptedObserver::always(vec![proc(7, "editor")]);
    let mut prompt = ScriptedPrompt::silent();
    let clock = ManualClock::new();

    let outcome = Negotiator::new(&fx.config, &fx.ledger)
        .negotiate(&editor(), state, &mut observer, &mut prompt, &clock)
        .unwrap();

    assert_eq!(outcome.decision, CountdownDecision::TimedOut);
    assert!(clock.elapsed() >= fx.config.duration());
    assert_eq!(prompt.forced_close_notices.len(), 1);
}

#[test]
fn expiry_consumes_deferral_when_configured_lenient() {
    let config = CountdownConfig {
        timeout_forces_close: false,
        ..short_countdown()
    };
    let (fx, state) = Fixture::new(1, config);
    let mut observer = ScriptedObserver::always(vec![proc(7, "editor")]);
    let mut prompt = ScriptedPrompt::silent();
    let clock = ManualClock::new();

    let negotiator = Negotiator::new(&fx.config, &fx.ledger);
    let outcome = negotiator
        .negotiate(&editor(), state, &mut observer, &mut prompt, &clock)
        .unwrap();

    assert_eq!(outcome.decision, CountdownDecision::Defer);
    assert_eq!(outcome.state.used, 1);

    // Once the allowance is gone, a further expiry times out for real.
    let outcome = negotiator
        .negotiate(&editor(), outcome.state, &mut observer, &mut prompt, &clock)
        .unwrap();
    assert_eq!(outcome.decision, CountdownDecision::TimedOut);
}

#[test]
fn cancel_requires_the_option_to_be_enabled() {
    let enabled = CountdownConfig {
        allow_cancel: true,
        ..short_countdown()
    };
    let (fx, state) = Fixture::new(2, enabled);
    let mut observer = ScriptedObserver::always(vec![proc(7, "editor")]);
    let mut prompt = ScriptedPrompt::new(vec![Some(PromptAction::Cancel)]);
    let clock = ManualClock::new();

    let outcome = Negotiator::new(&fx.config, &fx.ledger)
        .negotiate(&editor(), state, &mut observer, &mut prompt, &clock)
        .unwrap();
    assert_eq!(outcome.decision, CountdownDecision::UserCancelled);

    // With cancel disabled the same input is ignored and the timer expires.
    let (fx, state) = Fixture::new(0, short_countdown());
    let mut observer = ScriptedObserver::always(vec![proc(7, "editor")]);
    let mut prompt = ScriptedPrompt::new(vec![Some(PromptAction::Cancel)]);
    let clock = ManualClock::new();

    let outcome = Negotiator::new(&fx.config, &fx.ledger)
        .negotiate(&editor(), state, &mut observer, &mut prompt, &clock)
        .unwrap();
    assert_eq!(outcome.decision, CountdownDecision::TimedOut);
}

#[test]
fn view_reflects_style_flags_and_remaining_deferrals() {
    let config = CountdownConfig {
        allow_cancel: true,
        ..short_countdown()
    };
    let (fx, state) = Fixture::new(3, config);
    let mut observer = ScriptedObserver::new(vec![vec![proc(7, "editor")], Vec::new()]);
    let mut prompt = ScriptedPrompt::silent();
    let clock = ManualClock::new();

    Negotiator::new(&fx.config, &fx.ledger)
        .negotiate(&editor(), state, &mut observer, &mut prompt, &clock)
        .unwrap();

    let view = &prompt.views[0];
    assert_eq!(view.blocking, vec!["The Editor".to_string()]);
    assert_eq!(view.deferrals_remaining, 3);
    assert!(view.allow_defer);
    assert!(view.allow_close_now);
    assert!(view.allow_cancel);
    assert!(view.remaining <= fx.config.duration());
}
