//! Shared fakes for exercising the engine without an OS process table,
//! dialogs, or real time.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::cell::Cell;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeZone, Utc};

use rollout_core::countdown::{Clock, CountdownPrompt, CountdownView, PromptAction};
use rollout_core::process::{ProcessDescriptor, ProcessObserver, ProcessSnapshot, RunningProcess};
use rollout_core::session::{
    ActionRunner, ProcessTerminator, RebootScheduler, TerminationOutcome,
};
use rollout_core::types::{ActionResult, DeploymentType};

pub fn proc(pid: u32, name: &str) -> RunningProcess {
    RunningProcess {
        pid,
        name: name.to_string(),
        title: None,
    }
}

pub fn descriptor(pattern: &str) -> ProcessDescriptor {
    ProcessDescriptor::new(pattern)
}

/// Deterministic clock; `sleep` advances both timelines in lockstep.
pub struct ManualClock {
    base: Instant,
    wall_base: DateTime<Utc>,
    offset: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::starting_at(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap())
    }

    pub fn starting_at(wall_base: DateTime<Utc>) -> Self {
        Self {
            base: Instant::now(),
            wall_base,
            offset: Cell::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, duration: Duration) {
        self.offset.set(self.offset.get() + duration);
    }

    pub fn elapsed(&self) -> Duration {
        self.offset.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.offset.get()
    }

    fn wall_now(&self) -> DateTime<Utc> {
        self.wall_base + chrono::Duration::from_std(self.offset.get()).unwrap()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// Observer that replays scripted snapshots, repeating the last one.
pub struct ScriptedObserver {
    queue: VecDeque<Vec<RunningProcess>>,
    current: Vec<RunningProcess>,
    pub calls: usize,
}

impl ScriptedObserver {
    pub fn new(snapshots: Vec<Vec<RunningProcess>>) -> Self {
        Self {
            queue: snapshots.into(),
            current: Vec::new(),
            calls: 0,
        }
    }

    pub fn always(processes: Vec<RunningProcess>) -> Self {
        Self::new(vec![processes])
    }

    pub fn never_blocking() -> Self {
        Self::new(vec![Vec::new()])
    }
}

impl ProcessObserver for ScriptedObserver {
    fn observe(&mut self, _descriptors: &[ProcessDescriptor]) -> ProcessSnapshot {
        self.calls += 1;
        if let Some(next) = self.queue.pop_front() {
            self.current = next;
        }
        ProcessSnapshot::new(self.current.clone())
    }
}

/// Prompt that replays scripted responses and records what it was shown.
#[derive(Default)]
pub struct ScriptedPrompt {
    responses: VecDeque<Option<PromptAction>>,
    pub views: Vec<CountdownView>,
    pub forced_close_notices: Vec<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn new(responses: Vec<Option<PromptAction>>) -> Self {
        Self {
            responses: responses.into(),
            views: Vec::new(),
            forced_close_notices: Vec::new(),
        }
    }

    pub fn silent() -> Self {
        Self::new(Vec::new())
    }
}

impl CountdownPrompt for ScriptedPrompt {
    fn poll(&mut self, view: &CountdownView) -> Option<PromptAction> {
        self.views.push(view.clone());
        self.responses.pop_front().flatten()
    }

    fn notify_forced_close(&mut self, blocking: &[String]) {
        self.forced_close_notices.push(blocking.to_vec());
    }
}

/// Terminator that records requests and fails the configured pids.
#[derive(Default)]
pub struct RecordingTerminator {
    pub requests: Vec<Vec<u32>>,
    pub fail_pids: Vec<u32>,
}

impl RecordingTerminator {
    pub fn failing(fail_pids: Vec<u32>) -> Self {
        Self {
            requests: Vec::new(),
            fail_pids,
        }
    }
}

impl ProcessTerminator for RecordingTerminator {
    fn terminate(&mut self, pids: &[u32]) -> Vec<TerminationOutcome> {
        self.requests.push(pids.to_vec());
        pids.iter()
            .map(|&pid| TerminationOutcome {
                pid,
                terminated: !self.fail_pids.contains(&pid),
            })
            .collect()
    }
}

/// Action runner returning a preset result.
pub struct StubRunner {
    result: Result<ActionResult, String>,
    pub executed: Vec<DeploymentType>,
}

impl StubRunner {
    pub fn ok(result: ActionResult) -> Self {
        Self {
            result: Ok(result),
            executed: Vec::new(),
        }
    }

    pub fn err(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            executed: Vec::new(),
        }
    }
}

impl ActionRunner for StubRunner {
    fn execute(&mut self, deployment_type: DeploymentType) -> anyhow::Result<ActionResult> {
        self.executed.push(deployment_type);
        self.result
            .clone()
            .map_err(|message| anyhow::anyhow!(message))
    }
}

/// Reboot capability with a settable pending marker.
#[derive(Default)]
pub struct StubReboot {
    pub pending: bool,
    pub fail_schedule: bool,
    pub scheduled: Vec<Duration>,
}

impl StubReboot {
    pub fn pending() -> Self {
        Self {
            pending: true,
            ..Self::default()
        }
    }
}

impl RebootScheduler for StubReboot {
    fn pending_reboot(&self) -> bool {
        self.pending
    }

    fn schedule(&mut self, delay: Duration) -> anyhow::Result<()> {
        self.scheduled.push(delay);
        if self.fail_schedule {
            anyhow::bail!("scheduling rejected");
        }
        Ok(())
    }
}
