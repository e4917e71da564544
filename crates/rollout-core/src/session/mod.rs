//! Session orchestration: the state machine and its capability seams.

pub mod capabilities;
pub mod engine;

pub use capabilities::{ActionRunner, ProcessTerminator, RebootScheduler, TerminationOutcome};
pub use engine::{
    DeploymentSession, SessionEngine, SessionPhase, SessionReport, SessionServices,
};
