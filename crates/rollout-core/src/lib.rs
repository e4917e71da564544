//! Rollout Core Library
//!
//! Provides the deployment session engine: blocking-process observation,
//! deferral accounting, countdown negotiation, reboot coordination, and the
//! stable exit-code contract consumed by deployment orchestrators.

pub mod commands;
pub mod config;
pub mod context;
pub mod countdown;
pub mod deferral;
pub mod error;
pub mod exitcode;
pub mod process;
pub mod reboot;
pub mod session;
pub mod types;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{ConfigStore, CountdownConfig, RebootConfig, RolloutConfig};

    // Context
    pub use crate::context::AppContext;

    // Process observation
    pub use crate::process::{
        ProcessDescriptor, ProcessObserver, ProcessSnapshot, RunningProcess, SystemObserver,
    };

    // Deferral
    pub use crate::deferral::{DeferralLedger, DeferralPolicy, DeferralState};

    // Countdown
    pub use crate::countdown::{
        Clock, CountdownPrompt, CountdownView, Negotiator, PromptAction, SystemClock,
    };

    // Session
    pub use crate::session::{
        ActionRunner, ProcessTerminator, RebootScheduler, SessionEngine, SessionReport,
        SessionServices, TerminationOutcome,
    };

    // Outcomes
    pub use crate::reboot::RebootDecision;
    pub use crate::types::{
        ActionDisposition, ActionResult, CountdownDecision, DeploymentMode, DeploymentType,
        SessionOutcome,
    };
}
