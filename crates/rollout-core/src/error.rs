//! Typed failure taxonomy for the session engine.
//!
//! Every variant here is resolved into a `SessionOutcome` before the process
//! boundary; external callers only ever observe an exit code plus log output.
//! The "unmapped outcome" class from the taxonomy has no variant on purpose:
//! the exit code resolver matches exhaustively over `SessionOutcome`, so an
//! outcome without a mapping is a compile error rather than a runtime state.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Process-table enumeration failed transiently. Retried silently by
    /// polling again; never surfaced past the observer's caller.
    #[error("transient process observation failure: {0}")]
    TransientObservation(String),

    /// No deferral remains: the count is exhausted or the deadline passed.
    /// Converted by the negotiator into the forced-close path, never shown
    /// to the user as an error.
    #[error("no deferral available: {0}")]
    DeferralExhausted(String),

    /// One or more blocking processes could not be terminated. Non-fatal:
    /// logged, and execution proceeds per policy.
    #[error("failed to terminate {failed} of {attempted} blocking processes")]
    ProcessTermination { attempted: usize, failed: usize },

    /// The external action capability failed. Fatal to the session; becomes
    /// the `DeploymentFailed` outcome and is never retried within one run.
    #[error("action execution failed: {0}")]
    ActionExecution(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
