//! High-level commands for rollout operations.
//!
//! This module is the public API frontends call to drive deployments; it
//! wires configuration, the deferral ledger, and the session engine.

pub mod deploy;

pub use deploy::{DeployCommand, DeployOptions};
