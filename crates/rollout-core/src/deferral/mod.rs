//! Deferral ledger: bounded, persisted postponement accounting.
//!
//! The ledger survives process restarts so that a rerun of the same logical
//! deployment attempt resumes its deferral count instead of granting a fresh
//! allowance. Single-writer: one deployment session per machine per package;
//! different packages use independent record keys and do not contend.

pub mod state;
pub mod store;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::EngineError;

pub use state::{DeferralPolicy, DeferralState};
pub use store::LedgerStore;

/// Load/record service over the persisted deferral store, keyed by package.
#[derive(Debug, Clone)]
pub struct DeferralLedger {
    store_dir: PathBuf,
    package: String,
}

impl DeferralLedger {
    pub fn new(store_dir: PathBuf, package: impl Into<String>) -> Self {
        Self {
            store_dir,
            package: package.into(),
        }
    }

    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    /// Read persisted state, initializing from policy on first run.
    ///
    /// A loaded record whose deadline has meanwhile passed gets its sticky
    /// flag set and written back, so the expiry survives clock changes.
    pub fn load_or_init(
        &self,
        policy: &DeferralPolicy,
        now: DateTime<Utc>,
    ) -> anyhow::Result<DeferralState> {
        if let Some(mut state) = LedgerStore::load(&self.store_dir, &self.package)? {
            if !state.deadline_passed && state.deadline_reached(now) {
                state.deadline_passed = true;
                LedgerStore::save(&self.store_dir, &self.package, &state)?;
                tracing::info!(package = %self.package, "deferral deadline passed");
            }
            return Ok(state);
        }

        let state = DeferralState::init(policy, now);
        LedgerStore::save(&self.store_dir, &self.package, &state)?;
        tracing::debug!(
            package = %self.package,
            allowance = state.allowance,
            deadline = ?state.deadline,
            "initialized deferral state"
        );
        Ok(state)
    }

    /// Grant one deferral and persist the incremented count.
    ///
    /// Fails with [`EngineError::DeferralExhausted`] when the count is used
    /// up or the deadline has passed; the expiry is recorded before failing
    /// so later runs see it immediately.
    pub fn record_deferral(
        &self,
        state: &DeferralState,
        now: DateTime<Utc>,
    ) -> anyhow::Result<DeferralState> {
        if !state.is_available(now) {
            if state.deadline_reached(now) && !state.deadline_passed {
                let mut expired = state.clone();
                expired.deadline_passed = true;
                LedgerStore::save(&self.store_dir, &self.package, &expired)?;
            }
            let reason = if state.deadline_reached(now) {
                "deadline passed".to_string()
            } else {
                format!("{} of {} deferrals used", state.used, state.allowance)
            };
            return Err(EngineError::DeferralExhausted(reason).into());
        }

        let mut next = state.clone();
        next.used += 1;
        LedgerStore::save(&self.store_dir, &self.package, &next)?;
        tracing::info!(
            package = %self.package,
            used = next.used,
            allowance = next.allowance,
            "deferral recorded"
        );
        Ok(next)
    }
}
