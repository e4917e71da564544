//! Deferral accounting state and policy.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Configured bounds on user deferrals.
///
/// The deadline may be expressed as an absolute instant or as a number of
/// days from the first run; the first-run timestamp is recorded when the
/// state is initialized.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeferralPolicy {
    pub allowance: u32,
    pub deadline: Option<DateTime<Utc>>,
    pub deadline_days: Option<u32>,
}

/// Persisted deferral accounting for one package.
///
/// Invariant: `used <= allowance`. Once the deadline has passed no further
/// deferral is grantable, regardless of remaining count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferralState {
    pub version: u32,
    pub used: u32,
    pub allowance: u32,
    pub deadline: Option<DateTime<Utc>>,
    pub first_run_at: DateTime<Utc>,
    /// Sticky flag: set once a session observes the deadline as passed, so
    /// later reruns need no wall-clock comparison to know it expired.
    pub deadline_passed: bool,
}

impl DeferralState {
    pub const VERSION: u32 = 1;

    /// Initialize fresh state from policy at first run.
    pub fn init(policy: &DeferralPolicy, now: DateTime<Utc>) -> Self {
        let deadline = policy.deadline.or_else(|| {
            policy
                .deadline_days
                .map(|days| now + Duration::days(i64::from(days)))
        });

        Self {
            version: Self::VERSION,
            used: 0,
            allowance: policy.allowance,
            deadline,
            first_run_at: now,
            deadline_passed: false,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.allowance.saturating_sub(self.used)
    }

    /// Whether the deadline has been reached, either observed now or
    /// recorded by an earlier session.
    pub fn deadline_reached(&self, now: DateTime<Utc>) -> bool {
        self.deadline_passed || self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Whether a deferral may still be granted. The deadline check takes
    /// precedence over the remaining count.
    pub fn is_available(&self, now: DateTime<Utc>) -> bool {
        if self.deadline_reached(now) {
            return false;
        }
        self.used < self.allowance
    }
}
